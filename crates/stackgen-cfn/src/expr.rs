//! Property values and intrinsic functions

use std::collections::BTreeSet;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};

/// Prefix of pseudo parameters (`AWS::Region`, `AWS::AccountId`, ...)
pub const PSEUDO_PREFIX: &str = "AWS::";

/// A property value
///
/// Literals serialize as themselves; every other variant serializes to the
/// CloudFormation intrinsic function of the same name.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// `{ "Ref": id }`
    Ref(String),
    /// `{ "Fn::GetAtt": [id, attribute] }`
    GetAtt(String, String),
    /// `{ "Fn::Sub": template }`
    Sub(String),
    /// `{ "Fn::Join": [separator, [parts...]] }`
    Join(String, Vec<Expr>),
    /// `{ "Fn::Select": [index, list] }`
    Select(usize, Box<Expr>),
    /// `{ "Fn::GetAZs": region }`, empty region meaning the stack's own
    GetAzs(String),
}

impl Expr {
    #[inline]
    #[must_use]
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref(logical_id.into())
    }

    #[inline]
    #[must_use]
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt(logical_id.into(), attribute.into())
    }

    #[inline]
    #[must_use]
    pub fn sub(template: impl Into<String>) -> Self {
        Self::Sub(template.into())
    }

    #[inline]
    #[must_use]
    pub fn join(separator: impl Into<String>, parts: Vec<Expr>) -> Self {
        Self::Join(separator.into(), parts)
    }

    /// `index`-th availability zone of the stack's region
    #[inline]
    #[must_use]
    pub fn availability_zone(index: usize) -> Self {
        Self::Select(index, Box::new(Self::GetAzs(String::new())))
    }

    /// `AWS::AccountId` pseudo parameter
    #[inline]
    #[must_use]
    pub fn account_id() -> Self {
        Self::Ref(format!("{PSEUDO_PREFIX}AccountId"))
    }

    /// JSON form of this expression
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Ref(id) => json!({ "Ref": id }),
            Self::GetAtt(id, attr) => json!({ "Fn::GetAtt": [id, attr] }),
            Self::Sub(template) => json!({ "Fn::Sub": template }),
            Self::Join(sep, parts) => {
                let parts: Vec<Value> = parts.iter().map(Self::to_value).collect();
                json!({ "Fn::Join": [sep, parts] })
            }
            Self::Select(index, list) => json!({ "Fn::Select": [index, list.to_value()] }),
            Self::GetAzs(region) => json!({ "Fn::GetAZs": region }),
        }
    }

    /// Logical IDs this expression points at, pseudo parameters excluded
    #[must_use]
    pub fn references(&self) -> BTreeSet<String> {
        references(&self.to_value())
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(v) => v.serialize(serializer),
            Self::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            other => other.to_value().serialize(serializer),
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<u32> for Expr {
    fn from(value: u32) -> Self {
        Self::Literal(Value::from(value))
    }
}

/// Logical IDs referenced anywhere inside a JSON value
///
/// Finds `Ref`, `Fn::GetAtt` targets and `${Id}` / `${Id.Attr}` placeholders
/// of `Fn::Sub`. Pseudo parameters and `${!Literal}` escapes are skipped.
#[must_use]
pub fn references(value: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect(value, &mut out);
    out
}

fn collect(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(id)) = map.get("Ref") {
                    push(id, out);
                    return;
                }
                if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(id)) = args.first() {
                        push(id, out);
                    }
                    return;
                }
                if let Some(Value::String(template)) = map.get("Fn::Sub") {
                    for id in sub_placeholders(template) {
                        push(&id, out);
                    }
                    return;
                }
            }
            for v in map.values() {
                collect(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect(v, out);
            }
        }
        _ => {}
    }
}

fn push(id: &str, out: &mut BTreeSet<String>) {
    if !id.starts_with(PSEUDO_PREFIX) {
        out.insert(id.to_string());
    }
}

fn sub_placeholders(template: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        if !name.starts_with('!') {
            let id = name.split('.').next().unwrap_or(name);
            ids.push(id.to_string());
        }
        rest = &after[end + 1..];
    }
    ids
}
