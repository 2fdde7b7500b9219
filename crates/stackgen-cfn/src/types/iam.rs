//! `AWS::IAM::*` and the policy language shared with resource policies

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::expr::Expr;
use crate::resource::ResourceProperties;

/// Policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// IAM policy document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub statement: Vec<Statement>,
    pub version: &'static str,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PolicyDocument {
    #[must_use]
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            statement,
            version: POLICY_VERSION,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statement.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Who a statement applies to
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// `"*"`
    Any,
    /// `{ "Service": "ecs-tasks.amazonaws.com" }`
    Service(String),
    /// `{ "AWS": ... }`
    Aws(Expr),
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Any => serializer.serialize_str("*"),
            Self::Service(service) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Service", service)?;
                map.end()
            }
            Self::Aws(expr) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("AWS", expr)?;
                map.end()
            }
        }
    }
}

/// One policy statement
///
/// `Action` and `Resource` render as a bare value when they hold a single
/// entry, as a list otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(serialize_with = "one_or_many")]
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "one_or_many")]
    pub resource: Vec<Expr>,
}

impl Statement {
    #[must_use]
    pub fn allow<A: Into<String>>(actions: impl IntoIterator<Item = A>) -> Self {
        Self::with_effect(Effect::Allow, actions)
    }

    #[must_use]
    pub fn deny<A: Into<String>>(actions: impl IntoIterator<Item = A>) -> Self {
        Self::with_effect(Effect::Deny, actions)
    }

    fn with_effect<A: Into<String>>(effect: Effect, actions: impl IntoIterator<Item = A>) -> Self {
        Self {
            sid: None,
            action: actions.into_iter().map(Into::into).collect(),
            condition: None,
            effect,
            principal: None,
            resource: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    #[inline]
    #[must_use]
    pub fn resources(mut self, resources: Vec<Expr>) -> Self {
        self.resource = resources;
        self
    }

    #[inline]
    #[must_use]
    pub fn condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }

    #[inline]
    #[must_use]
    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }
}

#[allow(clippy::ptr_arg)]
fn one_or_many<T: Serialize, S: Serializer>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error> {
    match items.as_slice() {
        [single] => single.serialize(serializer),
        many => many.serialize(serializer),
    }
}

/// `AWS::IAM::Role`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub assume_role_policy_document: PolicyDocument,
}

impl Role {
    /// Role assumable by an AWS service principal
    #[must_use]
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            assume_role_policy_document: PolicyDocument::new(vec![Statement::allow(["sts:AssumeRole"])
                .principal(Principal::Service(service.into()))]),
        }
    }
}

impl ResourceProperties for Role {
    const RESOURCE_TYPE: &'static str = "AWS::IAM::Role";
}

/// `AWS::IAM::Policy` attached inline to roles
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    pub policy_document: PolicyDocument,
    pub policy_name: String,
    pub roles: Vec<Expr>,
}

impl ResourceProperties for Policy {
    const RESOURCE_TYPE: &'static str = "AWS::IAM::Policy";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_action_renders_bare() {
        let s = Statement::allow(["s3:GetBucketAcl"])
            .principal(Principal::Service("delivery.logs.amazonaws.com".into()))
            .resources(vec![Expr::get_att("Bucket", "Arn")]);
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({
                "Action": "s3:GetBucketAcl",
                "Effect": "Allow",
                "Principal": { "Service": "delivery.logs.amazonaws.com" },
                "Resource": { "Fn::GetAtt": ["Bucket", "Arn"] }
            })
        );
    }

    #[test]
    fn service_role_trust_policy() {
        let role = Role::for_service("ecs-tasks.amazonaws.com");
        assert_eq!(
            serde_json::to_value(&role).unwrap(),
            json!({
                "AssumeRolePolicyDocument": {
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": "ecs-tasks.amazonaws.com" }
                    }],
                    "Version": "2012-10-17"
                }
            })
        );
    }
}
