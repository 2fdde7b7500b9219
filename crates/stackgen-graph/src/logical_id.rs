//! Logical IDs
//!
//! CloudFormation logical IDs are derived from the construct path below the
//! stack: a human readable part built from the path components plus a short
//! hash of the full path, so two constructs never collide even when their
//! readable parts do.

use sha2::{Digest, Sha256};

/// Path component dropped from logical IDs entirely
pub const HIDDEN_ID: &str = "Default";

/// Path component dropped from the human readable part only
pub const HIDDEN_FROM_HUMAN_ID: &str = "Resource";

/// Number of hex characters in the hash suffix
pub const HASH_LEN: usize = 8;

/// Maximum length of the human readable part
pub const MAX_HUMAN_LEN: usize = 240;

const MAX_ID_LEN: usize = 255;

/// Logical ID for the path components below the stack root
///
/// Returns `None` when nothing is left after dropping [`HIDDEN_ID`]
/// components (the stack itself has no logical ID).
///
/// # Examples
/// ```
/// # use stackgen_graph::logical_id;
/// assert_eq!(logical_id(&["PrivateDnsNamespace"]).as_deref(), Some("PrivateDnsNamespace"));
/// let id = logical_id(&["NetworkConstruct", "Default"]).unwrap();
/// assert_eq!(id, "NetworkConstruct");
/// ```
#[must_use]
pub fn logical_id<S: AsRef<str>>(components: &[S]) -> Option<String> {
    let components: Vec<&str> = components
        .iter()
        .map(AsRef::as_ref)
        .filter(|c| *c != HIDDEN_ID)
        .collect();

    if components.is_empty() {
        return None;
    }

    if components.len() == 1 {
        let candidate = remove_non_alphanumeric(components[0]);
        if !candidate.is_empty() && candidate.len() <= MAX_ID_LEN {
            return Some(candidate);
        }
    }

    let human: String = remove_dupes(&components)
        .into_iter()
        .filter(|c| *c != HIDDEN_FROM_HUMAN_ID)
        .map(remove_non_alphanumeric)
        .collect::<String>()
        .chars()
        .take(MAX_HUMAN_LEN)
        .collect();

    Some(format!("{human}{}", path_hash(&components)))
}

fn path_hash(components: &[&str]) -> String {
    let digest = Sha256::digest(components.join("/").as_bytes());
    hex::encode_upper(digest)[..HASH_LEN].to_string()
}

fn remove_non_alphanumeric(s: &str) -> String {
    s.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Drops a component when the previous kept one already ends with it
fn remove_dupes<'a>(components: &[&'a str]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::with_capacity(components.len());
    for component in components {
        if out.last().map_or(true, |prev| !prev.ends_with(component)) {
            out.push(component);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_uses_id_verbatim() {
        assert_eq!(
            logical_id(&["PrivateDnsNamespace"]).as_deref(),
            Some("PrivateDnsNamespace")
        );
        assert_eq!(logical_id(&["my-bucket"]).as_deref(), Some("mybucket"));
    }

    #[test]
    fn default_components_are_hidden() {
        assert_eq!(logical_id(&["Default"]), None);
        assert_eq!(
            logical_id(&["NetworkConstruct", "Default"]),
            logical_id(&["NetworkConstruct"])
        );
    }

    #[test]
    fn nested_ids_carry_hash_suffix() {
        let id = logical_id(&["EcsFargateConstruct", "Cluster"]).unwrap();
        assert!(id.starts_with("EcsFargateConstructCluster"));
        assert_eq!(id.len(), "EcsFargateConstructCluster".len() + HASH_LEN);
        assert!(id[id.len() - HASH_LEN..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_disambiguates_equal_human_parts() {
        let a = logical_id(&["A", "BC"]).unwrap();
        let b = logical_id(&["AB", "C"]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a[..3], b[..3]);
    }

    #[test]
    fn resource_component_hidden_from_human_part() {
        let id = logical_id(&["Bucket", "Resource"]).unwrap();
        assert!(id.starts_with("Bucket"));
        assert!(!id.contains("Resource"));
    }

    #[test]
    fn trailing_duplicate_component_collapsed() {
        let id = logical_id(&["FlowLogsBucket", "Bucket"]).unwrap();
        assert!(id.starts_with("FlowLogsBucket"));
        assert!(!id.starts_with("FlowLogsBucketBucket"));
    }
}
