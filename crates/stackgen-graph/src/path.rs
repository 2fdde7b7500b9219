//! Construct paths
//!
//! Provides [`ConstructPath`] for hierarchical addressing of constructs in a stack.

use std::fmt::{self, Display, Formatter};

/// Separator used when rendering a path
pub const PATH_SEP: &str = "/";

/// Path of a construct from the stack root
///
/// # Examples
/// - `["EcsStack"]` → `EcsStack`
/// - `["EcsStack", "NetworkConstruct", "Default"]` → `EcsStack/NetworkConstruct/Default`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConstructPath(Vec<String>);

impl ConstructPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get last segment (the construct's own id)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Check if paths overlap (one is prefix of other)
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Segments below the stack root
    ///
    /// These are the components logical IDs are derived from.
    #[inline]
    #[must_use]
    pub fn below_root(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }
}

impl Display for ConstructPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(PATH_SEP))
    }
}

impl From<Vec<String>> for ConstructPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> ConstructPath {
        ConstructPath::new(segments.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn path_display_uses_slash() {
        let p = path(&["EcsStack", "NetworkConstruct", "Default"]);
        assert_eq!(p.to_string(), "EcsStack/NetworkConstruct/Default");
    }

    #[test]
    fn path_child_and_last() {
        let p = ConstructPath::single("EcsStack").child("Cluster");
        assert_eq!(p.segments(), &["EcsStack", "Cluster"]);
        assert_eq!(p.last(), Some("Cluster"));
    }

    #[test]
    fn path_prefix_and_overlap() {
        let a = path(&["S", "A"]);
        let b = path(&["S", "A", "B"]);
        let c = path(&["S", "AB"]);
        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn below_root_skips_stack() {
        assert_eq!(path(&["S", "A", "B"]).below_root(), &["A", "B"]);
        assert!(ConstructPath::single("S").below_root().is_empty());
        assert!(ConstructPath::default().below_root().is_empty());
    }
}
