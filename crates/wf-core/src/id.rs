//! Interned element ids.
//!
//! Every `wf-graph` keys its nodes by [`ElementId`], so duplicate-id checks
//! and `node_by_id` lookups compare 4-byte handles instead of strings.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for element ids and tag names.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// An interned element identifier (the `id` attribute of a node element).
/// 4 bytes, Copy, Eq and Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// Intern a string, or return the existing id if already interned.
    pub fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    /// Look up an id without interning it.
    pub fn get(s: &str) -> Option<Self> {
        INTERNER.get(s).map(ElementId)
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ElementId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ElementId::intern("s1");
        let b = ElementId::intern("s1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "s1");
        assert_eq!(a.to_string(), "s1");
        assert_eq!(format!("{a:?}"), "#s1");
    }

    #[test]
    fn lookup_does_not_intern() {
        assert!(ElementId::get("never_interned_id_xyz").is_none());
        let id = ElementId::intern("interned_once");
        assert_eq!(ElementId::get("interned_once"), Some(id));
    }
}
