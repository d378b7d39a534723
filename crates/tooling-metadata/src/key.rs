//! Metadata keys
//!
//! Provides [`MetadataKey`], a node of a (possibly multi-level) key tree, and
//! [`MetadataKeyValue`], the fully resolved key handed to type resolvers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Node of a metadata key tree
///
/// `part_name` names the tree level (e.g. `continent`, `country`).
/// Children are ordered as the resolver produced them and are only populated
/// as deep as the known key parts justify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataKey {
    id: String,
    display_name: String,
    part_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<MetadataKey>,
}

impl MetadataKey {
    /// Create key whose display name equals its id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            part_name: String::new(),
            children: Vec::new(),
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// With part (level) name
    #[inline]
    #[must_use]
    pub fn with_part_name(mut self, part_name: impl Into<String>) -> Self {
        self.part_name = part_name.into();
        self
    }

    /// With child key appended
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: MetadataKey) -> Self {
        self.children.push(child);
        self
    }

    /// Key id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable name
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Level this key belongs to
    #[inline]
    #[must_use]
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    /// Child keys, in resolver order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[MetadataKey] {
        &self.children
    }

    /// Find a direct child by id
    #[must_use]
    pub fn child(&self, id: &str) -> Option<&MetadataKey> {
        self.children.iter().find(|c| c.id == id)
    }

    /// Check if children were populated
    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub(crate) fn set_children(&mut self, children: Vec<MetadataKey>) {
        self.children = children;
    }

    pub(crate) fn clear_children(&mut self) {
        self.children.clear();
    }

    pub(crate) fn set_part_name_if_empty(&mut self, part_name: &str) {
        if self.part_name.is_empty() {
            self.part_name = part_name.to_string();
        }
    }
}

/// Return the first id that appears twice among sibling keys
#[must_use]
pub fn first_duplicate_id(keys: &[MetadataKey]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter()
        .map(MetadataKey::id)
        .find(|id| !seen.insert(*id))
}

/// Fully resolved key: one value per key part, most significant first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataKeyValue {
    parts: Vec<(String, String)>,
}

impl MetadataKeyValue {
    /// Empty key (component without key parts)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// With `(part, value)` appended
    #[inline]
    #[must_use]
    pub fn with_part(mut self, part: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((part.into(), value.into()));
        self
    }

    /// Value of a named part
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, value)| value.as_str())
    }

    /// Values in level order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(_, v)| v.as_str())
    }

    /// Check if key has no parts
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Values joined as `v1|v2|...`
    #[must_use]
    pub fn joined(&self) -> String {
        self.values().collect::<Vec<_>>().join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_defaults_to_id() {
        let key = MetadataKey::new("AMERICA");
        assert_eq!(key.display_name(), "AMERICA");
        assert!(!key.has_children());
    }

    #[test]
    fn child_lookup() {
        let key = MetadataKey::new("AMERICA")
            .with_child(MetadataKey::new("USA").with_display_name("United States"))
            .with_child(MetadataKey::new("ARGENTINA"));
        assert_eq!(key.child("USA").map(MetadataKey::display_name), Some("United States"));
        assert!(key.child("SPAIN").is_none());
    }

    #[test]
    fn duplicate_detection() {
        let keys = vec![MetadataKey::new("A"), MetadataKey::new("B"), MetadataKey::new("A")];
        assert_eq!(first_duplicate_id(&keys), Some("A"));
        assert_eq!(first_duplicate_id(&keys[..2]), None);
    }

    #[test]
    fn key_value_joined() {
        let key = MetadataKeyValue::empty()
            .with_part("continent", "America")
            .with_part("country", "USA")
            .with_part("city", "SFO");
        assert_eq!(key.joined(), "America|USA|SFO");
        assert_eq!(key.part("country"), Some("USA"));
    }
}
