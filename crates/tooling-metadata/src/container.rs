//! Aggregated metadata containers

use crate::key::MetadataKey;
use crate::types::MetadataType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key trees grouped by resolver category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataKeysContainer {
    keys_by_category: IndexMap<String, Vec<MetadataKey>>,
}

impl MetadataKeysContainer {
    /// Create empty container
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keys of a category
    pub fn insert(&mut self, category: impl Into<String>, keys: Vec<MetadataKey>) {
        self.keys_by_category.insert(category.into(), keys);
    }

    /// Keys of a category; empty for unknown categories
    #[must_use]
    pub fn keys(&self, category: &str) -> &[MetadataKey] {
        self.keys_by_category
            .get(category)
            .map_or(&[], Vec::as_slice)
    }

    /// Check if a category was resolved
    #[inline]
    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.keys_by_category.contains_key(category)
    }

    /// Category names in resolution order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.keys_by_category.keys().map(String::as_str)
    }

    /// Full category map
    #[inline]
    #[must_use]
    pub fn keys_by_category(&self) -> &IndexMap<String, Vec<MetadataKey>> {
        &self.keys_by_category
    }
}

/// Dynamic types of one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTypesContainer {
    input: IndexMap<String, MetadataType>,
    output: Option<MetadataType>,
    output_attributes: Option<MetadataType>,
}

impl MetadataTypesContainer {
    /// Create empty container
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the type of an input parameter
    pub fn insert_input(&mut self, parameter: impl Into<String>, ty: MetadataType) {
        self.input.insert(parameter.into(), ty);
    }

    /// Record the output type
    pub fn set_output(&mut self, ty: MetadataType) {
        self.output = Some(ty);
    }

    /// Record the output attributes type
    pub fn set_output_attributes(&mut self, ty: MetadataType) {
        self.output_attributes = Some(ty);
    }

    /// Input parameter types by name
    #[inline]
    #[must_use]
    pub fn input_metadata(&self) -> &IndexMap<String, MetadataType> {
        &self.input
    }

    /// Output payload type
    #[inline]
    #[must_use]
    pub fn output_metadata(&self) -> Option<&MetadataType> {
        self.output.as_ref()
    }

    /// Output attributes type
    #[inline]
    #[must_use]
    pub fn output_attributes_metadata(&self) -> Option<&MetadataType> {
        self.output_attributes.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_is_empty() {
        let mut container = MetadataKeysContainer::new();
        container.insert("Known", vec![MetadataKey::new("a")]);
        assert_eq!(container.keys("Known").len(), 1);
        assert!(container.keys("Other").is_empty());
        assert!(!container.has_category("Other"));
    }

    #[test]
    fn categories_keep_insertion_order() {
        let mut container = MetadataKeysContainer::new();
        container.insert("b", Vec::new());
        container.insert("a", Vec::new());
        assert_eq!(container.categories().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn types_container_accessors() {
        let mut container = MetadataTypesContainer::new();
        assert!(container.output_metadata().is_none());
        container.set_output(MetadataType::string());
        container.insert_input("onSuccessParameter", MetadataType::Number);
        assert_eq!(container.output_metadata(), Some(&MetadataType::string()));
        assert!(container.input_metadata().contains_key("onSuccessParameter"));
    }
}
