//! Artifact declaration
//!
//! Root of the declaration tree: the global elements one artifact defines.

use crate::element::GlobalElementDeclaration;
use crate::error::DeclarationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Global elements of one artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDeclaration {
    /// Artifact name
    #[serde(default)]
    pub name: String,
    /// Declared configurations and connections
    #[serde(default)]
    pub global_elements: Vec<GlobalElementDeclaration>,
}

impl ArtifactDeclaration {
    /// Start an empty declaration
    #[inline]
    #[must_use]
    pub fn builder() -> ArtifactDeclarer {
        ArtifactDeclarer::default()
    }

    /// Decode and validate a JSON declaration
    ///
    /// # Errors
    /// Returns error if the document is malformed or fails validation
    pub fn from_json(json: &str) -> Result<Self, DeclarationError> {
        let declaration: Self = serde_json::from_str(json)?;
        declaration.validate()?;
        Ok(declaration)
    }

    /// Look up a top-level global element by name
    #[must_use]
    pub fn global_element(&self, name: &str) -> Option<&GlobalElementDeclaration> {
        self.global_elements.iter().find(|e| e.name == name)
    }

    /// Structural validation
    ///
    /// Checks name uniqueness among top-level global elements and the
    /// well-formedness of every element and parameter name.
    ///
    /// # Errors
    /// Returns the first violation found
    pub fn validate(&self) -> Result<(), DeclarationError> {
        let mut seen = HashSet::new();
        for element in &self.global_elements {
            if !seen.insert(element.name.as_str()) {
                return Err(DeclarationError::DuplicateGlobalElement(element.name.clone()));
            }
            element.validate()?;
        }
        Ok(())
    }
}

/// Builder for [`ArtifactDeclaration`]
#[derive(Debug, Default)]
pub struct ArtifactDeclarer {
    declaration: ArtifactDeclaration,
}

impl ArtifactDeclarer {
    /// With artifact name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.declaration.name = name.into();
        self
    }

    /// With global element
    #[inline]
    #[must_use]
    pub fn with_global_element(mut self, element: GlobalElementDeclaration) -> Self {
        self.declaration.global_elements.push(element);
        self
    }

    /// Finish and validate
    ///
    /// # Errors
    /// Returns error if the declaration fails validation
    pub fn build(self) -> Result<ArtifactDeclaration, DeclarationError> {
        self.declaration.validate()?;
        Ok(self.declaration)
    }

    /// Finish without validating
    ///
    /// Validation then happens when a session is built from it.
    #[inline]
    #[must_use]
    pub fn declaration(self) -> ArtifactDeclaration {
        self.declaration
    }
}
