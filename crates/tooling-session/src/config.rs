//! Session configuration

use crate::error::SessionError;
use serde::{Deserialize, Serialize};

/// Declaration session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session name, carried by every log span
    pub name: String,
    /// Validate connections right after establishing them
    pub validate_on_connect: bool,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns `Config` if the document is not valid session configuration
    pub fn from_toml_str(toml: &str) -> Result<Self, SessionError> {
        Ok(toml::from_str(toml)?)
    }

    /// With session name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// With connection validation on connect
    #[inline]
    #[must_use]
    pub fn with_validate_on_connect(mut self, validate: bool) -> Self {
        self.validate_on_connect = validate;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "declaration-session".to_string(),
            validate_on_connect: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = SessionConfig::from_toml_str("name = \"tooling\"").unwrap();
        assert_eq!(config.name, "tooling");
        assert!(config.validate_on_connect);
        assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = SessionConfig::from_toml_str("validate_on_connect = \"yes\"").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn builders() {
        let config = SessionConfig::new()
            .with_name("probe")
            .with_validate_on_connect(false);
        assert_eq!(config.name, "probe");
        assert!(!config.validate_on_connect);
    }
}
