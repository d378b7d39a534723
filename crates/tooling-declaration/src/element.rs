//! Global element and component declarations

use crate::error::DeclarationError;
use crate::value::{is_valid_name, ParameterValue, Parameters};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Identifier of an extension-defined element type
///
/// Displayed as `extension:name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId {
    /// Declaring extension
    pub extension: String,
    /// Element name within the extension
    pub name: String,
}

impl ElementId {
    /// Create element id
    #[inline]
    #[must_use]
    pub fn new(extension: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            name: name.into(),
        }
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.extension, self.name)
    }
}

/// Kind of global element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalElementKind {
    Configuration,
    Connection,
}

impl Display for GlobalElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => f.write_str("configuration"),
            Self::Connection => f.write_str("connection"),
        }
    }
}

/// Named global element (configuration or connection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalElementDeclaration {
    /// Name referenced by components
    pub name: String,
    /// Configuration or connection
    pub kind: GlobalElementKind,
    /// Extension-defined element type
    pub element_type: ElementId,
    /// Declared parameter values
    #[serde(default)]
    pub parameters: Parameters,
    /// Connection embedded in a configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<Box<GlobalElementDeclaration>>,
}

impl GlobalElementDeclaration {
    /// Declare a configuration
    #[must_use]
    pub fn configuration(name: impl Into<String>, element_type: ElementId) -> Self {
        Self {
            name: name.into(),
            kind: GlobalElementKind::Configuration,
            element_type,
            parameters: Parameters::new(),
            connection: None,
        }
    }

    /// Declare a connection
    #[must_use]
    pub fn connection(name: impl Into<String>, element_type: ElementId) -> Self {
        Self {
            name: name.into(),
            kind: GlobalElementKind::Connection,
            element_type,
            parameters: Parameters::new(),
            connection: None,
        }
    }

    /// With parameter value
    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(name, value);
        self
    }

    /// With embedded connection
    #[inline]
    #[must_use]
    pub fn with_connection(mut self, connection: GlobalElementDeclaration) -> Self {
        self.connection = Some(Box::new(connection));
        self
    }

    /// Check if this is a configuration
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.kind == GlobalElementKind::Configuration
    }

    /// Embedded connection, if any
    #[inline]
    #[must_use]
    pub fn connection_element(&self) -> Option<&GlobalElementDeclaration> {
        self.connection.as_deref()
    }

    pub(crate) fn validate(&self) -> Result<(), DeclarationError> {
        if !is_valid_name(&self.name) {
            return Err(DeclarationError::InvalidElementName(self.name.clone()));
        }
        self.parameters.validate()?;

        if let Some(nested) = &self.connection {
            if self.kind != GlobalElementKind::Configuration
                || nested.kind != GlobalElementKind::Connection
                || nested.connection.is_some()
            {
                return Err(DeclarationError::InvalidNestedElement {
                    owner: self.name.clone(),
                    nested: nested.name.clone(),
                });
            }
            nested.validate()?;
        }
        Ok(())
    }
}

/// Kind of component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Operation,
    Source,
}

/// Named group of parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGroupDeclaration {
    /// Group name
    pub name: String,
    /// Whether the group is rendered as its own DSL element
    #[serde(default)]
    pub show_in_dsl: bool,
    /// Parameters in the group
    #[serde(default)]
    pub parameters: Parameters,
}

impl ParameterGroupDeclaration {
    /// Create empty group
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            show_in_dsl: false,
            parameters: Parameters::new(),
        }
    }

    /// Mark group as shown in DSL
    #[inline]
    #[must_use]
    pub fn shown_in_dsl(mut self) -> Self {
        self.show_in_dsl = true;
        self
    }

    /// With parameter value
    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(name, value);
        self
    }
}

/// Declaration of the operation or source being resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentElementDeclaration {
    /// Extension-defined component type
    pub element_type: ElementId,
    /// Operation or source
    pub kind: ComponentKind,
    /// Referenced configuration, absent for config-less usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<String>,
    /// Parameters of the default group
    #[serde(default)]
    pub parameters: Parameters,
    /// Named parameter groups
    #[serde(default)]
    pub groups: Vec<ParameterGroupDeclaration>,
}

impl ComponentElementDeclaration {
    /// Declare an operation
    #[must_use]
    pub fn operation(element_type: ElementId) -> Self {
        Self::new(element_type, ComponentKind::Operation)
    }

    /// Declare a source
    #[must_use]
    pub fn source(element_type: ElementId) -> Self {
        Self::new(element_type, ComponentKind::Source)
    }

    fn new(element_type: ElementId, kind: ComponentKind) -> Self {
        Self {
            element_type,
            kind,
            config_ref: None,
            parameters: Parameters::new(),
            groups: Vec::new(),
        }
    }

    /// Reference a configuration by name
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config_name: impl Into<String>) -> Self {
        self.config_ref = Some(config_name.into());
        self
    }

    /// With parameter value in the default group
    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(name, value);
        self
    }

    /// With named parameter group
    #[inline]
    #[must_use]
    pub fn with_group(mut self, group: ParameterGroupDeclaration) -> Self {
        self.groups.push(group);
        self
    }

    /// Find a parameter value
    ///
    /// The default group wins; named groups are searched in declaration order.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters
            .get(name)
            .or_else(|| self.groups.iter().find_map(|g| g.parameters.get(name)))
    }

    /// Validate parameter and group names
    ///
    /// # Errors
    /// Returns `InvalidParameterName` for the first malformed name
    pub fn validate(&self) -> Result<(), DeclarationError> {
        self.parameters.validate()?;
        self.groups.iter().try_for_each(|group| {
            if !is_valid_name(&group.name) {
                return Err(DeclarationError::InvalidParameterName {
                    name: group.name.clone(),
                });
            }
            group.parameters.validate()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op() -> ComponentElementDeclaration {
        ComponentElementDeclaration::operation(ElementId::new("tooling", "op"))
    }

    #[test]
    fn element_id_display() {
        assert_eq!(ElementId::new("tooling", "config").to_string(), "tooling:config");
    }

    #[test]
    fn parameter_lookup_prefers_default_group() {
        let component = op()
            .with_parameter("p", "top")
            .with_group(ParameterGroupDeclaration::new("g").with_parameter("p", "grouped"));
        assert_eq!(component.parameter("p").and_then(ParameterValue::as_str), Some("top"));
    }

    #[test]
    fn parameter_lookup_reaches_groups() {
        let component = op()
            .with_group(ParameterGroupDeclaration::new("first").with_parameter("a", "1"))
            .with_group(
                ParameterGroupDeclaration::new("second")
                    .shown_in_dsl()
                    .with_parameter("b", "2"),
            );
        assert_eq!(component.parameter("b").and_then(ParameterValue::as_str), Some("2"));
        assert!(component.parameter("c").is_none());
    }

    #[test]
    fn group_name_is_validated() {
        let component = op().with_group(ParameterGroupDeclaration::new("has space"));
        assert!(component.validate().is_err());
    }

    #[test]
    fn connection_cannot_embed_configuration() {
        let element = GlobalElementDeclaration::connection("conn", ElementId::new("t", "c"))
            .with_connection(GlobalElementDeclaration::configuration(
                "cfg",
                ElementId::new("t", "config"),
            ));
        assert!(matches!(
            element.validate(),
            Err(DeclarationError::InvalidNestedElement { .. })
        ));
    }
}
