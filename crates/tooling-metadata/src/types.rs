//! Structural metadata types
//!
//! [`MetadataType`] describes the dynamic shape of an input parameter, an
//! output payload or output attributes.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Field of an object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectField {
    pub name: String,
    pub required: bool,
    pub ty: MetadataType,
}

/// Structural type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetadataType {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Number,
    Boolean,
    Any,
    Void,
    Array {
        items: Box<MetadataType>,
    },
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_id: Option<String>,
        fields: Vec<ObjectField>,
    },
}

impl MetadataType {
    /// Plain string
    #[inline]
    #[must_use]
    pub fn string() -> Self {
        Self::String { default: None }
    }

    /// String with a default value
    #[inline]
    #[must_use]
    pub fn string_with_default(default: impl Into<String>) -> Self {
        Self::String {
            default: Some(default.into()),
        }
    }

    /// Array of items
    #[inline]
    #[must_use]
    pub fn array(items: MetadataType) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    /// Start an object type
    #[inline]
    #[must_use]
    pub fn object(type_id: Option<&str>) -> Self {
        Self::Object {
            type_id: type_id.map(str::to_string),
            fields: Vec::new(),
        }
    }

    /// Add a field; no effect on non-object types
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, required: bool, ty: MetadataType) -> Self {
        if let Self::Object { fields, .. } = &mut self {
            fields.push(ObjectField {
                name: name.into(),
                required,
                ty,
            });
        }
        self
    }

    /// Look up an object field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ObjectField> {
        match self {
            Self::Object { fields, .. } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    fn write_indented(&self, f: &mut Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Self::String { default: None } => f.write_str("string"),
            Self::String { default: Some(d) } => write!(f, "string = {d:?}"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::Any => f.write_str("any"),
            Self::Void => f.write_str("void"),
            Self::Array { items } => {
                f.write_str("array<")?;
                items.write_indented(f, indent)?;
                f.write_str(">")
            }
            Self::Object { type_id, fields } => {
                if let Some(id) = type_id {
                    write!(f, "{id} ")?;
                }
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{\n")?;
                for field in fields {
                    let marker = if field.required { "" } else { "?" };
                    write!(f, "{:width$}{}{}: ", "", field.name, marker, width = indent + 2)?;
                    field.ty.write_indented(f, indent + 2)?;
                    f.write_str("\n")?;
                }
                write!(f, "{:width$}}}", "", width = indent)
            }
        }
    }
}

impl Display for MetadataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
