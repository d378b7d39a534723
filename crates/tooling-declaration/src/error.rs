//! Error types for the declaration model

/// Structural errors found while validating or loading declarations
#[derive(Debug, thiserror::Error)]
pub enum DeclarationError {
    /// Two top-level global elements share a name
    #[error("duplicate global element name: '{0}'")]
    DuplicateGlobalElement(String),

    /// Element, group or parameter name does not follow the name grammar
    #[error("invalid parameter name: '{name}'")]
    InvalidParameterName { name: String },

    /// Global element name is empty or malformed
    #[error("invalid element name: '{0}'")]
    InvalidElementName(String),

    /// A configuration embeds something that is not a connection
    #[error("global element '{owner}' embeds '{nested}', which is not a connection")]
    InvalidNestedElement { owner: String, nested: String },

    /// Declaration could not be decoded
    #[error("invalid declaration document: {0}")]
    Decode(#[from] serde_json::Error),
}
