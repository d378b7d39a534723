//! Tagged parameter values
//!
//! Provides [`ParameterValue`], the recursive value carried by declarations,
//! and [`Parameters`], an insertion-ordered name → value map.

use crate::error::DeclarationError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

static PARAMETER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("parameter name pattern is valid")
});

/// Check a parameter or group name against the accepted grammar
#[inline]
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    PARAMETER_NAME.is_match(name)
}

/// Simple value leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Declared value of a parameter
///
/// Parameter groups and complex parameters are expressed as `Object`,
/// collections as `List`. Values nest arbitrarily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterValue {
    Scalar(Scalar),
    List(Vec<ParameterValue>),
    Object(IndexMap<String, ParameterValue>),
}

impl ParameterValue {
    /// String scalar
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(value.into()))
    }

    /// Integer scalar
    #[inline]
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(value))
    }

    /// Boolean scalar
    #[inline]
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::Scalar(Scalar::Boolean(value))
    }

    /// List of string scalars
    #[must_use]
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Self::string).collect())
    }

    /// Object from `(field, value)` pairs
    #[must_use]
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, ParameterValue)>,
        S: Into<String>,
    {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Scalar payload, if this is a scalar
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// String payload, if this is a string scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Items, if this is a list
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[ParameterValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Field of an object value
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ParameterValue> {
        match self {
            Self::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Render a scalar the way it was declared
    ///
    /// Lists and objects have no single textual form and yield `None`.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        self.as_scalar().map(ToString::to_string)
    }

    /// Validate every object field name below this value
    pub(crate) fn validate(&self, path: &str) -> Result<(), DeclarationError> {
        match self {
            Self::Scalar(_) => Ok(()),
            Self::List(items) => items
                .iter()
                .enumerate()
                .try_for_each(|(i, item)| item.validate(&format!("{path}[{i}]"))),
            Self::Object(fields) => fields.iter().try_for_each(|(name, value)| {
                if !is_valid_name(name) {
                    return Err(DeclarationError::InvalidParameterName {
                        name: format!("{path}.{name}"),
                    });
                }
                value.validate(&format!("{path}.{name}"))
            }),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::boolean(value)
    }
}

/// Insertion-ordered parameter map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(IndexMap<String, ParameterValue>);

impl Parameters {
    /// Create empty parameter map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Set a parameter, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style insert
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Get parameter value
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    /// Check if parameter is set
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if map is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.0.iter()
    }

    /// Validate all names, recursively
    ///
    /// # Errors
    /// Returns `InvalidParameterName` for the first malformed name
    pub fn validate(&self) -> Result<(), DeclarationError> {
        self.0.iter().try_for_each(|(name, value)| {
            if !is_valid_name(name) {
                return Err(DeclarationError::InvalidParameterName { name: name.clone() });
            }
            value.validate(name)
        })
    }
}

impl<S: Into<String>, V: Into<ParameterValue>> FromIterator<(S, V)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
