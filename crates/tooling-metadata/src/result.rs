//! Result envelopes
//!
//! Every public resolution operation returns one of these instead of an
//! error: [`ResolutionResult`] (aliased as [`MetadataResult`] and
//! [`ValueResult`]) or [`ConnectionValidationResult`].

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Closed set of failure reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    ComponentNotFound,
    InvalidConfigReference,
    ConnectionFailure,
    NoDynamicKeysAvailable,
    NoDynamicTypeAvailable,
    InvalidMetadataKey,
    MissingActingParameter,
    ResolverContractViolation,
    SessionClosed,
    Unknown,
}

impl FailureReason {
    /// Wire name, e.g. `SESSION_CLOSED`
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComponentNotFound => "COMPONENT_NOT_FOUND",
            Self::InvalidConfigReference => "INVALID_CONFIG_REFERENCE",
            Self::ConnectionFailure => "CONNECTION_FAILURE",
            Self::NoDynamicKeysAvailable => "NO_DYNAMIC_KEYS_AVAILABLE",
            Self::NoDynamicTypeAvailable => "NO_DYNAMIC_TYPE_AVAILABLE",
            Self::InvalidMetadataKey => "INVALID_METADATA_KEY",
            Self::MissingActingParameter => "MISSING_ACTING_PARAMETER",
            Self::ResolverContractViolation => "RESOLVER_CONTRACT_VIOLATION",
            Self::SessionClosed => "SESSION_CLOSED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    pub reason: FailureReason,
    pub message: String,
    /// Rendered source chain of the error that caused the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ResolutionFailure {
    /// Create failure without cause
    #[inline]
    #[must_use]
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            cause: None,
        }
    }

    /// Create failure from an error, keeping its source chain as the cause
    #[must_use]
    pub fn from_error(reason: FailureReason, error: &(dyn Error + 'static)) -> Self {
        Self {
            reason,
            message: error.to_string(),
            cause: render_sources(error),
        }
    }

    /// With explicit cause
    #[inline]
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Shortcut for `SESSION_CLOSED`
    #[inline]
    #[must_use]
    pub fn session_closed() -> Self {
        Self::new(FailureReason::SessionClosed, "session has been disposed")
    }
}

impl Display for ResolutionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}

/// Render `error.source()` chain as `a: b: c`, if there is one
#[must_use]
pub fn render_sources(error: &(dyn Error + 'static)) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(": "))
    }
}

/// Either a resolved value or a failure, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionResult<T> {
    Success(T),
    Failure(ResolutionFailure),
}

/// Result of metadata key or type resolution
pub type MetadataResult<T> = ResolutionResult<T>;

/// Result of value resolution
pub type ValueResult = ResolutionResult<Vec<Value>>;

impl<T> ResolutionResult<T> {
    /// Create failure result
    #[inline]
    #[must_use]
    pub fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
        Self::Failure(ResolutionFailure::new(reason, message))
    }

    /// Check for success
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Resolved value
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    /// Failure details
    #[inline]
    #[must_use]
    pub fn failure_details(&self) -> Option<&ResolutionFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f),
        }
    }

    /// Failure reason
    #[inline]
    #[must_use]
    pub fn reason(&self) -> Option<FailureReason> {
        self.failure_details().map(|f| f.reason)
    }

    /// Map the success value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResolutionResult<U> {
        match self {
            Self::Success(v) => ResolutionResult::Success(f(v)),
            Self::Failure(e) => ResolutionResult::Failure(e),
        }
    }

    /// Convert into a standard `Result`
    ///
    /// # Errors
    /// Returns the failure details for a failed resolution
    pub fn into_result(self) -> Result<T, ResolutionFailure> {
        self.into()
    }
}

impl<T> From<Result<T, ResolutionFailure>> for ResolutionResult<T> {
    fn from(result: Result<T, ResolutionFailure>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Failure(e),
        }
    }
}

impl<T> From<ResolutionResult<T>> for Result<T, ResolutionFailure> {
    fn from(result: ResolutionResult<T>) -> Self {
        match result {
            ResolutionResult::Success(v) => Ok(v),
            ResolutionResult::Failure(e) => Err(e),
        }
    }
}

/// Legal value option for a parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    pub id: String,
    pub display_name: String,
}

impl Value {
    /// Value whose display name equals its id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// Outcome of a connectivity test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionValidationResult {
    pub valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ResolutionFailure>,
}

impl ConnectionValidationResult {
    /// Successful validation
    #[inline]
    #[must_use]
    pub fn success() -> Self {
        Self {
            valid: true,
            message: "connection is valid".to_string(),
            failure: None,
        }
    }

    /// Failed validation
    #[must_use]
    pub fn failed(failure: ResolutionFailure) -> Self {
        Self {
            valid: false,
            message: failure.message.clone(),
            failure: Some(failure),
        }
    }

    /// Check validity
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Failure reason for an invalid result
    #[inline]
    #[must_use]
    pub fn reason(&self) -> Option<FailureReason> {
        self.failure.as_ref().map(|f| f.reason)
    }
}
