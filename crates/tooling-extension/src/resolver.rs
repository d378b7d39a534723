//! Resolver capability traits
//!
//! Extensions plug into the engine through these object-safe traits. The
//! engine owns instantiation and hands each resolver a [`ResolutionContext`]
//! holding exactly what the component's category allows it to see.

use crate::error::ResolverError;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;
use tooling_declaration::{ParameterValue, Parameters};
use tooling_metadata::{MetadataKey, MetadataKeyValue, MetadataType, Value};

/// Instantiated configuration
pub trait ConfigurationInstance: Debug + Send + Sync {
    /// Name of the global element it was created from
    fn name(&self) -> &str;

    /// Downcast support for extension resolvers
    fn as_any(&self) -> &dyn Any;
}

/// Established connection
pub trait Connection: Debug + Send + Sync {
    /// Downcast support for extension resolvers
    fn as_any(&self) -> &dyn Any;
}

/// Creates configuration instances for one configuration type
#[async_trait]
pub trait ConfigurationFactory: Send + Sync {
    /// Instantiate a configuration from its declared parameters
    async fn create(
        &self,
        name: &str,
        parameters: &Parameters,
    ) -> Result<Arc<dyn ConfigurationInstance>, ResolverError>;

    /// Release a configuration instance
    async fn dispose(&self, _configuration: Arc<dyn ConfigurationInstance>) {}
}

/// Establishes connections for one connection type
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Connect using the owning configuration and the declared parameters
    async fn connect(
        &self,
        configuration: &dyn ConfigurationInstance,
        parameters: &Parameters,
    ) -> Result<Arc<dyn Connection>, ResolverError>;

    /// Check that an established connection is usable
    async fn validate(&self, _connection: &dyn Connection) -> Result<(), ResolverError> {
        Ok(())
    }

    /// Release a connection
    async fn disconnect(&self, _connection: Arc<dyn Connection>) {}
}

/// Resolves metadata keys for one category
///
/// Keys are produced one level at a time; the engine walks the levels.
/// A flat key space is a tree with a single part.
#[async_trait]
pub trait TypeKeysResolver: Send + Sync {
    /// Category this resolver serves
    fn category(&self) -> &str;

    /// Resolver identifier, for diagnostics
    fn resolver_name(&self) -> &str;

    /// Part (level) names, most significant first
    fn parts(&self) -> Vec<String>;

    /// Keys at level `prefix.len()` under the given resolved ids
    async fn level_keys(
        &self,
        ctx: &ResolutionContext,
        prefix: &[String],
    ) -> Result<Vec<MetadataKey>, ResolverError>;
}

/// Resolves dynamic types for one category
///
/// Every method defaults to "no dynamic type".
#[async_trait]
pub trait TypeResolver: Send + Sync {
    /// Category this resolver serves
    fn category(&self) -> &str;

    /// Resolver identifier, for diagnostics
    fn resolver_name(&self) -> &str;

    /// Type of a dynamic input parameter
    async fn input_type(
        &self,
        _ctx: &ResolutionContext,
        _key: &MetadataKeyValue,
        _parameter: &str,
    ) -> Result<Option<MetadataType>, ResolverError> {
        Ok(None)
    }

    /// Type of the output payload
    async fn output_type(
        &self,
        _ctx: &ResolutionContext,
        _key: &MetadataKeyValue,
    ) -> Result<Option<MetadataType>, ResolverError> {
        Ok(None)
    }

    /// Type of the output attributes
    async fn attributes_type(
        &self,
        _ctx: &ResolutionContext,
        _key: &MetadataKeyValue,
    ) -> Result<Option<MetadataType>, ResolverError> {
        Ok(None)
    }
}

/// Resolves the legal values of one parameter
#[async_trait]
pub trait ValueProvider: Send + Sync {
    /// Provider identifier, for diagnostics
    fn provider_name(&self) -> &str;

    /// Names of other parameters this provider reads
    fn acting_parameters(&self) -> Vec<String> {
        Vec::new()
    }

    /// Produce the value options, in provider order
    async fn resolve(&self, ctx: &ResolutionContext) -> Result<Vec<Value>, ResolverError>;
}

/// Everything a resolver may use during one invocation
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    config_name: Option<String>,
    configuration: Option<Arc<dyn ConfigurationInstance>>,
    connection: Option<Arc<dyn Connection>>,
    acting: IndexMap<String, ParameterValue>,
}

impl ResolutionContext {
    /// Context with nothing attached
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With name of the configuration backing this resolution
    #[inline]
    #[must_use]
    pub fn with_config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = Some(name.into());
        self
    }

    /// With configuration instance
    #[inline]
    #[must_use]
    pub fn with_configuration(mut self, configuration: Arc<dyn ConfigurationInstance>) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// With connection
    #[inline]
    #[must_use]
    pub fn with_connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// With acting parameter value
    #[inline]
    #[must_use]
    pub fn with_acting_parameter(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.acting.insert(name.into(), value);
        self
    }

    /// Configuration name, if one backs this resolution
    #[inline]
    #[must_use]
    pub fn config_name(&self) -> Option<&str> {
        self.config_name.as_deref()
    }

    /// Configuration instance, if the category grants one
    #[inline]
    #[must_use]
    pub fn configuration(&self) -> Option<&Arc<dyn ConfigurationInstance>> {
        self.configuration.as_ref()
    }

    /// Connection, if the category grants one
    #[inline]
    #[must_use]
    pub fn connection(&self) -> Option<&Arc<dyn Connection>> {
        self.connection.as_ref()
    }

    /// Connection downcast to the extension's concrete type
    ///
    /// # Errors
    /// Returns `Connection` if there is no connection or it has another type
    pub fn connection_as<T: 'static>(&self) -> Result<&T, ResolverError> {
        self.connection
            .as_ref()
            .ok_or_else(|| ResolverError::Connection("no connection available".to_string()))?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| ResolverError::Connection("unexpected connection type".to_string()))
    }

    /// Configuration downcast to the extension's concrete type
    ///
    /// # Errors
    /// Returns `Failed` if there is no configuration or it has another type
    pub fn configuration_as<T: 'static>(&self) -> Result<&T, ResolverError> {
        self.configuration
            .as_ref()
            .ok_or_else(|| ResolverError::failed("no configuration available"))?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| ResolverError::failed("unexpected configuration type"))
    }

    /// Acting parameter value, if declared
    #[inline]
    #[must_use]
    pub fn acting_parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.acting.get(name)
    }

    /// Acting parameter value that the resolver cannot do without
    ///
    /// # Errors
    /// Returns `MissingActingParameter` if the value was not declared
    pub fn require(&self, name: &str) -> Result<&ParameterValue, ResolverError> {
        self.acting
            .get(name)
            .ok_or_else(|| ResolverError::MissingActingParameter(name.to_string()))
    }

    /// Scalar acting parameter rendered as text
    ///
    /// # Errors
    /// Returns `MissingActingParameter` if absent, `Failed` if not a scalar
    pub fn require_text(&self, name: &str) -> Result<String, ResolverError> {
        self.require(name)?
            .to_text()
            .ok_or_else(|| ResolverError::failed(format!("acting parameter '{name}' is not a scalar")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Client(String);

    impl Connection for Client {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn require_reports_missing_parameter() {
        let ctx = ResolutionContext::new();
        assert!(matches!(
            ctx.require("actingParameter"),
            Err(ResolverError::MissingActingParameter(ref n)) if n == "actingParameter"
        ));
    }

    #[test]
    fn require_text_renders_scalars() {
        let ctx = ResolutionContext::new()
            .with_acting_parameter("count", ParameterValue::integer(0))
            .with_acting_parameter("list", ParameterValue::string_list(["a"]));
        assert_eq!(ctx.require_text("count").unwrap(), "0");
        assert!(matches!(ctx.require_text("list"), Err(ResolverError::Failed { .. })));
    }

    #[test]
    fn connection_downcast() {
        let ctx = ResolutionContext::new().with_connection(Arc::new(Client("client".into())));
        assert_eq!(ctx.connection_as::<Client>().unwrap().0, "client");
        assert!(ctx.connection_as::<String>().is_err());
        assert!(ResolutionContext::new().connection_as::<Client>().is_err());
    }
}
