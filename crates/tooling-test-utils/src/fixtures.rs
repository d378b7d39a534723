//! The `tooling` fixture extension
//!
//! One extension exercising every resolver category: flat and multi-level
//! keys, dynamic types, value providers with acting parameters, and
//! misbehaving resolvers (duplicates, panics, failures, blocking).

use crate::probe::Probe;
use crate::{CONFIG_TYPE, CONNECTION_TYPE, EXTENSION, LEGACY_CONFIG_TYPE, PROVIDED_PARAMETER_NAME};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tooling_declaration::{ElementId, ParameterValue, Parameters};
use tooling_extension::{
    ComponentTypeDescriptor, ConfigurationFactory, ConfigurationInstance, ConfigurationModel,
    Connection, ConnectionModel, ConnectionProvider, ExtensionBuilder, ExtensionModel,
    ResolutionContext, ResolverCategory, ResolverError, ResolverSet, TypeKeysResolver,
    TypeResolver, ValueProvider,
};
use tooling_metadata::{MetadataKey, MetadataKeyValue, MetadataType, Value};

pub const CONFIG_LESS_CONNECTION_LESS_OP: &str = "configLessConnectionLessOP";
pub const CONFIG_LESS_OP: &str = "configLessOP";
pub const ACTING_PARAMETER_OP: &str = "actingParameterOP";
pub const ACTING_PARAMETER_GROUP_OP: &str = "actingParameterGroupOP";
pub const COMPLEX_ACTING_PARAMETER_OP: &str = "complexActingParameterOP";
pub const MULTI_LEVEL_OP: &str = "multiLevelTypeKeyMetadataKey";
pub const MULTI_LEVEL_SHOW_IN_DSL_OP: &str = "multiLevelShowInDslGroupPartialTypeKeysMetadata";
pub const SOURCE_METADATA: &str = "sourceMetadata";
pub const DUPLICATE_VALUES_OP: &str = "duplicateValuesOP";
pub const DUPLICATE_KEYS_OP: &str = "duplicateKeysOP";
pub const PANICKING_OP: &str = "panickingOP";
pub const FAILING_OP: &str = "failingOP";
pub const BLOCKING_OP: &str = "blockingOP";

pub const CONFIG_LESS_CONNECTION_LESS_CATEGORY: &str = "ConfigLessConnectionLessMetadataResolver";
pub const CONFIG_LESS_CATEGORY: &str = "ConfigLessMetadataResolver";
pub const LOCATION_CATEGORY: &str = "MultiLevelPartialTypeKeysOutputResolver";
pub const DUPLICATE_KEYS_CATEGORY: &str = "DuplicateKeysResolver";

/// Value returned by the config-less, connection-less provider
pub const CONFIG_LESS_CONNECTION_LESS_VALUE: &str = "ConfigLessConnectionLessNoActingParameter";

pub const LOCATION_GROUP: &str = "LocationKey";
pub const LOCATION_PARTS: [&str; 3] = ["continent", "country", "city"];
pub const ON_SUCCESS_PARAMETER: &str = "onSuccessParameter";

/// Element id inside the fixture extension
#[must_use]
pub fn element(name: &str) -> ElementId {
    ElementId::new(EXTENSION, name)
}

/// Configuration instance created by the fixture factory
#[derive(Debug)]
pub struct ToolingConfig {
    pub name: String,
}

impl ConfigurationInstance for ToolingConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Connection created by the fixture provider
#[derive(Debug)]
pub struct ToolingClient {
    pub client_name: String,
}

impl Connection for ToolingClient {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ToolingConfigFactory {
    probe: Arc<Probe>,
}

#[async_trait]
impl ConfigurationFactory for ToolingConfigFactory {
    async fn create(
        &self,
        name: &str,
        _parameters: &Parameters,
    ) -> Result<Arc<dyn ConfigurationInstance>, ResolverError> {
        self.probe.configuration_created();
        self.probe.record(format!("create:{name}"));
        Ok(Arc::new(ToolingConfig { name: name.to_string() }))
    }

    async fn dispose(&self, configuration: Arc<dyn ConfigurationInstance>) {
        self.probe.record(format!("dispose:{}", configuration.name()));
    }
}

struct ToolingConnectionProvider {
    probe: Arc<Probe>,
}

#[async_trait]
impl ConnectionProvider for ToolingConnectionProvider {
    async fn connect(
        &self,
        _configuration: &dyn ConfigurationInstance,
        parameters: &Parameters,
    ) -> Result<Arc<dyn Connection>, ResolverError> {
        let delay = self.probe.connect_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.probe.connected();
        if self.probe.fail_connect() {
            return Err(ResolverError::Connection("connection refused".to_string()));
        }
        let client_name = parameters
            .get("clientName")
            .and_then(ParameterValue::to_text)
            .ok_or_else(|| ResolverError::Connection("missing clientName".to_string()))?;
        self.probe.record(format!("connect:{client_name}"));
        Ok(Arc::new(ToolingClient { client_name }))
    }

    async fn validate(&self, _connection: &dyn Connection) -> Result<(), ResolverError> {
        self.probe.validated();
        if self.probe.fail_validation() {
            return Err(ResolverError::Connection("ping failed".to_string()));
        }
        Ok(())
    }

    async fn disconnect(&self, connection: Arc<dyn Connection>) {
        if let Some(client) = connection.as_any().downcast_ref::<ToolingClient>() {
            self.probe.record(format!("disconnect:{}", client.client_name));
        }
    }
}

type ValuesFn = dyn Fn(&ResolutionContext) -> Result<Vec<Value>, ResolverError> + Send + Sync;

/// Value provider backed by a synchronous closure
struct FnValueProvider {
    name: &'static str,
    acting: Vec<String>,
    probe: Arc<Probe>,
    values: Box<ValuesFn>,
}

impl FnValueProvider {
    fn new<F>(name: &'static str, probe: &Arc<Probe>, values: F) -> Self
    where
        F: Fn(&ResolutionContext) -> Result<Vec<Value>, ResolverError> + Send + Sync + 'static,
    {
        Self {
            name,
            acting: Vec::new(),
            probe: Arc::clone(probe),
            values: Box::new(values),
        }
    }

    fn acting(mut self, parameters: &[&str]) -> Self {
        self.acting = parameters.iter().map(ToString::to_string).collect();
        self
    }
}

#[async_trait]
impl ValueProvider for FnValueProvider {
    fn provider_name(&self) -> &str {
        self.name
    }

    fn acting_parameters(&self) -> Vec<String> {
        self.acting.clone()
    }

    async fn resolve(&self, ctx: &ResolutionContext) -> Result<Vec<Value>, ResolverError> {
        self.probe.resolver_called();
        (self.values)(ctx)
    }
}

/// Signals `entered`, then waits for `gate`
struct BlockingValueProvider {
    probe: Arc<Probe>,
}

#[async_trait]
impl ValueProvider for BlockingValueProvider {
    fn provider_name(&self) -> &str {
        "BlockingValueProvider"
    }

    async fn resolve(&self, _ctx: &ResolutionContext) -> Result<Vec<Value>, ResolverError> {
        self.probe.resolver_called();
        self.probe.entered.notify_one();
        self.probe.gate.notified().await;
        Ok(vec![Value::new("released")])
    }
}

type KeysFn = dyn Fn(&ResolutionContext) -> Result<Vec<MetadataKey>, ResolverError> + Send + Sync;

/// Single-level key resolver backed by a synchronous closure
struct FlatKeysResolver {
    category: &'static str,
    probe: Arc<Probe>,
    keys: Box<KeysFn>,
}

impl FlatKeysResolver {
    fn new<F>(category: &'static str, probe: &Arc<Probe>, keys: F) -> Self
    where
        F: Fn(&ResolutionContext) -> Result<Vec<MetadataKey>, ResolverError> + Send + Sync + 'static,
    {
        Self {
            category,
            probe: Arc::clone(probe),
            keys: Box::new(keys),
        }
    }
}

#[async_trait]
impl TypeKeysResolver for FlatKeysResolver {
    fn category(&self) -> &str {
        self.category
    }

    fn resolver_name(&self) -> &str {
        self.category
    }

    fn parts(&self) -> Vec<String> {
        vec!["key".to_string()]
    }

    async fn level_keys(
        &self,
        ctx: &ResolutionContext,
        _prefix: &[String],
    ) -> Result<Vec<MetadataKey>, ResolverError> {
        self.probe.resolver_called();
        (self.keys)(ctx)
    }
}

/// Continent / country / city key tree
struct LocationKeysResolver {
    probe: Arc<Probe>,
    levels: HashMap<String, Vec<MetadataKey>>,
}

impl LocationKeysResolver {
    fn new(probe: &Arc<Probe>) -> Self {
        let level = |ids: &[&str]| ids.iter().map(|id| MetadataKey::new(*id)).collect::<Vec<_>>();
        let mut levels = HashMap::new();
        levels.insert(String::new(), level(&["AMERICA", "EUROPE"]));
        levels.insert(
            "AMERICA".to_string(),
            vec![
                MetadataKey::new("USA").with_display_name("United States"),
                MetadataKey::new("ARGENTINA"),
            ],
        );
        levels.insert("EUROPE".to_string(), level(&["SPAIN", "FRANCE"]));
        levels.insert("AMERICA/USA".to_string(), level(&["SFO", "NYC"]));
        levels.insert("AMERICA/ARGENTINA".to_string(), level(&["BA"]));
        levels.insert("EUROPE/SPAIN".to_string(), level(&["BCN", "MAD"]));
        levels.insert("EUROPE/FRANCE".to_string(), level(&["PAR"]));
        Self {
            probe: Arc::clone(probe),
            levels,
        }
    }
}

#[async_trait]
impl TypeKeysResolver for LocationKeysResolver {
    fn category(&self) -> &str {
        LOCATION_CATEGORY
    }

    fn resolver_name(&self) -> &str {
        "LocationKeysResolver"
    }

    fn parts(&self) -> Vec<String> {
        LOCATION_PARTS.iter().map(ToString::to_string).collect()
    }

    async fn level_keys(
        &self,
        _ctx: &ResolutionContext,
        prefix: &[String],
    ) -> Result<Vec<MetadataKey>, ResolverError> {
        self.probe.resolver_called();
        let path = prefix.join("/");
        self.levels
            .get(&path)
            .cloned()
            .ok_or_else(|| ResolverError::InvalidKey(format!("unknown location '{path}'")))
    }
}

/// Types echoing the resolved location key
struct LocationTypeResolver {
    probe: Arc<Probe>,
}

#[async_trait]
impl TypeResolver for LocationTypeResolver {
    fn category(&self) -> &str {
        LOCATION_CATEGORY
    }

    fn resolver_name(&self) -> &str {
        "LocationTypeResolver"
    }

    async fn input_type(
        &self,
        _ctx: &ResolutionContext,
        key: &MetadataKeyValue,
        parameter: &str,
    ) -> Result<Option<MetadataType>, ResolverError> {
        self.probe.resolver_called();
        Ok((parameter == ON_SUCCESS_PARAMETER).then(|| MetadataType::string_with_default(key.joined())))
    }

    async fn output_type(
        &self,
        _ctx: &ResolutionContext,
        key: &MetadataKeyValue,
    ) -> Result<Option<MetadataType>, ResolverError> {
        self.probe.resolver_called();
        Ok(Some(MetadataType::string_with_default(key.joined())))
    }

    async fn attributes_type(
        &self,
        _ctx: &ResolutionContext,
        key: &MetadataKeyValue,
    ) -> Result<Option<MetadataType>, ResolverError> {
        self.probe.resolver_called();
        Ok(Some(MetadataType::object(Some("StringAttributes")).with_field(
            "value",
            false,
            MetadataType::string_with_default(key.joined()),
        )))
    }
}

fn client_name(ctx: &ResolutionContext) -> Result<String, ResolverError> {
    Ok(ctx.connection_as::<ToolingClient>()?.client_name.clone())
}

fn location_component(descriptor: ComponentTypeDescriptor) -> ComponentTypeDescriptor {
    LOCATION_PARTS
        .iter()
        .fold(descriptor, |d, part| d.with_key_part(*part, *part))
        .with_metadata_category(LOCATION_CATEGORY)
        .with_dynamic_output()
}

fn location_resolvers(probe: &Arc<Probe>) -> ResolverSet {
    ResolverSet::new()
        .with_key_resolver(Arc::new(LocationKeysResolver::new(probe)))
        .with_type_resolver(Arc::new(LocationTypeResolver {
            probe: Arc::clone(probe),
        }))
}

/// Build the fixture extension, reporting to `probe`
#[must_use]
pub fn tooling_extension(probe: &Arc<Probe>) -> Arc<dyn ExtensionModel> {
    let config_type = element(CONFIG_TYPE);
    let connection_type = element(CONNECTION_TYPE);
    let factory: Arc<dyn ConfigurationFactory> = Arc::new(ToolingConfigFactory {
        probe: Arc::clone(probe),
    });
    let provider = Arc::new(ToolingConnectionProvider {
        probe: Arc::clone(probe),
    });

    let op = |name: &str, category| {
        ComponentTypeDescriptor::operation(element(name), category).with_config_type(config_type.clone())
    };
    let config_less_connection_less = |name: &str| {
        ComponentTypeDescriptor::operation(element(name), ResolverCategory::ConfigLessConnectionLess)
            .with_parameter(PROVIDED_PARAMETER_NAME)
    };

    let builder = ExtensionBuilder::new(EXTENSION)
        .with_configuration(
            ConfigurationModel::new(config_type.clone(), Arc::clone(&factory))
                .with_connection_type(connection_type.clone()),
        )
        .with_configuration(
            ConfigurationModel::new(element(LEGACY_CONFIG_TYPE), factory)
                .with_connection_type(connection_type.clone()),
        )
        .with_connection(ConnectionModel::new(connection_type, provider))
        .with_component(
            config_less_connection_less(CONFIG_LESS_CONNECTION_LESS_OP),
            ResolverSet::new()
                .with_value_provider(
                    PROVIDED_PARAMETER_NAME,
                    Arc::new(FnValueProvider::new("ConfigLessConnectionLessValueProvider", probe, |_| {
                        Ok(vec![Value::new(CONFIG_LESS_CONNECTION_LESS_VALUE)])
                    })),
                )
                .with_key_resolver(Arc::new(FlatKeysResolver::new(
                    CONFIG_LESS_CONNECTION_LESS_CATEGORY,
                    probe,
                    |_| Ok(vec![MetadataKey::new(CONFIG_LESS_CONNECTION_LESS_CATEGORY)]),
                ))),
        )
        .with_component(
            op(CONFIG_LESS_OP, ResolverCategory::ConfigLess).with_parameter(PROVIDED_PARAMETER_NAME),
            ResolverSet::new()
                .with_value_provider(
                    PROVIDED_PARAMETER_NAME,
                    Arc::new(FnValueProvider::new("ConfigLessValueProvider", probe, |ctx| {
                        Ok(vec![Value::new(client_name(ctx)?)])
                    })),
                )
                .with_key_resolver(Arc::new(FlatKeysResolver::new(
                    CONFIG_LESS_CATEGORY,
                    probe,
                    |ctx| Ok(vec![MetadataKey::new(client_name(ctx)?)]),
                ))),
        )
        .with_component(
            op(ACTING_PARAMETER_OP, ResolverCategory::ConnectionLess)
                .with_parameter("actingParameter")
                .with_parameter(PROVIDED_PARAMETER_NAME),
            ResolverSet::new().with_value_provider(
                PROVIDED_PARAMETER_NAME,
                Arc::new(
                    FnValueProvider::new("ActingParameterValueProvider", probe, |ctx| {
                        let acting = ctx.require_text("actingParameter")?;
                        Ok(vec![Value::new(format!("WITH-ACTING-PARAMETER-{acting}"))])
                    })
                    .acting(&["actingParameter"]),
                ),
            ),
        )
        .with_component(
            op(ACTING_PARAMETER_GROUP_OP, ResolverCategory::ConnectionLess)
                .with_parameter("stringParam")
                .with_parameter("intParam")
                .with_parameter("listParams")
                .with_parameter(PROVIDED_PARAMETER_NAME),
            ResolverSet::new().with_value_provider(
                PROVIDED_PARAMETER_NAME,
                Arc::new(
                    FnValueProvider::new("ActingParameterGroupValueProvider", probe, |ctx| {
                        let mut parts = vec![ctx.require_text("stringParam")?, ctx.require_text("intParam")?];
                        let list = ctx
                            .require("listParams")?
                            .as_list()
                            .ok_or_else(|| ResolverError::failed("listParams is not a list"))?;
                        parts.extend(list.iter().filter_map(ParameterValue::to_text));
                        Ok(vec![Value::new(parts.join("-"))])
                    })
                    .acting(&["stringParam", "intParam", "listParams"]),
                ),
            ),
        )
        .with_component(
            op(COMPLEX_ACTING_PARAMETER_OP, ResolverCategory::ConnectionLess)
                .with_parameter("complexParameter")
                .with_parameter(PROVIDED_PARAMETER_NAME),
            ResolverSet::new().with_value_provider(
                PROVIDED_PARAMETER_NAME,
                Arc::new(
                    FnValueProvider::new("ComplexActingParameterValueProvider", probe, |ctx| {
                        let value = ctx
                            .require("complexParameter")?
                            .field("stringParam")
                            .and_then(ParameterValue::to_text)
                            .ok_or_else(|| ResolverError::failed("complexParameter has no stringParam"))?;
                        Ok(vec![Value::new(value)])
                    })
                    .acting(&["complexParameter"]),
                ),
            ),
        )
        .with_component(
            location_component(op(MULTI_LEVEL_OP, ResolverCategory::ConnectionLess)),
            location_resolvers(probe),
        )
        .with_component(
            location_component(op(MULTI_LEVEL_SHOW_IN_DSL_OP, ResolverCategory::ConnectionLess)),
            location_resolvers(probe),
        )
        .with_component(
            location_component(
                ComponentTypeDescriptor::source(element(SOURCE_METADATA), ResolverCategory::Standard)
                    .with_config_type(config_type.clone()),
            )
            .with_dynamic_parameter(ON_SUCCESS_PARAMETER)
            .with_dynamic_attributes(),
            location_resolvers(probe),
        )
        .with_component(
            config_less_connection_less(DUPLICATE_VALUES_OP),
            ResolverSet::new().with_value_provider(
                PROVIDED_PARAMETER_NAME,
                Arc::new(FnValueProvider::new("DuplicateValuesProvider", probe, |_| {
                    Ok(vec![Value::new("one"), Value::new("two"), Value::new("one")])
                })),
            ),
        )
        .with_component(
            config_less_connection_less(DUPLICATE_KEYS_OP),
            ResolverSet::new().with_key_resolver(Arc::new(FlatKeysResolver::new(
                DUPLICATE_KEYS_CATEGORY,
                probe,
                |_| Ok(vec![MetadataKey::new("dup"), MetadataKey::new("dup")]),
            ))),
        )
        .with_component(
            config_less_connection_less(PANICKING_OP),
            ResolverSet::new().with_value_provider(
                PROVIDED_PARAMETER_NAME,
                Arc::new(FnValueProvider::new("PanickingValueProvider", probe, |_| {
                    panic!("value provider exploded")
                })),
            ),
        )
        .with_component(
            config_less_connection_less(FAILING_OP),
            ResolverSet::new().with_value_provider(
                PROVIDED_PARAMETER_NAME,
                Arc::new(FnValueProvider::new("FailingValueProvider", probe, |_| {
                    Err(ResolverError::caused_by(
                        "remote lookup failed",
                        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "lookup service down"),
                    ))
                })),
            ),
        )
        .with_component(
            op(BLOCKING_OP, ResolverCategory::Standard).with_parameter(PROVIDED_PARAMETER_NAME),
            ResolverSet::new().with_value_provider(
                PROVIDED_PARAMETER_NAME,
                Arc::new(BlockingValueProvider {
                    probe: Arc::clone(probe),
                }),
            ),
        );

    Arc::new(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_component_is_registered() {
        let probe = Arc::new(Probe::new());
        let extension = tooling_extension(&probe);
        assert_eq!(extension.name(), EXTENSION);
        assert_eq!(extension.component_types().len(), 13);
        assert_eq!(extension.configuration_types().len(), 2);
        assert!(extension
            .lookup_component_type(&element(SOURCE_METADATA))
            .is_some_and(|c| c.dynamic_attributes));
    }

    #[tokio::test]
    async fn location_levels() {
        let probe = Arc::new(Probe::new());
        let resolver = LocationKeysResolver::new(&probe);
        let ctx = ResolutionContext::new();
        let roots = resolver.level_keys(&ctx, &[]).await.unwrap();
        assert_eq!(roots.iter().map(MetadataKey::id).collect::<Vec<_>>(), ["AMERICA", "EUROPE"]);
        let cities = resolver
            .level_keys(&ctx, &["EUROPE".to_string(), "SPAIN".to_string()])
            .await
            .unwrap();
        assert_eq!(cities.len(), 2);
        assert!(resolver.level_keys(&ctx, &["ASIA".to_string()]).await.is_err());
        assert_eq!(probe.resolver_calls(), 3);
    }
}
