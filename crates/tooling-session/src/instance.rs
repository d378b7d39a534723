//! Runtime instances
//!
//! A [`RuntimeInstance`] owns one instantiated configuration and, once a
//! component needs it, the connection established for it. Connections are
//! established lazily and at most once; a failed attempt is retried by the
//! next caller. Connecting and releasing share one lock, so a release waits
//! for an in-flight connect and disconnects what it established.

use crate::cache::InstanceFactory;
use crate::error::InstanceError;
use async_trait::async_trait;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tooling_extension::{
    ComponentRepository, ConfigurationFactory, ConfigurationInstance, Connection, ConnectionBinding,
    ConnectionProvider,
};

/// Configuration instance plus its lazily established connection
pub struct RuntimeInstance {
    config_name: String,
    configuration: Arc<dyn ConfigurationInstance>,
    factory: Arc<dyn ConfigurationFactory>,
    connection_binding: Option<ConnectionBinding>,
    connection: Mutex<Option<Arc<dyn Connection>>>,
    connected: AtomicBool,
    validate_on_connect: bool,
    sequence: AtomicU64,
    disposed: AtomicBool,
}

impl RuntimeInstance {
    /// Wrap an instantiated configuration
    #[must_use]
    pub fn new(
        config_name: impl Into<String>,
        configuration: Arc<dyn ConfigurationInstance>,
        factory: Arc<dyn ConfigurationFactory>,
    ) -> Self {
        Self {
            config_name: config_name.into(),
            configuration,
            factory,
            connection_binding: None,
            connection: Mutex::new(None),
            connected: AtomicBool::new(false),
            validate_on_connect: false,
            sequence: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    /// With the connection declared for the configuration
    #[inline]
    #[must_use]
    pub fn with_connection_binding(mut self, binding: ConnectionBinding) -> Self {
        self.connection_binding = Some(binding);
        self
    }

    /// Validate connections right after establishing them
    #[inline]
    #[must_use]
    pub fn with_validate_on_connect(mut self, validate: bool) -> Self {
        self.validate_on_connect = validate;
        self
    }

    /// Name of the configuration
    #[inline]
    #[must_use]
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// Instantiated configuration
    #[inline]
    #[must_use]
    pub fn configuration(&self) -> Arc<dyn ConfigurationInstance> {
        Arc::clone(&self.configuration)
    }

    /// Connection provider, if the configuration declares a connection
    #[must_use]
    pub fn connection_provider(&self) -> Option<Arc<dyn ConnectionProvider>> {
        self.connection_binding
            .as_ref()
            .map(|b| Arc::clone(&b.model.provider))
    }

    /// Whether a connection has been established
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Creation order within the owning cache
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    pub(crate) fn set_sequence(&self, sequence: u64) {
        self.sequence.store(sequence, Ordering::Release);
    }

    /// Whether the instance has been released
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Established connection, connecting on first use
    ///
    /// # Errors
    /// Returns an error if no connection is declared, connecting or validating
    /// fails, or the instance has been disposed
    pub async fn connection(&self) -> Result<Arc<dyn Connection>, InstanceError> {
        let binding = self
            .connection_binding
            .as_ref()
            .ok_or_else(|| InstanceError::NoConnection(self.config_name.clone()))?;

        let mut slot = self.connection.lock().await;
        if self.is_disposed() {
            return Err(InstanceError::Disposed(self.config_name.clone()));
        }
        if let Some(connection) = slot.as_ref() {
            return Ok(Arc::clone(connection));
        }
        let connection = self.connect(binding).await?;
        *slot = Some(Arc::clone(&connection));
        self.connected.store(true, Ordering::Release);
        Ok(connection)
    }

    async fn connect(&self, binding: &ConnectionBinding) -> Result<Arc<dyn Connection>, InstanceError> {
        tracing::debug!(config = %self.config_name, connection = %binding.name, "establishing connection");
        let provider = &binding.model.provider;
        let connection = provider
            .connect(self.configuration.as_ref(), &binding.parameters)
            .await
            .map_err(|source| {
                tracing::warn!(config = %self.config_name, error = %source, "connection failed");
                InstanceError::Connection {
                    name: binding.name.clone(),
                    source,
                }
            })?;

        if self.validate_on_connect {
            if let Err(source) = provider.validate(connection.as_ref()).await {
                tracing::warn!(config = %self.config_name, error = %source, "connection is not valid");
                provider.disconnect(connection).await;
                return Err(InstanceError::Validation {
                    name: binding.name.clone(),
                    source,
                });
            }
        }
        Ok(connection)
    }

    /// Disconnect and dispose the configuration; later calls do nothing
    ///
    /// Waits for a connect in progress and disconnects the connection it
    /// established.
    pub async fn release(&self) {
        let mut slot = self.connection.lock().await;
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(config = %self.config_name, sequence = self.sequence(), "releasing runtime instance");
        if let (Some(connection), Some(binding)) = (slot.take(), &self.connection_binding) {
            binding.model.provider.disconnect(connection).await;
        }
        self.connected.store(false, Ordering::Release);
        self.factory.dispose(Arc::clone(&self.configuration)).await;
    }
}

impl Debug for RuntimeInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeInstance")
            .field("config_name", &self.config_name)
            .field("connected", &self.is_connected())
            .field("sequence", &self.sequence())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Builds runtime instances from the artifact's configuration declarations
#[derive(Debug, Clone)]
pub struct DeclaredInstanceFactory {
    repository: ComponentRepository,
    validate_on_connect: bool,
}

impl DeclaredInstanceFactory {
    /// Create factory over a repository
    #[inline]
    #[must_use]
    pub fn new(repository: ComponentRepository) -> Self {
        Self {
            repository,
            validate_on_connect: true,
        }
    }

    /// Validate connections right after establishing them
    #[inline]
    #[must_use]
    pub fn with_validate_on_connect(mut self, validate: bool) -> Self {
        self.validate_on_connect = validate;
        self
    }
}

#[async_trait]
impl InstanceFactory for DeclaredInstanceFactory {
    async fn create(&self, config_name: &str) -> Result<RuntimeInstance, InstanceError> {
        let binding = self.repository.describe_configuration(config_name)?;
        let factory = Arc::clone(&binding.model.factory);
        let configuration = factory
            .create(&binding.name, &binding.parameters)
            .await
            .map_err(|source| InstanceError::Configuration {
                name: binding.name.clone(),
                source,
            })?;

        let mut instance = RuntimeInstance::new(&binding.name, configuration, factory)
            .with_validate_on_connect(self.validate_on_connect);
        if let Some(connection) = binding.connection {
            instance = instance.with_connection_binding(connection);
        }
        Ok(instance)
    }
}
