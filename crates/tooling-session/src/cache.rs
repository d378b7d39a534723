//! Per-session instance cache using moka
//!
//! Maps configuration names to lazily constructed [`RuntimeInstance`]s:
//! - Single-flight construction per name (concurrent callers share one build)
//! - Failed constructions are not cached; the next call retries
//! - Disposal releases every instance in reverse creation order
//!
//! Construction runs under the read half of the state lock and disposal
//! takes the write half, so a construction never races a disposal.

use crate::error::{CacheError, InstanceError};
use crate::instance::RuntimeInstance;
use async_trait::async_trait;
use moka::future::Cache;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Builds a runtime instance for a configuration name
#[async_trait]
pub trait InstanceFactory: Send + Sync {
    /// Instantiate the named configuration
    async fn create(&self, config_name: &str) -> Result<RuntimeInstance, InstanceError>;
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached instances
    pub entry_count: u64,
    /// Successful constructions since creation
    pub constructions: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    closed: bool,
}

/// Configuration name → runtime instance
pub struct InstanceCache {
    instances: Cache<String, Arc<RuntimeInstance>>,
    state: RwLock<CacheState>,
    factory: Arc<dyn InstanceFactory>,
    sequence: AtomicU64,
}

impl InstanceCache {
    /// Create empty cache over a factory
    #[must_use]
    pub fn new(factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            instances: Cache::builder().name("runtime-instances").build(),
            state: RwLock::new(CacheState::default()),
            factory,
            sequence: AtomicU64::new(0),
        }
    }

    /// Get the instance for a configuration, constructing it on first use
    ///
    /// # Errors
    /// Returns `Closed` after disposal, `Construction` if building failed
    pub async fn get_or_create(&self, config_name: &str) -> Result<Arc<RuntimeInstance>, CacheError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(CacheError::Closed);
        }

        let entry = self
            .instances
            .entry_by_ref(config_name)
            .or_try_insert_with(self.construct(config_name))
            .await
            .map_err(CacheError::Construction)?;
        if entry.is_fresh() {
            tracing::debug!(config = %config_name, "runtime instance cached");
        }
        Ok(entry.into_value())
    }

    async fn construct(&self, config_name: &str) -> Result<Arc<RuntimeInstance>, InstanceError> {
        tracing::debug!(config = %config_name, "constructing runtime instance");
        let instance = self.factory.create(config_name).await.map_err(|e| {
            tracing::warn!(config = %config_name, error = %e, "runtime instance construction failed");
            e
        })?;
        instance.set_sequence(self.sequence.fetch_add(1, Ordering::AcqRel));
        Ok(Arc::new(instance))
    }

    /// Cached instance, without constructing
    pub async fn get(&self, config_name: &str) -> Option<Arc<RuntimeInstance>> {
        self.instances.get(config_name).await
    }

    /// Drop and release one instance so the next call rebuilds it
    ///
    /// Returns whether an instance was cached.
    pub async fn invalidate(&self, config_name: &str) -> bool {
        let state = self.state.read().await;
        if state.closed {
            return false;
        }
        match self.instances.remove(config_name).await {
            Some(instance) => {
                instance.release().await;
                tracing::debug!(config = %config_name, "runtime instance invalidated");
                true
            }
            None => false,
        }
    }

    /// Close the cache and release every instance, newest first
    ///
    /// Idempotent. Waits for in-flight constructions to finish.
    pub async fn dispose_all(&self) {
        let mut state = self.state.write().await;
        if state.closed {
            return;
        }
        state.closed = true;

        let mut instances: Vec<Arc<RuntimeInstance>> =
            self.instances.iter().map(|(_, instance)| instance).collect();
        self.instances.invalidate_all();
        self.instances.run_pending_tasks().await;

        instances.sort_by_key(|instance| Reverse(instance.sequence()));
        let count = instances.len();
        for instance in instances {
            instance.release().await;
        }
        tracing::debug!(released = count, "instance cache disposed");
    }

    /// Whether the cache has been disposed
    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    /// Cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.instances.entry_count(),
            constructions: self.sequence.load(Ordering::Acquire),
        }
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;
    use tooling_declaration::Parameters;
    use tooling_extension::{ConfigurationFactory, ConfigurationInstance, ResolverError};

    #[derive(Debug)]
    struct Config(String);

    impl ConfigurationInstance for Config {
        fn name(&self) -> &str {
            &self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        disposed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ConfigurationFactory for RecordingFactory {
        async fn create(
            &self,
            name: &str,
            _parameters: &Parameters,
        ) -> Result<Arc<dyn ConfigurationInstance>, ResolverError> {
            Ok(Arc::new(Config(name.to_string())))
        }

        async fn dispose(&self, configuration: Arc<dyn ConfigurationInstance>) {
            self.disposed.lock().unwrap().push(configuration.name().to_string());
        }
    }

    /// Slow factory that fails while `failures` is non-zero
    #[derive(Default)]
    struct TestFactory {
        configs: Arc<RecordingFactory>,
        builds: AtomicUsize,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl InstanceFactory for TestFactory {
        async fn create(&self, config_name: &str) -> Result<RuntimeInstance, InstanceError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(InstanceError::Configuration {
                    name: config_name.to_string(),
                    source: ResolverError::Connection("unreachable".into()),
                });
            }
            let configs: Arc<dyn ConfigurationFactory> = self.configs.clone();
            let configuration = configs.create(config_name, &Parameters::new()).await.unwrap();
            Ok(RuntimeInstance::new(config_name, configuration, configs))
        }
    }

    fn cache() -> (Arc<TestFactory>, Arc<InstanceCache>) {
        let factory = Arc::new(TestFactory::default());
        let cache = Arc::new(InstanceCache::new(factory.clone()));
        (factory, cache)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_construct_once() {
        let (factory, cache) = cache();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_or_create("dummyConfig").await.unwrap() })
            })
            .collect();

        let mut instances = Vec::new();
        for handle in handles {
            instances.push(handle.await.unwrap());
        }
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
        assert_eq!(cache.stats().constructions, 1);
    }

    #[tokio::test]
    async fn failed_construction_is_retried() {
        let (factory, cache) = cache();
        factory.failures.store(1, Ordering::SeqCst);

        let err = cache.get_or_create("dummyConfig").await.unwrap_err();
        assert!(matches!(err, CacheError::Construction(_)));
        assert!(cache.get("dummyConfig").await.is_none());

        cache.get_or_create("dummyConfig").await.unwrap();
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_releases_and_rebuilds() {
        let (factory, cache) = cache();
        let first = cache.get_or_create("dummyConfig").await.unwrap();
        assert!(cache.invalidate("dummyConfig").await);
        assert!(first.is_disposed());
        assert!(!cache.invalidate("dummyConfig").await);

        let second = cache.get_or_create("dummyConfig").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dispose_releases_in_reverse_creation_order() {
        let (factory, cache) = cache();
        for name in ["first", "second", "third"] {
            cache.get_or_create(name).await.unwrap();
        }
        cache.dispose_all().await;
        cache.dispose_all().await;

        let disposed = factory.configs.disposed.lock().unwrap().clone();
        assert_eq!(disposed, vec!["third", "second", "first"]);
        assert!(cache.is_closed().await);
    }

    #[tokio::test]
    async fn closed_cache_refuses_construction() {
        let (factory, cache) = cache();
        cache.dispose_all().await;
        assert!(matches!(cache.get_or_create("dummyConfig").await, Err(CacheError::Closed)));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dispose_waits_for_inflight_construction() {
        let (factory, cache) = cache();
        let pending = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_create("dummyConfig").await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.dispose_all().await;

        // Either the construction completed first and was released, or it was refused
        match pending.await.unwrap() {
            Ok(instance) => {
                assert!(instance.is_disposed());
                assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
            }
            Err(err) => {
                assert!(matches!(err, CacheError::Closed));
                assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
            }
        }
    }
}
