//! Extension model interfaces, resolver registry and component repository
//!
//! # Core Concepts
//!
//! - [`ExtensionModel`]: introspected extension (component, configuration and connection types)
//! - [`TypeKeysResolver`], [`TypeResolver`], [`ValueProvider`]: resolver capabilities
//! - [`ExtensionRegistry`]: component type id → capabilities, populated once
//! - [`ComponentRepository`]: resolves declarations into [`ComponentDescriptor`]s
//! - [`DependencyResolver`], [`ExtensionLoader`]: artifact collaborators

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod dependency;
mod error;
mod extension;
mod model;
mod registry;
mod repository;
mod resolver;

pub use dependency::{BundleDependency, ClasspathEntry, DependencyResolver, ExtensionLoader};
pub use error::{DependencyError, RegistryError, RepositoryError, ResolverError};
pub use extension::{ExtensionBuilder, ExtensionModel, InMemoryExtension};
pub use model::{
    ComponentTypeDescriptor, ConfigurationModel, ConnectionModel, KeyPartModel, ParameterModel,
    ResolverCategory, ResolverSet,
};
pub use registry::{ExtensionRegistry, RegisteredComponent};
pub use repository::{
    ComponentDescriptor, ComponentRepository, ConfigBinding, ConfigurationBinding,
    ConnectionBinding,
};
pub use resolver::{
    ConfigurationFactory, ConfigurationInstance, Connection, ConnectionProvider,
    ResolutionContext, TypeKeysResolver, TypeResolver, ValueProvider,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
