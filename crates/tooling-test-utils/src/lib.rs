//! Testing utilities for the declaration tooling workspace
//!
//! The `tooling` fixture extension, an artifact declaring its global
//! elements, component declaration helpers and in-memory collaborators.

#![allow(missing_docs)]

pub mod declarations;
pub mod fixtures;
pub mod probe;
pub mod repository;

pub use declarations::*;
pub use fixtures::{element, tooling_extension, ToolingClient, ToolingConfig};
pub use probe::Probe;
pub use repository::InMemoryBundleRepository;

pub const EXTENSION: &str = "tooling";
pub const CONFIG_TYPE: &str = "config";
pub const LEGACY_CONFIG_TYPE: &str = "legacyConfig";
pub const CONNECTION_TYPE: &str = "connection";

pub const CONFIG_NAME: &str = "dummyConfig";
pub const OTHER_CONFIG_NAME: &str = "otherConfig";
pub const BARE_CONFIG_NAME: &str = "bareConfig";
pub const LEGACY_CONFIG_NAME: &str = "legacyConfig";
pub const LOOSE_CONNECTION_NAME: &str = "looseConnection";

pub const CLIENT_NAME: &str = "client";
pub const OTHER_CLIENT_NAME: &str = "otherClient";
pub const PROVIDED_PARAMETER_NAME: &str = "providedParameter";
