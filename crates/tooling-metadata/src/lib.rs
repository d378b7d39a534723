//! Metadata model and key tree resolution
//!
//! # Core Concepts
//!
//! - [`MetadataKey`]: node of a possibly multi-level key tree
//! - [`MetadataType`]: structural type of inputs, outputs and attributes
//! - [`ResolutionResult`]: success-or-failure envelope with a closed
//!   [`FailureReason`] taxonomy
//! - [`KeyTreeResolver`]: lazy, partial-key aware walk over hierarchical keys

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod container;
mod key;
mod result;
mod tree;
mod types;

pub use container::{MetadataKeysContainer, MetadataTypesContainer};
pub use key::{first_duplicate_id, MetadataKey, MetadataKeyValue};
pub use result::{
    render_sources, ConnectionValidationResult, FailureReason, MetadataResult, ResolutionFailure,
    ResolutionResult, Value, ValueResult,
};
pub use tree::{KeyLevelSource, KeyTreeError, KeyTreeResolver, PartialKey};
pub use types::{MetadataType, ObjectField};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
