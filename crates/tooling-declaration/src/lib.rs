//! Declaration model
//!
//! Immutable, side-effect-free description of an artifact's global elements
//! and of the component whose metadata is being resolved.
//!
//! # Core Concepts
//!
//! - [`ArtifactDeclaration`]: global elements (configurations, connections)
//! - [`ComponentElementDeclaration`]: operation or source plus its parameters
//! - [`ParameterValue`]: tagged `Scalar | List | Object` value tree
//!
//! # Example
//!
//! ```rust
//! use tooling_declaration::{ArtifactDeclaration, ElementId, GlobalElementDeclaration};
//!
//! let artifact = ArtifactDeclaration::builder()
//!     .with_global_element(
//!         GlobalElementDeclaration::configuration("dummyConfig", ElementId::new("tooling", "config"))
//!             .with_connection(
//!                 GlobalElementDeclaration::connection("client", ElementId::new("tooling", "connection"))
//!                     .with_parameter("clientName", "client"),
//!             ),
//!     )
//!     .build()
//!     .unwrap();
//! assert!(artifact.global_element("dummyConfig").is_some());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod element;
mod error;
mod value;

pub use artifact::{ArtifactDeclaration, ArtifactDeclarer};
pub use element::{
    ComponentElementDeclaration, ComponentKind, ElementId, GlobalElementDeclaration,
    GlobalElementKind, ParameterGroupDeclaration,
};
pub use error::DeclarationError;
pub use value::{is_valid_name, ParameterValue, Parameters, Scalar};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
