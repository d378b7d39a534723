//! Declaration Session
//!
//! Resolves connectivity, parameter values and dynamic metadata for components
//! described purely by declarations, without deploying an application:
//! - Builds ephemeral configuration/connection instances from declarations
//! - Caches them per session with single-flight construction
//! - Dispatches to extension resolvers and wraps outcomes in result envelopes
//! - Disposes everything deterministically
//!
//! # Example
//!
//! ```rust,ignore
//! use tooling_session::{DeclarationSession, SessionConfig};
//!
//! # async fn example(extension: std::sync::Arc<dyn tooling_extension::ExtensionModel>,
//! #                  artifact: tooling_declaration::ArtifactDeclaration,
//! #                  component: tooling_declaration::ComponentElementDeclaration)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let session = DeclarationSession::builder()
//!     .artifact_declaration(artifact)
//!     .with_extension(extension)
//!     .config(SessionConfig::new().with_name("example"))
//!     .build()
//!     .await?;
//!
//! let values = session.get_values(&component, "providedParameter").await;
//! assert!(values.is_success());
//! session.dispose().await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod instance;
pub mod logging;
pub mod session;

pub use cache::{CacheStats, InstanceCache, InstanceFactory};
pub use config::SessionConfig;
pub use engine::ResolutionEngine;
pub use error::{CacheError, InstanceError, SessionError};
pub use instance::{DeclaredInstanceFactory, RuntimeInstance};
pub use session::{DeclarationSession, SessionBuilder};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with declaration sessions
    pub use crate::{DeclarationSession, SessionBuilder, SessionConfig};
    pub use tooling_declaration::{
        ArtifactDeclaration, ComponentElementDeclaration, ElementId, GlobalElementDeclaration,
        ParameterGroupDeclaration, ParameterValue,
    };
    pub use tooling_metadata::{
        ConnectionValidationResult, FailureReason, MetadataKey, MetadataResult, MetadataType,
        ValueResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
