//! Shared session setup for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use tooling_session::{DeclarationSession, SessionConfig};
use tooling_test_utils::{artifact_declaration, tooling_extension, Probe};

/// Session over the fixture artifact plus the probe observing it
pub struct Fixture {
    pub session: Arc<DeclarationSession>,
    pub probe: Arc<Probe>,
}

pub async fn fixture() -> Fixture {
    fixture_with(SessionConfig::new().with_name("integration")).await
}

pub async fn fixture_with(config: SessionConfig) -> Fixture {
    let _ = tooling_session::logging::init("tooling_session=debug");
    let probe = Arc::new(Probe::new());
    let session = DeclarationSession::builder()
        .artifact_declaration(artifact_declaration())
        .with_extension(tooling_extension(&probe))
        .config(config)
        .build()
        .await
        .expect("fixture session builds");
    Fixture {
        session: Arc::new(session),
        probe,
    }
}
