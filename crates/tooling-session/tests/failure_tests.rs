//! Failure envelopes produced by a declaration session
//!
//! Run with: cargo test --package tooling-session --test failure_tests

mod common;

use common::{fixture, fixture_with};
use pretty_assertions::assert_eq;
use tooling_declaration::ComponentElementDeclaration;
use tooling_metadata::FailureReason;
use tooling_session::SessionConfig;
use tooling_test_utils::fixtures::{
    DUPLICATE_KEYS_OP, DUPLICATE_VALUES_OP, FAILING_OP, MULTI_LEVEL_OP, PANICKING_OP,
};
use tooling_test_utils::*;

#[tokio::test]
async fn unknown_configuration_is_an_invalid_reference() {
    let fx = fixture().await;
    let values = fx
        .session
        .get_values(&config_less_declaration("nonExistingConfig"), PROVIDED_PARAMETER_NAME)
        .await;
    assert_eq!(values.reason(), Some(FailureReason::InvalidConfigReference));

    let connection = fx.session.test_connection("nonExistingConfig").await;
    assert_eq!(connection.reason(), Some(FailureReason::InvalidConfigReference));
    fx.session.dispose().await;
}

#[tokio::test]
async fn undeclared_configuration_fails_even_when_not_needed() {
    let fx = fixture().await;
    let values = fx
        .session
        .get_values(&config_less_connection_less_declaration_with("noSuchConfig"), PROVIDED_PARAMETER_NAME)
        .await;
    assert_eq!(values.reason(), Some(FailureReason::InvalidConfigReference));

    let keys = fx
        .session
        .get_metadata_keys(&config_less_connection_less_declaration_with(LOOSE_CONNECTION_NAME))
        .await;
    assert_eq!(keys.reason(), Some(FailureReason::InvalidConfigReference));
    assert_eq!(fx.probe.configurations_created(), 0);
    fx.session.dispose().await;
}

#[tokio::test]
async fn unusable_configurations_are_invalid_references() {
    let fx = fixture().await;
    for config in [BARE_CONFIG_NAME, LOOSE_CONNECTION_NAME, LEGACY_CONFIG_NAME] {
        let keys = fx.session.get_metadata_keys(&config_less_declaration(config)).await;
        assert_eq!(keys.reason(), Some(FailureReason::InvalidConfigReference), "config {config}");
    }
    assert_eq!(
        fx.session.test_connection(BARE_CONFIG_NAME).await.reason(),
        Some(FailureReason::InvalidConfigReference)
    );
    assert_eq!(fx.probe.configurations_created(), 0);
    fx.session.dispose().await;
}

#[tokio::test]
async fn missing_config_reference() {
    let fx = fixture().await;
    let component = ComponentElementDeclaration::operation(element(tooling_test_utils::fixtures::CONFIG_LESS_OP));
    let values = fx.session.get_values(&component, PROVIDED_PARAMETER_NAME).await;
    assert_eq!(values.reason(), Some(FailureReason::InvalidConfigReference));
    fx.session.dispose().await;
}

#[tokio::test]
async fn unknown_component_or_parameter() {
    let fx = fixture().await;
    let unknown = ComponentElementDeclaration::operation(element("invalidComponentName"));
    assert_eq!(
        fx.session.get_values(&unknown, PROVIDED_PARAMETER_NAME).await.reason(),
        Some(FailureReason::ComponentNotFound)
    );
    assert_eq!(
        fx.session.get_metadata_keys(&unknown).await.reason(),
        Some(FailureReason::ComponentNotFound)
    );
    assert_eq!(
        fx.session
            .get_values(&config_less_connection_less_declaration(), "notAProvidedParameter")
            .await
            .reason(),
        Some(FailureReason::ComponentNotFound)
    );
    fx.session.dispose().await;
}

#[tokio::test]
async fn missing_acting_parameter() {
    let fx = fixture().await;
    let component = operation(tooling_test_utils::fixtures::ACTING_PARAMETER_OP, CONFIG_NAME);
    let values = fx.session.get_values(&component, PROVIDED_PARAMETER_NAME).await;
    let failure = values.failure_details().expect("values fail");
    assert_eq!(failure.reason, FailureReason::MissingActingParameter);
    assert!(failure.message.contains("actingParameter"), "{}", failure.message);
    fx.session.dispose().await;
}

#[tokio::test]
async fn duplicate_values_violate_the_resolver_contract() {
    let fx = fixture().await;
    let values = fx
        .session
        .get_values(&ComponentElementDeclaration::operation(element(DUPLICATE_VALUES_OP)), PROVIDED_PARAMETER_NAME)
        .await;
    assert_eq!(values.reason(), Some(FailureReason::ResolverContractViolation));
    fx.session.dispose().await;
}

#[tokio::test]
async fn duplicate_keys_violate_the_resolver_contract() {
    let fx = fixture().await;
    let keys = fx
        .session
        .get_metadata_keys(&ComponentElementDeclaration::operation(element(DUPLICATE_KEYS_OP)))
        .await;
    assert_eq!(keys.reason(), Some(FailureReason::ResolverContractViolation));
    fx.session.dispose().await;
}

#[tokio::test]
async fn unknown_key_value_is_an_invalid_metadata_key() {
    let fx = fixture().await;
    let keys = fx
        .session
        .get_metadata_keys(&multi_level_declaration(CONFIG_NAME, Some("Asia"), None))
        .await;
    assert_eq!(keys.reason(), Some(FailureReason::InvalidMetadataKey));

    let gap = fx
        .session
        .get_metadata_keys(&operation(MULTI_LEVEL_OP, CONFIG_NAME).with_parameter("country", "USA"))
        .await;
    assert_eq!(gap.reason(), Some(FailureReason::ResolverContractViolation));
    fx.session.dispose().await;
}

#[tokio::test]
async fn incomplete_key_has_no_type() {
    let fx = fixture().await;
    let output = fx
        .session
        .output_metadata(&multi_level_declaration(CONFIG_NAME, Some("America"), None))
        .await;
    assert_eq!(output.reason(), Some(FailureReason::InvalidMetadataKey));
    fx.session.dispose().await;
}

#[tokio::test]
async fn panicking_resolver_is_unknown_and_session_survives() {
    let fx = fixture().await;
    let values = fx
        .session
        .get_values(&ComponentElementDeclaration::operation(element(PANICKING_OP)), PROVIDED_PARAMETER_NAME)
        .await;
    let failure = values.failure_details().expect("panic is reported");
    assert_eq!(failure.reason, FailureReason::Unknown);
    assert_eq!(failure.cause.as_deref(), Some("value provider exploded"));

    let next = fx
        .session
        .get_values(&config_less_connection_less_declaration(), PROVIDED_PARAMETER_NAME)
        .await;
    assert!(next.is_success());
    fx.session.dispose().await;
}

#[tokio::test]
async fn failing_resolver_keeps_its_cause() {
    let fx = fixture().await;
    let values = fx
        .session
        .get_values(&ComponentElementDeclaration::operation(element(FAILING_OP)), PROVIDED_PARAMETER_NAME)
        .await;
    let failure = values.failure_details().expect("failure is reported");
    assert_eq!(failure.reason, FailureReason::Unknown);
    assert_eq!(failure.message, "remote lookup failed");
    assert!(failure.cause.as_deref().is_some_and(|c| c.contains("lookup service down")));
    fx.session.dispose().await;
}

#[tokio::test]
async fn connection_failure_is_retried_on_next_call() {
    let fx = fixture().await;
    fx.probe.set_fail_connect(true);
    let component = config_less_declaration(CONFIG_NAME);

    let failed = fx.session.get_values(&component, PROVIDED_PARAMETER_NAME).await;
    assert_eq!(failed.reason(), Some(FailureReason::ConnectionFailure));
    assert_eq!(
        fx.session.test_connection(CONFIG_NAME).await.reason(),
        Some(FailureReason::ConnectionFailure)
    );

    fx.probe.set_fail_connect(false);
    let values = fx.session.get_values(&component, PROVIDED_PARAMETER_NAME).await;
    assert!(values.is_success(), "{values:?}");
    assert_eq!(fx.probe.connections(), 3);
    fx.session.dispose().await;
}

#[tokio::test]
async fn failed_validation_is_a_connection_failure() {
    let fx = fixture_with(SessionConfig::new().with_validate_on_connect(false)).await;
    fx.probe.set_fail_validation(true);
    let result = fx.session.test_connection(CONFIG_NAME).await;
    assert!(!result.is_valid());
    assert_eq!(result.reason(), Some(FailureReason::ConnectionFailure));

    // Without validation on connect the connection itself is usable
    let values = fx
        .session
        .get_values(&config_less_declaration(CONFIG_NAME), PROVIDED_PARAMETER_NAME)
        .await;
    assert!(values.is_success());
    fx.session.dispose().await;
}

#[tokio::test]
async fn components_without_dynamic_types() {
    let fx = fixture().await;
    let component = config_less_connection_less_declaration();
    assert_eq!(
        fx.session.output_metadata(&component).await.reason(),
        Some(FailureReason::NoDynamicTypeAvailable)
    );
    assert_eq!(
        fx.session.get_metadata_types(&component).await.reason(),
        Some(FailureReason::NoDynamicTypeAvailable)
    );

    let source = source_declaration(CONFIG_NAME, None, Some("America"), Some("USA"), Some("SFO"));
    assert_eq!(
        fx.session.input_metadata(&source, "notDynamic").await.reason(),
        Some(FailureReason::NoDynamicTypeAvailable)
    );
    fx.session.dispose().await;
}

#[tokio::test]
async fn components_without_keys() {
    let fx = fixture().await;
    let keys = fx
        .session
        .get_metadata_keys(&acting_parameter_declaration(CONFIG_NAME, "x"))
        .await;
    assert_eq!(keys.reason(), Some(FailureReason::NoDynamicKeysAvailable));
    fx.session.dispose().await;
}
