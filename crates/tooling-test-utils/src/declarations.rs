//! Declarations against the fixture extension

use crate::fixtures::{
    element, ACTING_PARAMETER_GROUP_OP, ACTING_PARAMETER_OP, BLOCKING_OP, COMPLEX_ACTING_PARAMETER_OP,
    CONFIG_LESS_CONNECTION_LESS_OP, CONFIG_LESS_OP, LOCATION_GROUP, MULTI_LEVEL_OP,
    MULTI_LEVEL_SHOW_IN_DSL_OP, SOURCE_METADATA,
};
use crate::{
    BARE_CONFIG_NAME, CLIENT_NAME, CONFIG_NAME, CONFIG_TYPE, CONNECTION_TYPE, LEGACY_CONFIG_NAME,
    LEGACY_CONFIG_TYPE, LOOSE_CONNECTION_NAME, OTHER_CLIENT_NAME, OTHER_CONFIG_NAME,
};
use tooling_declaration::{
    ArtifactDeclaration, ComponentElementDeclaration, GlobalElementDeclaration,
    ParameterGroupDeclaration, ParameterValue,
};

fn client_connection(config: &str, client: &str) -> GlobalElementDeclaration {
    GlobalElementDeclaration::connection(format!("{config}Connection"), element(CONNECTION_TYPE))
        .with_parameter("clientName", client)
}

/// Artifact with every global element the session tests reference
///
/// - `dummyConfig` / `otherConfig`: fixture configurations with a client connection
/// - `bareConfig`: configuration without a connection
/// - `looseConnection`: top-level connection, not a configuration
/// - `legacyConfig`: configuration of a type the operations do not accept
#[must_use]
pub fn artifact_declaration() -> ArtifactDeclaration {
    let configuration = |name: &str| GlobalElementDeclaration::configuration(name, element(CONFIG_TYPE));
    ArtifactDeclaration::builder()
        .with_name("tooling-app")
        .with_global_element(configuration(CONFIG_NAME).with_connection(client_connection(CONFIG_NAME, CLIENT_NAME)))
        .with_global_element(
            configuration(OTHER_CONFIG_NAME).with_connection(client_connection(OTHER_CONFIG_NAME, OTHER_CLIENT_NAME)),
        )
        .with_global_element(configuration(BARE_CONFIG_NAME))
        .with_global_element(
            GlobalElementDeclaration::connection(LOOSE_CONNECTION_NAME, element(CONNECTION_TYPE))
                .with_parameter("clientName", "loose"),
        )
        .with_global_element(
            GlobalElementDeclaration::configuration(LEGACY_CONFIG_NAME, element(LEGACY_CONFIG_TYPE))
                .with_connection(client_connection(LEGACY_CONFIG_NAME, "legacy")),
        )
        .declaration()
}

/// Operation of the fixture extension referencing `config`
#[must_use]
pub fn operation(name: &str, config: &str) -> ComponentElementDeclaration {
    ComponentElementDeclaration::operation(element(name)).with_config(config)
}

#[must_use]
pub fn config_less_connection_less_declaration() -> ComponentElementDeclaration {
    ComponentElementDeclaration::operation(element(CONFIG_LESS_CONNECTION_LESS_OP))
}

/// Config-less, connection-less operation that still names a configuration
#[must_use]
pub fn config_less_connection_less_declaration_with(config: &str) -> ComponentElementDeclaration {
    operation(CONFIG_LESS_CONNECTION_LESS_OP, config)
}

#[must_use]
pub fn config_less_declaration(config: &str) -> ComponentElementDeclaration {
    operation(CONFIG_LESS_OP, config)
}

#[must_use]
pub fn acting_parameter_declaration(config: &str, acting: &str) -> ComponentElementDeclaration {
    operation(ACTING_PARAMETER_OP, config).with_parameter("actingParameter", acting)
}

#[must_use]
pub fn acting_parameter_group_declaration(
    config: &str,
    string_param: &str,
    int_param: i64,
    list_params: &[&str],
) -> ComponentElementDeclaration {
    operation(ACTING_PARAMETER_GROUP_OP, config).with_group(
        ParameterGroupDeclaration::new("ActingParameters")
            .with_parameter("stringParam", string_param)
            .with_parameter("intParam", int_param)
            .with_parameter("listParams", ParameterValue::string_list(list_params.iter().copied())),
    )
}

#[must_use]
pub fn complex_acting_parameter_declaration(config: &str, inner: &str) -> ComponentElementDeclaration {
    operation(COMPLEX_ACTING_PARAMETER_OP, config).with_parameter(
        "complexParameter",
        ParameterValue::object([
            ("intParam", ParameterValue::integer(0)),
            ("stringParam", ParameterValue::string(inner)),
        ]),
    )
}

fn location_group(continent: Option<&str>, country: Option<&str>, city: Option<&str>) -> ParameterGroupDeclaration {
    [("continent", continent), ("country", country), ("city", city)]
        .into_iter()
        .fold(ParameterGroupDeclaration::new(LOCATION_GROUP), |group, (part, value)| match value {
            Some(value) => group.with_parameter(part, value),
            None => group,
        })
}

/// Multi-level key operation with the location group declared inline
#[must_use]
pub fn multi_level_declaration(
    config: &str,
    continent: Option<&str>,
    country: Option<&str>,
) -> ComponentElementDeclaration {
    operation(MULTI_LEVEL_OP, config).with_group(location_group(continent, country, None))
}

/// Multi-level key operation with the location group shown in DSL
#[must_use]
pub fn multi_level_show_in_dsl_declaration(
    config: &str,
    continent: Option<&str>,
    country: Option<&str>,
) -> ComponentElementDeclaration {
    operation(MULTI_LEVEL_SHOW_IN_DSL_OP, config)
        .with_group(location_group(continent, country, None).shown_in_dsl())
}

/// Source with location key parts and an optional `actingParameter`
#[must_use]
pub fn source_declaration(
    config: &str,
    acting: Option<&str>,
    continent: Option<&str>,
    country: Option<&str>,
    city: Option<&str>,
) -> ComponentElementDeclaration {
    let source = ComponentElementDeclaration::source(element(SOURCE_METADATA))
        .with_config(config)
        .with_group(location_group(continent, country, city));
    match acting {
        Some(acting) => source.with_parameter("actingParameter", acting),
        None => source,
    }
}

#[must_use]
pub fn blocking_declaration(config: &str) -> ComponentElementDeclaration {
    operation(BLOCKING_OP, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_is_valid() {
        let artifact = artifact_declaration();
        artifact.validate().unwrap();
        assert!(artifact
            .global_element(CONFIG_NAME)
            .and_then(GlobalElementDeclaration::connection_element)
            .is_some());
        assert!(artifact
            .global_element(BARE_CONFIG_NAME)
            .is_some_and(|e| e.connection_element().is_none()));
    }

    #[test]
    fn absent_location_parts_are_not_declared() {
        let component = multi_level_declaration(CONFIG_NAME, Some("America"), None);
        assert_eq!(component.parameter("continent").and_then(ParameterValue::as_str), Some("America"));
        assert!(component.parameter("country").is_none());
        assert!(source_declaration(CONFIG_NAME, None, None, None, None)
            .parameter("actingParameter")
            .is_none());
    }
}
