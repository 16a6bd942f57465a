//! Component body resolution
//!
//! Turns `(name, raw body)` into mountable props or a `ComponentError`.
//! Steps run in a fixed order: registry lookup, JSON parse, object check,
//! alias normalization, defaults, validation.

use super::aliases::AliasTable;
use super::registry::ComponentRegistry;
use crate::error::ComponentError;
use crate::guard::isolate;
use serde_json::{Map, Value};

/// Resolve a component body against the registry
pub fn resolve_component(
    registry: &dyn ComponentRegistry,
    aliases: &AliasTable,
    name: &str,
    body: &str,
) -> Result<Map<String, Value>, ComponentError> {
    let registry_failure = || ComponentError::RegistryFailure(name.to_string());

    let known = isolate("registry.has", || registry.has(name)).ok_or_else(registry_failure)?;
    if !known {
        return Err(ComponentError::UnknownComponent(name.to_string()));
    }

    let value: Value =
        serde_json::from_str(body.trim()).map_err(|source| ComponentError::MalformedBody {
            name: name.to_string(),
            source,
        })?;
    let Value::Object(mut props) = value else {
        return Err(ComponentError::NotAnObject(name.to_string()));
    };

    aliases.normalize(name, &mut props);

    let props = isolate("registry.apply_defaults", || registry.apply_defaults(name, props))
        .ok_or_else(registry_failure)?;

    let result =
        isolate("registry.validate", || registry.validate(name, &props)).ok_or_else(registry_failure)?;
    if !result.valid {
        return Err(ComponentError::SchemaValidation {
            name: name.to_string(),
            errors: result.errors,
        });
    }

    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::registry::{SchemaRegistry, Skeleton, ValidationResult};
    use serde_json::json;

    fn resolve(name: &str, body: &str) -> Result<Map<String, Value>, ComponentError> {
        resolve_component(&SchemaRegistry::builtin(), &AliasTable::builtin(), name, body)
    }

    #[test]
    fn test_resolves_with_aliases_and_defaults() {
        let props = resolve("alert", r#"{"message": "hi"}"#).unwrap();
        assert_eq!(Value::Object(props), json!({"text": "hi", "type": "info"}));
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(resolve("gauge", "{}").unwrap_err().kind(), "unknown_component");
        assert_eq!(resolve("alert", r#"{"text": "#).unwrap_err().kind(), "malformed_body");
        assert_eq!(resolve("alert", "[1, 2]").unwrap_err().kind(), "not_an_object");
        assert_eq!(resolve("alert", r#"{"type": "info"}"#).unwrap_err().kind(), "schema_validation");
    }

    #[test]
    fn test_alias_applies_before_validation() {
        // `level` satisfies the `type` rule, so the bad value is caught
        let err = resolve("alert", r#"{"text": "x", "level": "shout"}"#).unwrap_err();
        match err {
            ComponentError::SchemaValidation { errors, .. } => {
                assert_eq!(errors[0].field, "type");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct PanickingRegistry;

    impl ComponentRegistry for PanickingRegistry {
        fn has(&self, _name: &str) -> bool {
            true
        }

        fn validate(&self, _name: &str, _props: &Map<String, Value>) -> ValidationResult {
            panic!("validator bug")
        }

        fn apply_defaults(&self, _name: &str, props: Map<String, Value>) -> Map<String, Value> {
            props
        }

        fn skeleton(&self, _name: &str) -> Option<Skeleton> {
            None
        }
    }

    #[test]
    fn test_registry_panic_is_contained() {
        let err = resolve_component(&PanickingRegistry, &AliasTable::new(), "x", "{}").unwrap_err();
        assert_eq!(err.kind(), "registry_failure");
    }
}
