use serde::Deserialize;

pub const ENABLE_VARIABLES_AS_EXPRESSIONS: &str = "ENABLE_VARIABLES_AS_EXPRESSIONS";
pub const ENABLE_EMBEDDABLE_FIELDS: &str = "ENABLE_EMBEDDABLE_FIELDS";
pub const EXECUTE_QUERY_BATCH_IN_STRICT_ORDER: &str = "EXECUTE_QUERY_BATCH_IN_STRICT_ORDER";
pub const ENABLE_MULTIPLE_QUERY_EXECUTION: &str = "ENABLE_MULTIPLE_QUERY_EXECUTION";

/// Capabilities the convertor honours. Resolved once by the caller and passed
/// into every conversion, so a conversion depends only on its inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertorConfig {
    /// Variables named `_foo` become expressions resolved by the engine.
    pub enable_variables_as_expressions: bool,
    /// String literals may reference fields as `{{field}}`.
    pub enable_embeddable_fields: bool,
    /// Nest every operation of a batch under the previous ones.
    pub execute_query_batch_in_strict_order: bool,
}

impl ConvertorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            enable_variables_as_expressions: flag(&lookup, ENABLE_VARIABLES_AS_EXPRESSIONS),
            enable_embeddable_fields: flag(&lookup, ENABLE_EMBEDDABLE_FIELDS),
            execute_query_batch_in_strict_order: flag(&lookup, EXECUTE_QUERY_BATCH_IN_STRICT_ORDER),
        }
    }
}

/// Whether multiple query execution was switched on through the environment.
pub fn multiple_query_execution_from_env() -> bool {
    flag(&|key: &str| std::env::var(key).ok(), ENABLE_MULTIPLE_QUERY_EXECUTION)
}

fn flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_all_disabled() {
        let config = ConvertorConfig::from_lookup(|_| None);
        assert_eq!(config, ConvertorConfig::default());
    }

    #[test]
    fn test_flags_are_case_insensitive() {
        let vars: HashMap<&str, &str> = [
            (ENABLE_VARIABLES_AS_EXPRESSIONS, "TRUE"),
            (ENABLE_EMBEDDABLE_FIELDS, "yes"),
            (EXECUTE_QUERY_BATCH_IN_STRICT_ORDER, " true "),
        ]
        .into_iter()
        .collect();
        let config = ConvertorConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert!(config.enable_variables_as_expressions);
        assert!(!config.enable_embeddable_fields);
        assert!(config.execute_query_batch_in_strict_order);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let config: ConvertorConfig =
            serde_json::from_value(serde_json::json!({ "enableEmbeddableFields": true })).unwrap();
        assert!(config.enable_embeddable_fields);
        assert!(!config.enable_variables_as_expressions);
    }
}
