//! Joins operation paths into the final field query.
//!
//! The engine resolves root-level paths independently, but paths sharing an
//! ancestor resolve in the ancestor's order. To run a batch in submission
//! order, each operation is nested under the previous ones by prefixing its
//! paths with `self`, once per level of depth accumulated before it.

use serde::Serialize;

use crate::config::ConvertorConfig;
use crate::field_query::FieldToken;
use crate::paths::{FieldPath, OperationFieldPaths};
use crate::symbols::{OPERATIONS_SEPARATOR, QUERY_FIELDS_SEPARATOR, RELATIONAL_FIELDS_NEXT_LEVEL, SELF_FIELD};

/// The field query as requested, and as it must be executed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldQuerySet {
    requested_field_query: String,
    executable_field_query: String,
}

impl FieldQuerySet {
    pub fn new(requested_field_query: String, executable_field_query: String) -> Self {
        Self {
            requested_field_query,
            executable_field_query,
        }
    }

    pub fn requested_field_query(&self) -> &str {
        &self.requested_field_query
    }

    pub fn executable_field_query(&self) -> &str {
        &self.executable_field_query
    }

    pub fn into_requested_field_query(self) -> String {
        self.requested_field_query
    }

    pub fn are_requested_and_executable_field_queries_different(&self) -> bool {
        self.requested_field_query != self.executable_field_query
    }
}

pub fn build_field_query_set(operations: &[OperationFieldPaths], config: &ConvertorConfig) -> FieldQuerySet {
    let requested_field_query = serialize_operations(operations);
    let executable_field_query = if config.execute_query_batch_in_strict_order {
        serialize_operations(&pad_operations_for_strict_order(operations))
    } else {
        requested_field_query.clone()
    };
    FieldQuerySet::new(requested_field_query, executable_field_query)
}

pub fn serialize_operations(operations: &[OperationFieldPaths]) -> String {
    operations
        .iter()
        .map(|operation| {
            operation
                .paths
                .iter()
                .map(|path| serialize_path(path))
                .collect::<Vec<_>>()
                .join(QUERY_FIELDS_SEPARATOR)
        })
        .collect::<Vec<_>>()
        .join(OPERATIONS_SEPARATOR)
}

pub fn serialize_path(path: &[FieldToken]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(RELATIONAL_FIELDS_NEXT_LEVEL)
}

/// Levels an operation adds below its root: the longest path minus one.
pub fn operation_depth(paths: &[FieldPath]) -> usize {
    paths.iter().map(Vec::len).max().unwrap_or(0).saturating_sub(1)
}

pub fn pad_operations_for_strict_order(operations: &[OperationFieldPaths]) -> Vec<OperationFieldPaths> {
    let mut padding = 0;
    operations
        .iter()
        .map(|operation| {
            let padded = OperationFieldPaths {
                id: operation.id.clone(),
                paths: operation
                    .paths
                    .iter()
                    .map(|path| {
                        std::iter::repeat_with(|| FieldToken::new(SELF_FIELD))
                            .take(padding)
                            .chain(path.iter().cloned())
                            .collect()
                    })
                    .collect(),
            };
            padding += operation_depth(&operation.paths);
            padded
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(names: &[&str]) -> FieldPath {
        names.iter().map(|name| FieldToken::new(*name)).collect()
    }

    fn operation(id: &str, paths: Vec<FieldPath>) -> OperationFieldPaths {
        OperationFieldPaths {
            id: id.to_string(),
            paths,
        }
    }

    fn three_operations() -> Vec<OperationFieldPaths> {
        vec![
            operation("1-1", vec![path(&["a", "b"]), path(&["c"])]),
            operation("2-1", vec![path(&["d", "e", "f", "g"])]),
            operation("3-1", vec![path(&["h", "i", "j"]), path(&["k", "l"])]),
        ]
    }

    #[test]
    fn test_serialization_separators() {
        assert_eq!(
            serialize_operations(&three_operations()),
            "a.b,c;d.e.f.g;h.i.j,k.l"
        );
    }

    #[test]
    fn test_operation_depth() {
        let operations = three_operations();
        let depths: Vec<_> = operations.iter().map(|o| operation_depth(&o.paths)).collect();
        assert_eq!(depths, vec![1, 3, 2]);
        assert_eq!(operation_depth(&[]), 0);
    }

    #[test]
    fn test_strict_order_padding() {
        // Depths 1, 3, 2 pad the operations with 0, 1 and 1 + 3 `self`
        let padded = pad_operations_for_strict_order(&three_operations());
        assert_eq!(
            serialize_operations(&padded),
            "a.b,c;self.d.e.f.g;self.self.self.self.h.i.j,self.self.self.self.k.l"
        );
    }

    #[test]
    fn test_field_query_set_without_strict_order() {
        let set = build_field_query_set(&three_operations(), &ConvertorConfig::default());
        assert_eq!(set.requested_field_query(), set.executable_field_query());
        assert!(!set.are_requested_and_executable_field_queries_different());
    }

    #[test]
    fn test_field_query_set_with_strict_order() {
        let config = ConvertorConfig {
            execute_query_batch_in_strict_order: true,
            ..Default::default()
        };
        let set = build_field_query_set(&three_operations(), &config);
        assert_eq!(set.requested_field_query(), "a.b,c;d.e.f.g;h.i.j,k.l");
        assert!(set.executable_field_query().starts_with("a.b,c;self.d"));
        assert!(set.are_requested_and_executable_field_queries_different());
    }

    #[test]
    fn test_single_operation_needs_no_padding() {
        let config = ConvertorConfig {
            execute_query_batch_in_strict_order: true,
            ..Default::default()
        };
        let set = build_field_query_set(&[operation("1-1", vec![path(&["a", "b", "c"])])], &config);
        assert!(!set.are_requested_and_executable_field_queries_different());
    }

    #[test]
    fn test_serialize_field_query_set() {
        let set = FieldQuerySet::new("a".to_string(), "a".to_string());
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            serde_json::json!({ "requestedFieldQuery": "a", "executableFieldQuery": "a" })
        );
    }
}
