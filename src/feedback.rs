use serde::Serialize;

/// A position in the submitted GraphQL document, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<graphql_parser::Pos> for Location {
    fn from(pos: graphql_parser::Pos) -> Self {
        Location {
            line: pos.line,
            column: pos.column,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryError {
    pub message: String,
    #[serde(skip_serializing_if = "is_empty_extensions")]
    pub extensions: ErrorExtensions,
}

fn is_empty_extensions(extensions: &ErrorExtensions) -> bool {
    extensions.location.is_none()
}

/// Where the convertor reports the reason a conversion produced nothing.
pub trait FeedbackStore {
    fn add_query_error(&mut self, message: String, extensions: ErrorExtensions);
}

#[derive(Debug, Default)]
pub struct FeedbackMessageStore {
    query_errors: Vec<QueryError>,
}

impl FeedbackMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_errors(&self) -> &[QueryError] {
        &self.query_errors
    }

    pub fn has_query_errors(&self) -> bool {
        !self.query_errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.query_errors.clear();
    }
}

impl FeedbackStore for FeedbackMessageStore {
    fn add_query_error(&mut self, message: String, extensions: ErrorExtensions) {
        self.query_errors.push(QueryError {
            message,
            extensions,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_error_serialization_with_location() {
        let mut store = FeedbackMessageStore::new();
        store.add_query_error(
            "Boom".to_string(),
            ErrorExtensions {
                location: Some(Location { line: 3, column: 7 }),
            },
        );
        let value = serde_json::to_value(store.query_errors()).unwrap();
        assert_eq!(
            value,
            json!([{ "message": "Boom", "extensions": { "location": { "line": 3, "column": 7 } } }])
        );
    }

    #[test]
    fn test_query_error_serialization_without_location() {
        let mut store = FeedbackMessageStore::new();
        store.add_query_error("Boom".to_string(), ErrorExtensions::default());
        let value = serde_json::to_value(store.query_errors()).unwrap();
        assert_eq!(value, json!([{ "message": "Boom" }]));
        assert!(store.has_query_errors());
        store.clear();
        assert!(!store.has_query_errors());
    }
}
