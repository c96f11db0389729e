//! Builds a validated request out of the submitted GraphQL text.
//!
//! Parsing belongs to `graphql-parser`. This module selects which operations
//! run, keeps the fragment definitions at hand, and resolves variable values.

use std::collections::HashMap;

use graphql_parser::query::{
    Definition, FragmentDefinition, OperationDefinition, SelectionSet, Type, Value, VariableDefinition,
};
use graphql_parser::Pos;

use crate::conversion::ConversionError;
use crate::feedback::Location;
use crate::field_query::ArgValue;
use crate::symbols::QUERY_BATCHING_OPERATION_NAME;

/// Client-supplied variable values.
pub type Variables = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

#[derive(Debug, Clone)]
pub struct Operation<'a> {
    /// `"{line}-{column}"` of the operation in the document.
    pub id: String,
    pub name: Option<&'a str>,
    pub kind: OperationKind,
    pub position: Pos,
    pub variable_definitions: Vec<VariableDefinition<'a, &'a str>>,
    pub selection_set: SelectionSet<'a, &'a str>,
}

impl<'a> Operation<'a> {
    fn from_definition(definition: OperationDefinition<'a, &'a str>) -> Self {
        let (kind, name, position, variable_definitions, selection_set) = match definition {
            OperationDefinition::SelectionSet(selection_set) => {
                (OperationKind::Query, None, selection_set.span.0, Vec::new(), selection_set)
            }
            OperationDefinition::Query(query) => (
                OperationKind::Query,
                query.name,
                query.position,
                query.variable_definitions,
                query.selection_set,
            ),
            OperationDefinition::Mutation(mutation) => (
                OperationKind::Mutation,
                mutation.name,
                mutation.position,
                mutation.variable_definitions,
                mutation.selection_set,
            ),
            OperationDefinition::Subscription(subscription) => (
                OperationKind::Subscription,
                subscription.name,
                subscription.position,
                subscription.variable_definitions,
                subscription.selection_set,
            ),
        };
        Operation {
            id: format!("{}-{}", position.line, position.column),
            name,
            kind,
            position,
            variable_definitions,
            selection_set,
        }
    }
}

/// The operations selected for execution plus everything needed to convert
/// them.
#[derive(Debug)]
pub struct Request<'a> {
    operations: Vec<Operation<'a>>,
    fragments: HashMap<&'a str, FragmentDefinition<'a, &'a str>>,
    variables: &'a Variables,
}

impl<'a> Request<'a> {
    pub fn parse(
        graphql_query: &'a str,
        variables: &'a Variables,
        enable_multiple_query_execution: bool,
        operation_name: Option<&str>,
    ) -> Result<Self, ConversionError> {
        if graphql_query.trim().is_empty() {
            return Err(ConversionError::EmptyQuery);
        }

        let document = graphql_parser::parse_query::<&str>(graphql_query).map_err(|e| {
            let message = e.to_string();
            ConversionError::Syntax {
                location: parse_error_location(&message),
                message,
            }
        })?;

        let mut operations = Vec::new();
        let mut fragments = HashMap::new();
        for definition in document.definitions {
            match definition {
                Definition::Operation(operation) => operations.push(Operation::from_definition(operation)),
                Definition::Fragment(fragment) => {
                    fragments.insert(fragment.name, fragment);
                }
            }
        }

        let operations = select_operations(operations, enable_multiple_query_execution, operation_name)?;
        if operations.is_empty() {
            return Err(ConversionError::EmptyQuery);
        }
        if let Some(subscription) = operations.iter().find(|o| o.kind == OperationKind::Subscription) {
            return Err(ConversionError::UnsupportedSubscription {
                location: subscription.position.into(),
            });
        }

        tracing::debug!(
            operations = operations.len(),
            fragments = fragments.len(),
            "Created request"
        );

        Ok(Request {
            operations,
            fragments,
            variables,
        })
    }

    /// Every selected operation, in submission order.
    pub fn operations(&self) -> &[Operation<'a>] {
        &self.operations
    }

    pub fn queries(&self) -> impl Iterator<Item = &Operation<'a>> {
        self.operations.iter().filter(|o| o.kind == OperationKind::Query)
    }

    pub fn mutations(&self) -> impl Iterator<Item = &Operation<'a>> {
        self.operations.iter().filter(|o| o.kind == OperationKind::Mutation)
    }

    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition<'a, &'a str>> {
        self.fragments.values()
    }

    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition<'a, &'a str>> {
        self.fragments.get(name)
    }

    /// The value bound to a variable of `operation`: the submitted one, else
    /// the default declared by that operation, else `null` when the declared
    /// type allows it.
    pub fn variable_value(
        &self,
        operation: &Operation<'a>,
        name: &str,
        position: Pos,
    ) -> Result<ArgValue, ConversionError> {
        let definition = operation
            .variable_definitions
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ConversionError::UndefinedVariable {
                name: name.to_string(),
                location: position.into(),
            })?;

        if let Some(value) = self.variables.get(name) {
            return Ok(ArgValue::from(value));
        }
        if let Some(default_value) = &definition.default_value {
            return Ok(ArgValue::from(&const_value_to_json(default_value)));
        }
        match definition.var_type {
            Type::NonNullType(_) => Err(ConversionError::MissingVariableValue {
                name: name.to_string(),
                location: position.into(),
            }),
            _ => Ok(ArgValue::Null),
        }
    }
}

fn select_operations<'a>(
    mut operations: Vec<Operation<'a>>,
    enable_multiple_query_execution: bool,
    operation_name: Option<&str>,
) -> Result<Vec<Operation<'a>>, ConversionError> {
    match operation_name {
        None => {
            // Without a name, only a single operation can be resolved
            let names: Vec<String> = operations
                .iter()
                .filter(|o| matches!(o.kind, OperationKind::Query | OperationKind::Mutation))
                .map(|o| o.name.unwrap_or_default().to_string())
                .collect();
            if !enable_multiple_query_execution && names.len() > 1 {
                return Err(ConversionError::MultipleOperationsNotEnabled {
                    count: names.len(),
                    names,
                });
            }
        }
        Some(name)
            if enable_multiple_query_execution && name.eq_ignore_ascii_case(QUERY_BATCHING_OPERATION_NAME) =>
        {
            // Placeholder operation standing for "everything else"
            tracing::debug!("Executing every operation except '{}'", name);
            operations.retain(|o| o.name != Some(name));
        }
        Some(name) => {
            operations.retain(|o| o.name == Some(name));
            if operations.is_empty() {
                return Err(ConversionError::UnknownOperation(name.to_string()));
            }
        }
    }
    Ok(operations)
}

// graphql-parser reports positions as "Parse error at {line}:{column}".
fn parse_error_location(message: &str) -> Option<Location> {
    const MARKER: &str = "Parse error at ";
    let rest = &message[message.find(MARKER)? + MARKER.len()..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == ':'))
        .unwrap_or(rest.len());
    let (line, column) = rest[..end].split_once(':')?;
    Some(Location {
        line: line.parse().ok()?,
        column: column.parse().ok()?,
    })
}

fn const_value_to_json<'a>(value: &Value<'a, &'a str>) -> serde_json::Value {
    match value {
        Value::Null | Value::Variable(_) => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => n.as_i64().map(serde_json::Value::from).unwrap_or_default(),
        Value::Float(x) => serde_json::Value::from(*x),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Enum(e) => serde_json::Value::String(e.to_string()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(const_value_to_json).collect()),
        Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| (key.to_string(), const_value_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn variables(value: serde_json::Value) -> Variables {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let vars = Variables::new();
        let result = Request::parse("   \n", &vars, false, None);
        assert_eq!(result.unwrap_err(), ConversionError::EmptyQuery);
    }

    #[test]
    fn test_only_fragments_is_rejected() {
        let vars = Variables::new();
        let result = Request::parse("fragment F on Post { id }", &vars, false, None);
        assert_eq!(result.unwrap_err(), ConversionError::EmptyQuery);
    }

    #[test]
    fn test_single_operation_without_name() {
        let vars = Variables::new();
        let request = Request::parse("query One { id }", &vars, false, None).unwrap();
        assert_eq!(request.operations().len(), 1);
        assert_eq!(request.operations()[0].name, Some("One"));
        assert_eq!(request.operations()[0].id, "1-1");
    }

    #[test]
    fn test_multiple_operations_without_name() {
        let vars = Variables::new();
        let result = Request::parse("query One { id } query Two { id }", &vars, false, None);
        assert_eq!(
            result.unwrap_err(),
            ConversionError::MultipleOperationsNotEnabled {
                count: 2,
                names: vec!["One".to_string(), "Two".to_string()],
            }
        );
    }

    #[test]
    fn test_multiple_operations_enabled_keeps_all_in_order() {
        let vars = Variables::new();
        let request = Request::parse("mutation One { id } query Two { id }", &vars, true, None).unwrap();
        let names: Vec<_> = request.operations().iter().map(|o| o.name).collect();
        assert_eq!(names, vec![Some("One"), Some("Two")]);
        assert_eq!(request.queries().count(), 1);
        assert_eq!(request.mutations().count(), 1);
    }

    #[test]
    fn test_select_named_operation() {
        let vars = Variables::new();
        let request = Request::parse("query One { a } query Two { b }", &vars, false, Some("Two")).unwrap();
        assert_eq!(request.operations().len(), 1);
        assert_eq!(request.operations()[0].name, Some("Two"));
    }

    #[test]
    fn test_unknown_operation_name() {
        let vars = Variables::new();
        let result = Request::parse("query One { a }", &vars, false, Some("Three"));
        assert_eq!(result.unwrap_err(), ConversionError::UnknownOperation("Three".to_string()));
    }

    #[test]
    fn test_batching_placeholder_executes_everything_else() {
        let vars = Variables::new();
        let request = Request::parse("query One { a } query Two { b } query __ALL { id }", &vars, true, Some("__ALL")).unwrap();
        let names: Vec<_> = request.operations().iter().map(|o| o.name).collect();
        assert_eq!(names, vec![Some("One"), Some("Two")]);
    }

    #[test]
    fn test_batching_placeholder_requires_multiple_execution() {
        let vars = Variables::new();
        let request = Request::parse("query One { a } query __ALL { id }", &vars, false, Some("__ALL")).unwrap();
        let names: Vec<_> = request.operations().iter().map(|o| o.name).collect();
        assert_eq!(names, vec![Some("__ALL")]);
    }

    #[test]
    fn test_subscription_is_rejected() {
        let vars = Variables::new();
        let result = Request::parse("subscription OnPost { post { id } }", &vars, false, None);
        assert_eq!(
            result.unwrap_err(),
            ConversionError::UnsupportedSubscription {
                location: Location { line: 1, column: 1 }
            }
        );
    }

    #[test]
    fn test_syntax_error() {
        let vars = Variables::new();
        let result = Request::parse("query { posts(", &vars, false, None);
        match result {
            Err(ConversionError::Syntax { message, .. }) => assert!(!message.is_empty()),
            other => panic!("Expected Syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_location() {
        assert_eq!(
            parse_error_location("query parse error: Parse error at 3:14\nUnexpected `}`"),
            Some(Location { line: 3, column: 14 })
        );
        assert_eq!(parse_error_location("something else"), None);
    }

    #[test]
    fn test_fragment_lookup() {
        let vars = Variables::new();
        let request = Request::parse("{ ...F } fragment F on Post { id }", &vars, false, None).unwrap();
        assert!(request.fragment("F").is_some());
        assert!(request.fragment("G").is_none());
        assert_eq!(request.fragments().count(), 1);
    }

    #[test]
    fn test_variable_resolution() {
        let vars = variables(json!({ "id": 7 }));
        let request = Request::parse(
            "query Q($id: ID!, $limit: Int = 10, $after: String, $needed: String!) { posts { id } }",
            &vars,
            false,
            None,
        )
        .unwrap();
        let pos = Pos { line: 1, column: 1 };
        let operation = &request.operations()[0];
        assert_eq!(request.variable_value(operation, "id", pos).unwrap(), ArgValue::Int(7));
        assert_eq!(request.variable_value(operation, "limit", pos).unwrap(), ArgValue::Int(10));
        assert_eq!(request.variable_value(operation, "after", pos).unwrap(), ArgValue::Null);
        assert_eq!(
            request.variable_value(operation, "needed", pos).unwrap_err(),
            ConversionError::MissingVariableValue {
                name: "needed".to_string(),
                location: Location { line: 1, column: 1 }
            }
        );
        assert_eq!(
            request.variable_value(operation, "other", pos).unwrap_err(),
            ConversionError::UndefinedVariable {
                name: "other".to_string(),
                location: Location { line: 1, column: 1 }
            }
        );
    }

    #[test]
    fn test_variables_resolve_per_operation() {
        let vars = Variables::new();
        let request = Request::parse(
            "query A($x: Int = 1) { a } query B($x: Int = 2) { b }",
            &vars,
            true,
            None,
        )
        .unwrap();
        let pos = Pos { line: 1, column: 1 };
        let values: Vec<_> = request
            .operations()
            .iter()
            .map(|operation| request.variable_value(operation, "x", pos).unwrap())
            .collect();
        assert_eq!(values, vec![ArgValue::Int(1), ArgValue::Int(2)]);
    }

    #[test]
    fn test_variable_declared_by_another_operation_is_undefined() {
        let vars = variables(json!({ "x": 1 }));
        let request = Request::parse("query A($x: Int) { a } query B { b }", &vars, true, None).unwrap();
        let pos = Pos { line: 1, column: 1 };
        assert_eq!(
            request.variable_value(&request.operations()[1], "x", pos).unwrap_err(),
            ConversionError::UndefinedVariable {
                name: "x".to_string(),
                location: Location { line: 1, column: 1 }
            }
        );
    }

    #[test]
    fn test_subscriptions_are_not_counted_as_executable_operations() {
        let vars = Variables::new();
        let result = Request::parse(
            "query One { id } subscription Two { id } mutation Three { id }",
            &vars,
            false,
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            ConversionError::MultipleOperationsNotEnabled {
                count: 2,
                names: vec!["One".to_string(), "Three".to_string()],
            }
        );
    }
}
