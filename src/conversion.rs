use thiserror::Error;

use crate::arguments;
use crate::batch::{self, FieldQuerySet};
use crate::config::ConvertorConfig;
use crate::feedback::{ErrorExtensions, FeedbackStore, Location};
use crate::paths::{self, OperationFieldPaths};
use crate::request::{Request, Variables};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Must provide an operation.")]
    EmptyQuery,
    #[error(
        "Feature 'Multiple Query Execution' is not enabled, so can execute 1 operation only, but {count} operations were submitted ('{}')",
        .names.join("', '")
    )]
    MultipleOperationsNotEnabled { count: usize, names: Vec<String> },
    #[error("No operation with name '{0}' was submitted.")]
    UnknownOperation(String),
    #[error("{message}")]
    Syntax {
        message: String,
        location: Option<Location>,
    },
    /// Located at the fragment name of the spread, past the `...`.
    #[error("No fragment with name '{name}' has been defined")]
    UnknownFragment { name: String, location: Location },
    /// Located like `UnknownFragment`.
    #[error("Fragment '{name}' cannot reference itself")]
    RecursiveFragment { name: String, location: Location },
    #[error("Variable '${name}' has not been defined by the operation")]
    UndefinedVariable { name: String, location: Location },
    #[error("No value was provided for non-null variable '${name}'")]
    MissingVariableValue { name: String, location: Location },
    #[error("Subscription operations are not supported")]
    UnsupportedSubscription { location: Location },
}

/// The broad families callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    SyntaxOrValidation,
    UnknownFragment,
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::EmptyQuery
            | ConversionError::MultipleOperationsNotEnabled { .. }
            | ConversionError::UnknownOperation(_)
            | ConversionError::UnsupportedSubscription { .. } => ErrorKind::InvalidInput,
            ConversionError::Syntax { .. }
            | ConversionError::RecursiveFragment { .. }
            | ConversionError::UndefinedVariable { .. }
            | ConversionError::MissingVariableValue { .. } => ErrorKind::SyntaxOrValidation,
            ConversionError::UnknownFragment { .. } => ErrorKind::UnknownFragment,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            ConversionError::Syntax { location, .. } => *location,
            ConversionError::UnknownFragment { location, .. }
            | ConversionError::RecursiveFragment { location, .. }
            | ConversionError::UndefinedVariable { location, .. }
            | ConversionError::MissingVariableValue { location, .. }
            | ConversionError::UnsupportedSubscription { location } => Some(*location),
            _ => None,
        }
    }
}

/// Converts GraphQL documents into field queries.
///
/// Conversion never fails past this type: when the document cannot be
/// converted, the reason is added to the feedback store and an empty result is
/// returned. A truncated field query could execute the wrong thing, so nothing
/// partial is ever produced.
#[derive(Debug, Clone, Default)]
pub struct GraphQLQueryConvertor {
    config: ConvertorConfig,
}

impl GraphQLQueryConvertor {
    pub fn new(config: ConvertorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConvertorConfig {
        &self.config
    }

    /// Converts the document into the field query in its requested form.
    pub fn convert_from_graphql_to_field_query(
        &self,
        graphql_query: &str,
        variables: &Variables,
        enable_multiple_query_execution: bool,
        operation_name: Option<&str>,
        feedback: &mut dyn FeedbackStore,
    ) -> String {
        self.convert_from_graphql_to_field_query_set(
            graphql_query,
            variables,
            enable_multiple_query_execution,
            operation_name,
            feedback,
        )
        .into_requested_field_query()
    }

    /// Converts the document into both the requested and the executable field
    /// queries. They only differ when batches execute in strict order.
    pub fn convert_from_graphql_to_field_query_set(
        &self,
        graphql_query: &str,
        variables: &Variables,
        enable_multiple_query_execution: bool,
        operation_name: Option<&str>,
        feedback: &mut dyn FeedbackStore,
    ) -> FieldQuerySet {
        tracing::info!("Converting query: {}", graphql_query);

        match self.convert_from_graphql_to_field_query_paths(
            graphql_query,
            variables,
            enable_multiple_query_execution,
            operation_name,
        ) {
            Ok(operations) => {
                let field_query_set = batch::build_field_query_set(&operations, &self.config);
                tracing::debug!(
                    operations = operations.len(),
                    requested = field_query_set.requested_field_query(),
                    executable = field_query_set.executable_field_query(),
                    "Converted query"
                );
                field_query_set
            }
            Err(e) => {
                tracing::warn!(error = %e, "Conversion error");
                feedback.add_query_error(
                    e.to_string(),
                    ErrorExtensions {
                        location: e.location(),
                    },
                );
                FieldQuerySet::default()
            }
        }
    }

    pub fn treat_variable_as_expression(&self, variable_name: &str) -> bool {
        arguments::treat_variable_as_expression(variable_name)
    }

    fn convert_from_graphql_to_field_query_paths(
        &self,
        graphql_query: &str,
        variables: &Variables,
        enable_multiple_query_execution: bool,
        operation_name: Option<&str>,
    ) -> Result<Vec<OperationFieldPaths>, ConversionError> {
        let request = Request::parse(
            graphql_query,
            variables,
            enable_multiple_query_execution,
            operation_name,
        )?;
        paths::convert_request_to_field_query_paths(&request, &self.config)
    }
}
