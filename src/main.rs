use std::io::Read;
use std::process::ExitCode;

use field_query_converter::config;
use field_query_converter::{ConvertorConfig, FeedbackMessageStore, GraphQLQueryConvertor, Variables};
use serde::Deserialize;

/// Request body as sent by GraphQL clients.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLPayload {
    query: String,
    #[serde(default)]
    variables: Option<Variables>,
    #[serde(default)]
    operation_name: Option<String>,
}

fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // stdout carries the converted query
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let payload = match read_payload() {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Invalid payload: {}", e);
            eprintln!("Expected a JSON payload {{\"query\": ..., \"variables\": {{...}}, \"operationName\": ...}} as file argument or on stdin");
            return ExitCode::from(2);
        }
    };

    let convertor_config = ConvertorConfig::from_env();
    let enable_multiple_query_execution = config::multiple_query_execution_from_env();
    tracing::info!(?convertor_config, enable_multiple_query_execution, "Loaded configuration");

    let convertor = GraphQLQueryConvertor::new(convertor_config);
    let mut feedback = FeedbackMessageStore::new();
    let variables = payload.variables.unwrap_or_default();
    let field_query_set = convertor.convert_from_graphql_to_field_query_set(
        &payload.query,
        &variables,
        enable_multiple_query_execution,
        payload.operation_name.as_deref(),
        &mut feedback,
    );

    for error in feedback.query_errors() {
        match error.extensions.location {
            Some(location) => tracing::error!(
                line = location.line,
                column = location.column,
                "Conversion failed: {}",
                error.message
            ),
            None => tracing::error!("Conversion failed: {}", error.message),
        }
    }

    let output = serde_json::json!({
        "requestedFieldQuery": field_query_set.requested_field_query(),
        "executableFieldQuery": field_query_set.executable_field_query(),
        "errors": feedback.query_errors(),
    });
    match serde_json::to_string_pretty(&output) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            tracing::error!("Could not render output: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if feedback.has_query_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn read_payload() -> Result<GraphQLPayload, Box<dyn std::error::Error + Send + Sync>> {
    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    Ok(serde_json::from_str(&raw)?)
}
