use graphql_parser::query::{Directive as AstDirective, Value};
use graphql_parser::Pos;

use crate::config::ConvertorConfig;
use crate::conversion::ConversionError;
use crate::field_query::{ArgValue, Arguments, Directive, FieldToken};
use crate::request::{Operation, Request};
use crate::symbols::{
    EMBEDDABLE_FIELD_PREFIX, EMBEDDABLE_FIELD_SUFFIX, SPRINTF_FIELD, SPRINTF_PLACEHOLDER,
    VARIABLE_AS_EXPRESSION_NAME_PREFIX,
};

/// Whether the variable must be dealt with as an expression, ie: its name
/// starts with `_`.
pub fn treat_variable_as_expression(variable_name: &str) -> bool {
    variable_name.starts_with(VARIABLE_AS_EXPRESSION_NAME_PREFIX)
}

/// Maps argument values from the GraphQL AST into field-query values.
/// Variables resolve against the declarations of `operation` only.
pub struct ArgumentConverter<'r, 'a> {
    config: &'r ConvertorConfig,
    request: &'r Request<'a>,
    operation: &'r Operation<'a>,
}

impl<'r, 'a> ArgumentConverter<'r, 'a> {
    pub fn new(config: &'r ConvertorConfig, request: &'r Request<'a>, operation: &'r Operation<'a>) -> Self {
        Self {
            config,
            request,
            operation,
        }
    }

    pub fn convert_argument_value(&self, value: &Value<'a, &'a str>, position: Pos) -> Result<ArgValue, ConversionError> {
        Ok(match value {
            Value::Variable(name)
                if self.config.enable_variables_as_expressions && treat_variable_as_expression(name) =>
            {
                // Resolved by the engine, so `@export` can set it on runtime
                ArgValue::Expression(name.to_string())
            }
            Value::Variable(name) => self.request.variable_value(self.operation, name, position)?,
            Value::String(s) if self.config.enable_embeddable_fields => embed_fields(s),
            Value::String(s) => ArgValue::String(s.clone()),
            Value::Int(n) => n.as_i64().map(ArgValue::Int).unwrap_or(ArgValue::Null),
            Value::Float(x) => ArgValue::Float(*x),
            Value::Boolean(b) => ArgValue::Boolean(*b),
            Value::Null => ArgValue::Null,
            Value::Enum(e) => ArgValue::Enum(e.to_string()),
            Value::List(items) => ArgValue::List(
                items
                    .iter()
                    .map(|item| self.convert_argument_value(item, position))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(entries) => ArgValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.to_string(), self.convert_argument_value(value, position)?)))
                    .collect::<Result<_, ConversionError>>()?,
            ),
        })
    }

    pub fn convert_arguments(
        &self,
        arguments: &[(&'a str, Value<'a, &'a str>)],
        position: Pos,
    ) -> Result<Arguments, ConversionError> {
        arguments
            .iter()
            .map(|(name, value)| Ok((name.to_string(), self.convert_argument_value(value, position)?)))
            .collect()
    }

    pub fn convert_directives(&self, directives: &[AstDirective<'a, &'a str>]) -> Result<Vec<Directive>, ConversionError> {
        directives
            .iter()
            .map(|directive| {
                Ok(Directive::new(
                    directive.name,
                    self.convert_arguments(&directive.arguments, directive.position)?,
                ))
            })
            .collect()
    }
}

/// Rewrites every `{{field}}` inside a string literal into a call to that
/// field: `"Hi {{name}}!"` becomes `sprintf(string:"Hi %s!",values:[name()])`.
/// Literals without references are returned as plain strings.
pub fn embed_fields(literal: &str) -> ArgValue {
    let mut format = String::new();
    let mut fields = Vec::new();
    let mut rest = literal;
    while let Some(start) = rest.find(EMBEDDABLE_FIELD_PREFIX) {
        let after = &rest[start + EMBEDDABLE_FIELD_PREFIX.len()..];
        let name_len = field_name_len(after);
        if name_len > 0 && after[name_len..].starts_with(EMBEDDABLE_FIELD_SUFFIX) {
            push_format_text(&mut format, &rest[..start]);
            format.push_str(SPRINTF_PLACEHOLDER);
            fields.push(ArgValue::Field(Box::new(FieldToken::new(&after[..name_len]))));
            rest = &after[name_len + EMBEDDABLE_FIELD_SUFFIX.len()..];
        } else {
            // Not a reference, move past the first brace only: "{{{a}}}"
            push_format_text(&mut format, &rest[..start + 1]);
            rest = &rest[start + 1..];
        }
    }
    if fields.is_empty() {
        return ArgValue::String(literal.to_string());
    }
    push_format_text(&mut format, rest);

    let call = FieldToken::new(SPRINTF_FIELD).with_arguments(vec![
        ("string".to_string(), ArgValue::String(format)),
        ("values".to_string(), ArgValue::List(fields)),
    ]);
    ArgValue::Field(Box::new(call))
}

fn field_name_len(s: &str) -> usize {
    let mut len = 0;
    for (i, c) in s.char_indices() {
        let valid = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };
        if !valid {
            break;
        }
        len = i + c.len_utf8();
    }
    len
}

// A literal `%` must not be read as a placeholder.
fn push_format_text(format: &mut String, text: &str) {
    for c in text.chars() {
        if c == '%' {
            format.push('%');
        }
        format.push(c);
    }
}
