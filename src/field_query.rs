//! Structured field-query tokens and their string form.
//!
//! Paths are kept as [`FieldToken`]s until the very end, so that directives
//! can be inserted into a token without re-parsing an already serialized
//! string. Serialization happens once, through the `Display` impls below.

use std::fmt::{self, Display, Write};

use crate::symbols::*;

/// Argument name to converted value, in declaration order.
pub type Arguments = Vec<(String, ArgValue)>;

/// A value in the shape the field-query interpreter understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    List(Vec<ArgValue>),
    Object(Vec<(String, ArgValue)>),
    /// Resolved by the engine at execution time, eg: `%{_title}%`.
    Expression(String),
    /// A nested field call evaluated by the engine, eg: `isType(type:Post)`.
    Field(Box<FieldToken>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Arguments,
}

/// One field of a path: name, arguments, alias and directives.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldToken {
    pub name: String,
    pub arguments: Arguments,
    pub alias: Option<String>,
    pub directives: Vec<Directive>,
}

impl Directive {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Directive {
            name: name.into(),
            arguments,
        }
    }
}

impl FieldToken {
    pub fn new(name: impl Into<String>) -> Self {
        FieldToken {
            name: name.into(),
            arguments: Vec::new(),
            alias: None,
            directives: Vec::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_directives(mut self, directives: Vec<Directive>) -> Self {
        self.directives = directives;
        self
    }

    /// Inserts directives ahead of the existing ones, keeping their order.
    pub fn prepend_directives(&mut self, directives: impl IntoIterator<Item = Directive>) {
        let existing = std::mem::take(&mut self.directives);
        self.directives.extend(directives);
        self.directives.extend(existing);
    }
}

impl From<&serde_json::Value> for ArgValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ArgValue::Null,
            serde_json::Value::Bool(b) => ArgValue::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ArgValue::Int(i),
                None => ArgValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => ArgValue::String(s.clone()),
            serde_json::Value::Array(items) => ArgValue::List(items.iter().map(ArgValue::from).collect()),
            serde_json::Value::Object(map) => ArgValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), ArgValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Display for FieldToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_field(f, self, false)
    }
}

// A field used as a value is a call, so it keeps its parentheses even
// without arguments: `title()` rather than the string `title`.
fn write_field(f: &mut fmt::Formatter<'_>, field: &FieldToken, as_value: bool) -> fmt::Result {
    f.write_str(&field.name)?;
    write_arguments(f, &field.arguments, as_value)?;
    if let Some(alias) = &field.alias {
        f.write_char(FIELD_ALIAS_PREFIX)?;
        f.write_str(alias)?;
    }
    if !field.directives.is_empty() {
        f.write_char(FIELD_DIRECTIVE_OPENING)?;
        for (i, directive) in field.directives.iter().enumerate() {
            if i > 0 {
                f.write_char(FIELD_DIRECTIVE_SEPARATOR)?;
            }
            write!(f, "{}", directive)?;
        }
        f.write_char(FIELD_DIRECTIVE_CLOSING)?;
    }
    Ok(())
}

impl Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        write_arguments(f, &self.arguments, false)
    }
}

impl Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => f.write_str("null"),
            ArgValue::Boolean(b) => write!(f, "{}", b),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::String(s) => write_string(f, s),
            ArgValue::Enum(e) => f.write_str(e),
            ArgValue::List(items) => {
                f.write_char(ARG_VALUE_ARRAY_OPENING)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_char(ARG_VALUE_ARRAY_SEPARATOR)?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_char(ARG_VALUE_ARRAY_CLOSING)
            }
            ArgValue::Object(entries) => {
                f.write_char(ARG_VALUE_OBJECT_OPENING)?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_char(ARG_VALUE_OBJECT_SEPARATOR)?;
                    }
                    write!(f, "{}{}{}", key, ARG_VALUE_OBJECT_KEY_VALUE_SEPARATOR, value)?;
                }
                f.write_char(ARG_VALUE_OBJECT_CLOSING)
            }
            ArgValue::Expression(name) => write!(f, "{}{}{}", EXPRESSION_OPENING, name, EXPRESSION_CLOSING),
            ArgValue::Field(field) => write_field(f, field, true),
        }
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &Arguments, keep_parentheses: bool) -> fmt::Result {
    if arguments.is_empty() && !keep_parentheses {
        return Ok(());
    }
    f.write_char(FIELD_ARGS_OPENING)?;
    for (i, (name, value)) in arguments.iter().enumerate() {
        if i > 0 {
            f.write_char(FIELD_ARGS_SEPARATOR)?;
        }
        write!(f, "{}{}{}", name, FIELD_ARGS_KEY_VALUE_SEPARATOR, value)?;
    }
    f.write_char(FIELD_ARGS_CLOSING)
}

// Plain words go through bare, anything else could collide with a symbol.
fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if is_bare_word(s) {
        return f.write_str(s);
    }
    f.write_char(ARG_VALUE_STRING_QUOTE)?;
    for c in s.chars() {
        if c == ARG_VALUE_STRING_QUOTE || c == ARG_VALUE_STRING_ESCAPE {
            f.write_char(ARG_VALUE_STRING_ESCAPE)?;
        }
        f.write_char(c)?;
    }
    f.write_char(ARG_VALUE_STRING_QUOTE)
}

fn is_bare_word(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !matches!(s, "true" | "false" | "null")
}
