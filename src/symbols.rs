//! Reserved tokens of the field-query syntax.
//!
//! The separators must stay mutually exclusive and must never be valid inside
//! a field or argument name, since the downstream interpreter splits on them.

/// Joins sibling paths of one operation.
pub const QUERY_FIELDS_SEPARATOR: &str = ",";
/// Joins the tokens of one path, from the root down to the leaf.
pub const RELATIONAL_FIELDS_NEXT_LEVEL: &str = ".";
/// Joins the serialized operations of a document.
pub const OPERATIONS_SEPARATOR: &str = ";";

pub const FIELD_ARGS_OPENING: char = '(';
pub const FIELD_ARGS_CLOSING: char = ')';
pub const FIELD_ARGS_SEPARATOR: char = ',';
pub const FIELD_ARGS_KEY_VALUE_SEPARATOR: char = ':';

pub const ARG_VALUE_ARRAY_OPENING: char = '[';
pub const ARG_VALUE_ARRAY_CLOSING: char = ']';
pub const ARG_VALUE_ARRAY_SEPARATOR: char = ',';

pub const ARG_VALUE_OBJECT_OPENING: char = '{';
pub const ARG_VALUE_OBJECT_CLOSING: char = '}';
pub const ARG_VALUE_OBJECT_SEPARATOR: char = ',';
pub const ARG_VALUE_OBJECT_KEY_VALUE_SEPARATOR: char = ':';

pub const ARG_VALUE_STRING_QUOTE: char = '"';
pub const ARG_VALUE_STRING_ESCAPE: char = '\\';

pub const FIELD_ALIAS_PREFIX: char = '@';

pub const FIELD_DIRECTIVE_OPENING: char = '<';
pub const FIELD_DIRECTIVE_CLOSING: char = '>';
pub const FIELD_DIRECTIVE_SEPARATOR: char = '|';

pub const EXPRESSION_OPENING: &str = "%{";
pub const EXPRESSION_CLOSING: &str = "}%";

/// Variables whose name starts with this prefix may be resolved at execution
/// time instead of conversion time.
pub const VARIABLE_AS_EXPRESSION_NAME_PREFIX: &str = "_";

/// Delimiters of a field reference embedded inside a string literal.
pub const EMBEDDABLE_FIELD_PREFIX: &str = "{{";
pub const EMBEDDABLE_FIELD_SUFFIX: &str = "}}";

/// Operation name that clients able to submit only one operation name use to
/// request every other operation of the document.
pub const QUERY_BATCHING_OPERATION_NAME: &str = "__ALL";

/// Field returning the current object unchanged.
pub const SELF_FIELD: &str = "self";

pub const INCLUDE_DIRECTIVE: &str = "include";
pub const OR_FIELD: &str = "or";
pub const IS_TYPE_FIELD: &str = "isType";
pub const IMPLEMENTS_FIELD: &str = "implements";
pub const SPRINTF_FIELD: &str = "sprintf";
pub const SPRINTF_PLACEHOLDER: &str = "%s";
