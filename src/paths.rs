//! Flattens an operation's selection tree into field paths.
//!
//! Every path runs from a root field down to one leaf, so the number of paths
//! of an operation equals the number of leaves reachable from its root once
//! every fragment has been inlined. Fragments add no level of their own: their
//! fields are spliced in where the spread appears, gated by a directive that
//! checks the runtime type of the object.

use graphql_parser::query::{
    Directive as AstDirective, Field, FragmentSpread, InlineFragment, Selection, TypeCondition,
};

use crate::arguments::ArgumentConverter;
use crate::config::ConvertorConfig;
use crate::conversion::ConversionError;
use crate::field_query::{ArgValue, Directive, FieldToken};
use crate::request::{Operation, Request};
use crate::symbols::{IMPLEMENTS_FIELD, INCLUDE_DIRECTIVE, IS_TYPE_FIELD, OR_FIELD};

/// One root-to-leaf sequence of fields.
pub type FieldPath = Vec<FieldToken>;

#[derive(Debug, Clone, PartialEq)]
pub struct OperationFieldPaths {
    pub id: String,
    pub paths: Vec<FieldPath>,
}

/// The kinds of node the flattener meets while walking a selection set.
enum FieldNode<'q, 'a> {
    /// A field without subfields.
    Leaf(&'q Field<'a, &'a str>),
    /// A field with subfields, ie: a connection to another object.
    Connection(&'q Field<'a, &'a str>),
    FragmentReference(&'q FragmentSpread<'a, &'a str>),
    InlineFragmentReference(&'q InlineFragment<'a, &'a str>),
}

impl<'q, 'a> FieldNode<'q, 'a> {
    fn classify(selection: &'q Selection<'a, &'a str>) -> Self {
        match selection {
            Selection::Field(field) if field.selection_set.items.is_empty() => FieldNode::Leaf(field),
            Selection::Field(field) => FieldNode::Connection(field),
            Selection::FragmentSpread(spread) => FieldNode::FragmentReference(spread),
            Selection::InlineFragment(inline) => FieldNode::InlineFragmentReference(inline),
        }
    }
}

/// Flattens the selections of one operation, resolving its variables.
pub struct PathFlattener<'r, 'a> {
    request: &'r Request<'a>,
    operation: &'r Operation<'a>,
    arguments: ArgumentConverter<'r, 'a>,
}

impl<'r, 'a> PathFlattener<'r, 'a> {
    pub fn new(request: &'r Request<'a>, operation: &'r Operation<'a>, config: &'r ConvertorConfig) -> Self {
        Self {
            request,
            operation,
            arguments: ArgumentConverter::new(config, request, operation),
        }
    }

    pub fn get_field_paths_from_operation(&self) -> Result<Vec<FieldPath>, ConversionError> {
        let mut paths = Vec::new();
        self.process_and_add_field_paths(&mut paths, &self.operation.selection_set.items, &[], &mut Vec::new())?;
        Ok(paths)
    }

    /// Paths of a field and everything below it. A field without subfields
    /// is a single path holding just that field.
    pub fn get_field_paths_from_query(&self, field: &'r Field<'a, &'a str>) -> Result<Vec<FieldPath>, ConversionError> {
        self.field_paths(field, &mut Vec::new())
    }

    fn field_paths(
        &self,
        field: &'r Field<'a, &'a str>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<Vec<FieldPath>, ConversionError> {
        let query_field_path = vec![self.convert_field(field)?];
        if field.selection_set.items.is_empty() {
            return Ok(vec![query_field_path]);
        }
        let mut paths = Vec::new();
        self.process_and_add_field_paths(&mut paths, &field.selection_set.items, &query_field_path, visiting)?;
        Ok(paths)
    }

    fn process_and_add_field_paths(
        &self,
        paths: &mut Vec<FieldPath>,
        selections: &'r [Selection<'a, &'a str>],
        prefix: &[FieldToken],
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), ConversionError> {
        for selection in selections {
            match FieldNode::classify(selection) {
                FieldNode::Leaf(field) => {
                    paths.push(join(prefix, vec![self.convert_field(field)?]));
                }
                FieldNode::Connection(field) => {
                    let nested = self.field_paths(field, visiting)?;
                    paths.extend(nested.into_iter().map(|path| join(prefix, path)));
                }
                FieldNode::FragmentReference(spread) => {
                    let name = spread.fragment_name;
                    if visiting.contains(&name) {
                        return Err(ConversionError::RecursiveFragment {
                            name: name.to_string(),
                            location: spread.position.into(),
                        });
                    }
                    let fragment = self
                        .request
                        .fragment(name)
                        .ok_or_else(|| ConversionError::UnknownFragment {
                            name: name.to_string(),
                            location: spread.position.into(),
                        })?;
                    let TypeCondition::On(type_name) = &fragment.type_condition;

                    visiting.push(name);
                    let fragment_paths =
                        self.fragment_field_paths(&fragment.selection_set.items, Some(*type_name), &spread.directives, visiting);
                    visiting.pop();
                    paths.extend(fragment_paths?.into_iter().map(|path| join(prefix, path)));
                }
                FieldNode::InlineFragmentReference(inline) => {
                    let type_name = inline.type_condition.as_ref().map(|condition| match condition {
                        TypeCondition::On(type_name) => *type_name,
                    });
                    let fragment_paths =
                        self.fragment_field_paths(&inline.selection_set.items, type_name, &inline.directives, visiting)?;
                    paths.extend(fragment_paths.into_iter().map(|path| join(prefix, path)));
                }
            }
        }
        Ok(())
    }

    // Fragment fields are flattened from an empty prefix, so the fragment root
    // fields head the returned paths and can receive the type guard.
    fn fragment_field_paths(
        &self,
        selections: &'r [Selection<'a, &'a str>],
        type_name: Option<&str>,
        directives: &'r [AstDirective<'a, &'a str>],
        visiting: &mut Vec<&'a str>,
    ) -> Result<Vec<FieldPath>, ConversionError> {
        let mut fragment_paths = Vec::new();
        self.process_and_add_field_paths(&mut fragment_paths, selections, &[], visiting)?;

        if !directives.is_empty() {
            let directives = self.arguments.convert_directives(directives)?;
            for path in &mut fragment_paths {
                if let Some(root) = path.first_mut() {
                    root.prepend_directives(directives.iter().cloned());
                }
            }
        }

        Ok(match type_name {
            Some(type_name) => restrain_fields_by_type_or_interface(fragment_paths, type_name),
            None => fragment_paths,
        })
    }

    fn convert_field(&self, field: &'r Field<'a, &'a str>) -> Result<FieldToken, ConversionError> {
        Ok(FieldToken::new(field.name)
            .with_arguments(self.arguments.convert_arguments(&field.arguments, field.position)?)
            .with_alias(field.alias.map(str::to_string))
            .with_directives(self.arguments.convert_directives(&field.directives)?))
    }
}

/// Gates each path on the runtime object being of the given type or
/// implementing the given interface. The guard goes on the root field only,
/// first among its directives, so a failed check skips the remaining
/// directives and every field below.
pub fn restrain_fields_by_type_or_interface(mut fragment_paths: Vec<FieldPath>, type_name: &str) -> Vec<FieldPath> {
    let guard = type_restriction_guard(type_name);
    for path in &mut fragment_paths {
        if let Some(root) = path.first_mut() {
            root.directives.insert(0, guard.clone());
        }
    }
    fragment_paths
}

/// `include(if:or(values:[isType(type:T),implements(interface:T)]))`
pub fn type_restriction_guard(type_name: &str) -> Directive {
    let is_type = FieldToken::new(IS_TYPE_FIELD)
        .with_arguments(vec![("type".to_string(), ArgValue::String(type_name.to_string()))]);
    let implements = FieldToken::new(IMPLEMENTS_FIELD)
        .with_arguments(vec![("interface".to_string(), ArgValue::String(type_name.to_string()))]);
    let condition = FieldToken::new(OR_FIELD).with_arguments(vec![(
        "values".to_string(),
        ArgValue::List(vec![
            ArgValue::Field(Box::new(is_type)),
            ArgValue::Field(Box::new(implements)),
        ]),
    )]);
    Directive::new(INCLUDE_DIRECTIVE, vec![("if".to_string(), ArgValue::Field(Box::new(condition)))])
}

/// Field paths of every selected operation, keyed by operation in submission
/// order.
pub fn convert_request_to_field_query_paths(
    request: &Request<'_>,
    config: &ConvertorConfig,
) -> Result<Vec<OperationFieldPaths>, ConversionError> {
    let mut operations: Vec<OperationFieldPaths> = Vec::new();
    for operation in request.operations() {
        let paths = PathFlattener::new(request, operation, config).get_field_paths_from_operation()?;
        tracing::debug!(operation = %operation.id, paths = paths.len(), "Flattened operation");
        match operations.iter_mut().find(|o| o.id == operation.id) {
            Some(existing) => existing.paths.extend(paths),
            None => operations.push(OperationFieldPaths {
                id: operation.id.clone(),
                paths,
            }),
        }
    }
    Ok(operations)
}

fn join(prefix: &[FieldToken], path: FieldPath) -> FieldPath {
    prefix.iter().cloned().chain(path).collect()
}
