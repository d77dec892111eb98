use async_graphql_parser::{
    types::{Field, OperationType, Selection, SelectionSet},
    Pos, Positioned,
};
use async_graphql_value::Value;
use fxhash::FxHashSet;
use graphloom_schema::{ObjectType, Schema, TypeDefinition};
use indexmap::IndexMap;

use crate::{Error, ParsedOperation};

/// Validates the selected operation against the schema. All errors are
/// collected; the caller decides whether any of them is fatal (they all are).
pub(crate) fn validate(schema: &Schema, operation: &ParsedOperation) -> Result<(), Vec<Error>> {
    let definition = operation.definition();

    let root = match operation.ty {
        OperationType::Query => Some(schema.query_root()),
        OperationType::Mutation => {
            if schema.mutation_root().is_none() {
                return Err(vec![Error::validation("The schema does not define mutations.").at(definition.pos)]);
            }
            schema.mutation_root()
        }
        OperationType::Subscription => {
            return Err(vec![
                Error::validation("Subscription operations are not supported.").at(definition.pos)
            ]);
        }
    };

    let declared_variables = definition
        .node
        .variable_definitions
        .iter()
        .map(|definition| definition.node.name.node.to_string())
        .collect();

    let mut ctx = ValidationContext {
        schema,
        operation,
        declared_variables,
        fragment_stack: Vec::new(),
        errors: Vec::new(),
    };

    if let Some(root) = root {
        ctx.validate_selection_set(root, &definition.node.selection_set);
        if ctx.errors.is_empty() {
            // Merge rules assume every field and fragment resolved cleanly,
            // so this only runs on documents the main pass accepted.
            ctx.check_field_merging(root, vec![&definition.node.selection_set.node]);
        }
    }

    if ctx.errors.is_empty() {
        Ok(())
    } else {
        Err(ctx.errors)
    }
}

struct ValidationContext<'a> {
    schema: &'a Schema,
    operation: &'a ParsedOperation,
    declared_variables: FxHashSet<String>,
    fragment_stack: Vec<String>,
    errors: Vec<Error>,
}

/// One response key at one level: the first field occurrence and every
/// selection set that contributes subfields to it, fragments expanded.
struct MergeGroup<'doc> {
    field: &'doc Positioned<Field>,
    selection_sets: Vec<&'doc SelectionSet>,
}

impl<'a> ValidationContext<'a> {
    fn validate_selection_set(&mut self, parent: &ObjectType, selection_set: &Positioned<SelectionSet>) {
        for item in &selection_set.node.items {
            match &item.node {
                Selection::Field(field) => {
                    let name = field.node.name.node.as_str();
                    let has_selection = !field.node.selection_set.node.items.is_empty();

                    if name == "__typename" {
                        if has_selection {
                            self.errors.push(
                                Error::validation("Field '__typename' must not have a selection of subfields.")
                                    .at(field.pos),
                            );
                        }
                        continue;
                    }

                    let Some(definition) = parent.field(name) else {
                        self.errors.push(
                            Error::validation(format!("Unknown field '{name}' on type '{}'.", parent.name))
                                .at(field.pos),
                        );
                        continue;
                    };

                    for (argument_name, value) in &field.node.arguments {
                        if !definition
                            .arguments
                            .iter()
                            .any(|argument| argument.name == argument_name.node.as_str())
                        {
                            self.errors.push(
                                Error::validation(format!(
                                    "Unknown argument '{}' on field '{}.{name}'.",
                                    argument_name.node, parent.name
                                ))
                                .at(argument_name.pos),
                            );
                        }
                        self.check_variable_usage(&value.node, value.pos);
                    }

                    for argument in &definition.arguments {
                        let provided = field
                            .node
                            .arguments
                            .iter()
                            .any(|(argument_name, _)| argument_name.node.as_str() == argument.name);
                        if !provided && !argument.ty.is_nullable() && argument.default_value.is_none() {
                            self.errors.push(
                                Error::validation(format!(
                                    "Missing required argument '{}' on field '{}.{name}'.",
                                    argument.name, parent.name
                                ))
                                .at(field.pos),
                            );
                        }
                    }

                    match self.schema.type_definition(definition.ty.named_type()) {
                        Some(ty) if ty.is_composite() => {
                            if !has_selection {
                                self.errors.push(
                                    Error::validation(format!(
                                        "Field '{name}' of type '{}' must have a selection of subfields.",
                                        definition.ty
                                    ))
                                    .at(field.pos),
                                );
                            } else if let TypeDefinition::Object(object) = ty {
                                self.validate_selection_set(object, &field.node.selection_set);
                            }
                        }
                        _ => {
                            if has_selection {
                                self.errors.push(
                                    Error::validation(format!(
                                        "Field '{name}' of type '{}' must not have a selection of subfields.",
                                        definition.ty
                                    ))
                                    .at(field.pos),
                                );
                            }
                        }
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    let fragment = self
                        .operation
                        .fragments()
                        .iter()
                        .find_map(|(key, fragment)| (key.as_str() == name).then_some(fragment));
                    let Some(fragment) = fragment else {
                        self.errors
                            .push(Error::validation(format!("Unknown fragment '{name}'.")).at(spread.pos));
                        continue;
                    };
                    if self.fragment_stack.iter().any(|frame| frame == name) {
                        self.errors.push(
                            Error::validation(format!("Fragment '{name}' cannot be spread within itself."))
                                .at(spread.pos),
                        );
                        continue;
                    }

                    let condition = fragment.node.type_condition.node.on.node.as_str();
                    if let Some(target) = self.spread_target(parent, Some(condition), spread.pos) {
                        self.fragment_stack.push(name.to_string());
                        // Split the borrow: target lives in the schema, not in self.
                        let target = self.schema.object(&target).expect("checked by spread_target");
                        self.validate_selection_set(target, &fragment.node.selection_set);
                        self.fragment_stack.pop();
                    }
                }
                Selection::InlineFragment(inline) => {
                    let condition = inline
                        .node
                        .type_condition
                        .as_ref()
                        .map(|condition| condition.node.on.node.as_str());
                    if let Some(target) = self.spread_target(parent, condition, inline.pos) {
                        let target = self.schema.object(&target).expect("checked by spread_target");
                        self.validate_selection_set(target, &inline.node.selection_set);
                    }
                }
            }
        }
    }

    /// Without abstract types, a fragment only ever applies to its exact type
    /// condition, so anything else is an impossible spread.
    fn spread_target(&mut self, parent: &ObjectType, condition: Option<&str>, pos: Pos) -> Option<String> {
        let Some(condition) = condition else {
            return Some(parent.name.clone());
        };
        if self.schema.object(condition).is_none() {
            self.errors
                .push(Error::validation(format!("Unknown type '{condition}' in fragment condition.")).at(pos));
            return None;
        }
        if condition != parent.name {
            self.errors.push(
                Error::validation(format!(
                    "Fragment on type '{condition}' can never apply within '{}'.",
                    parent.name
                ))
                .at(pos),
            );
            return None;
        }
        Some(condition.to_string())
    }

    /// Fields sharing a response key at one level merge into a single output
    /// field, so they must select the same field with the same arguments.
    /// Checked recursively: merging two selections of the same key merges
    /// their subselections too.
    fn check_field_merging(&mut self, parent: &ObjectType, sets: Vec<&'a SelectionSet>) {
        let mut groups: IndexMap<&'a str, MergeGroup<'a>> = IndexMap::new();
        for set in sets {
            self.collect_for_merging(parent, set, &mut groups);
        }

        for group in groups.into_values() {
            if group.selection_sets.is_empty() {
                continue;
            }
            let name = group.field.node.name.node.as_str();
            let Some(definition) = parent.field(name) else {
                continue;
            };
            let schema = self.schema;
            if let Some(child) = schema.object(definition.ty.named_type()) {
                self.check_field_merging(child, group.selection_sets);
            }
        }
    }

    fn collect_for_merging(
        &mut self,
        parent: &ObjectType,
        set: &'a SelectionSet,
        groups: &mut IndexMap<&'a str, MergeGroup<'a>>,
    ) {
        for item in &set.items {
            match &item.node {
                Selection::Field(field) => {
                    let key = field.node.response_key().node.as_str();
                    let subselection = &field.node.selection_set.node;
                    match groups.get_mut(key) {
                        Some(group) => {
                            let first = &group.field.node;
                            if first.name.node != field.node.name.node {
                                self.errors.push(
                                    Error::validation(format!(
                                        "Fields '{}' and '{}' cannot be merged under response key '{key}'.",
                                        first.name.node, field.node.name.node
                                    ))
                                    .at(field.pos),
                                );
                            } else if !arguments_agree(first, &field.node) {
                                self.errors.push(
                                    Error::validation(format!(
                                        "Field '{}' under response key '{key}' is selected with conflicting arguments.",
                                        field.node.name.node
                                    ))
                                    .at(field.pos),
                                );
                            }
                            if !subselection.items.is_empty() {
                                group.selection_sets.push(subselection);
                            }
                        }
                        None => {
                            let mut selection_sets = Vec::new();
                            if !subselection.items.is_empty() {
                                selection_sets.push(subselection);
                            }
                            groups.insert(key, MergeGroup { field, selection_sets });
                        }
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = self
                        .operation
                        .fragments()
                        .iter()
                        .find_map(|(key, fragment)| {
                            (key.as_str() == spread.node.fragment_name.node.as_str()).then_some(fragment)
                        });
                    if let Some(fragment) = fragment {
                        if fragment.node.type_condition.node.on.node.as_str() == parent.name {
                            self.collect_for_merging(parent, &fragment.node.selection_set.node, groups);
                        }
                    }
                }
                Selection::InlineFragment(inline) => {
                    let applies = inline
                        .node
                        .type_condition
                        .as_ref()
                        .map(|condition| condition.node.on.node.as_str() == parent.name)
                        .unwrap_or(true);
                    if applies {
                        self.collect_for_merging(parent, &inline.node.selection_set.node, groups);
                    }
                }
            }
        }
    }

    fn check_variable_usage(&mut self, value: &Value, pos: Pos) {
        match value {
            Value::Variable(name) => {
                if !self.declared_variables.contains(name.as_str()) {
                    self.errors
                        .push(Error::validation(format!("Variable '${name}' is not defined.")).at(pos));
                }
            }
            Value::List(items) => {
                for item in items {
                    self.check_variable_usage(item, pos);
                }
            }
            Value::Object(fields) => {
                for item in fields.values() {
                    self.check_variable_usage(item, pos);
                }
            }
            _ => (),
        }
    }
}

/// Same argument names bound to the same values, order irrelevant.
fn arguments_agree(a: &Field, b: &Field) -> bool {
    a.arguments.len() == b.arguments.len()
        && a.arguments.iter().all(|(name, value)| {
            b.arguments
                .iter()
                .any(|(other_name, other_value)| other_name.node == name.node && other_value.node == value.node)
        })
}
