use std::sync::Arc;

use async_graphql_parser::{
    types::{Field, Selection, SelectionSet},
    Positioned,
};
use async_graphql_value::{ConstValue, Value};
use graphloom_error::{ErrorCode, GraphqlError, Location};
use graphloom_operation::{OperationType, ParsedOperation};
use graphloom_schema::{FieldType, ObjectType, ResolverBinding, ResolverFn, Schema};
use indexmap::IndexMap;

use crate::loader::{LoaderDefinition, LoaderRegistry};

/// An operation lowered into a flat field arena: fragments expanded,
/// duplicate response keys merged, every field bound to the way it obtains
/// its value. Executing one of these never consults the document again.
pub(crate) struct CompiledOperation {
    pub ty: OperationType,
    pub root: Vec<FieldId>,
    fields: Vec<CompiledField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldId(usize);

impl CompiledOperation {
    pub fn field(&self, id: FieldId) -> &CompiledField {
        &self.fields[id.0]
    }
}

pub(crate) struct CompiledField {
    pub response_key: String,
    pub ty: FieldType,
    pub binding: FieldBinding,
    pub arguments: Vec<CompiledArgument>,
    pub selection: Vec<FieldId>,
    pub location: Location,
}

pub(crate) enum FieldBinding {
    Typename { type_name: String },
    Property { name: String },
    Resolver(Arc<dyn ResolverFn>),
    Loader(Arc<LoaderDefinition>),
}

pub(crate) struct CompiledArgument {
    pub name: String,
    pub value: ArgumentValue,
}

pub(crate) enum ArgumentValue {
    /// Literal or schema default, fixed at compile time.
    Const(ConstValue),
    /// Contains variable references, substituted per request.
    Template(Value),
}

pub(crate) fn compile(
    schema: &Schema,
    loaders: &LoaderRegistry,
    operation: &ParsedOperation,
) -> Result<CompiledOperation, GraphqlError> {
    let definition = &operation.definition().node;
    let root_type = match definition.ty {
        OperationType::Query => schema.query_root(),
        OperationType::Mutation => schema.mutation_root().ok_or_else(|| {
            GraphqlError::new(
                "Schema does not define a mutation root.",
                ErrorCode::OperationValidationError,
            )
        })?,
        OperationType::Subscription => {
            return Err(GraphqlError::new(
                "Subscription operations are not supported.",
                ErrorCode::OperationValidationError,
            ))
        }
    };

    let mut lowering = Lowering {
        schema,
        loaders,
        operation,
        fields: Vec::new(),
    };
    let root = lowering.lower_selection_sets(root_type, vec![&definition.selection_set.node])?;
    Ok(CompiledOperation {
        ty: definition.ty,
        root,
        fields: lowering.fields,
    })
}

struct Lowering<'a> {
    schema: &'a Schema,
    loaders: &'a LoaderRegistry,
    operation: &'a ParsedOperation,
    fields: Vec<CompiledField>,
}

/// One response key at one level, with every selection set that contributes
/// to it. Merging happens here so `{ user { a } user { b } }` compiles to a
/// single field selecting both.
struct PendingField<'a> {
    field: &'a Positioned<Field>,
    selection_sets: Vec<&'a SelectionSet>,
}

impl<'a> Lowering<'a> {
    fn lower_selection_sets(
        &mut self,
        parent: &ObjectType,
        sets: Vec<&'a SelectionSet>,
    ) -> Result<Vec<FieldId>, GraphqlError> {
        let mut pending: IndexMap<&'a str, PendingField<'a>> = IndexMap::new();
        for set in sets {
            self.collect(parent, set, &mut pending)?;
        }

        let mut out = Vec::with_capacity(pending.len());
        for (response_key, entry) in pending {
            out.push(self.lower_field(parent, response_key, entry)?);
        }
        Ok(out)
    }

    fn collect(
        &self,
        parent: &ObjectType,
        set: &'a SelectionSet,
        pending: &mut IndexMap<&'a str, PendingField<'a>>,
    ) -> Result<(), GraphqlError> {
        for selection in &set.items {
            match &selection.node {
                Selection::Field(field) => {
                    let key = field.node.response_key().node.as_str();
                    let subselection = &field.node.selection_set.node;
                    match pending.get_mut(key) {
                        Some(existing) => {
                            if !subselection.items.is_empty() {
                                existing.selection_sets.push(subselection);
                            }
                        }
                        None => {
                            let mut selection_sets = Vec::new();
                            if !subselection.items.is_empty() {
                                selection_sets.push(subselection);
                            }
                            pending.insert(key, PendingField { field, selection_sets });
                        }
                    }
                }
                Selection::FragmentSpread(spread) => {
                    // Validation already resolved every spread.
                    let fragment = self
                        .operation
                        .fragments()
                        .get(&spread.node.fragment_name.node)
                        .ok_or_else(GraphqlError::internal_server_error)?;
                    if fragment.node.type_condition.node.on.node.as_str() == parent.name {
                        self.collect(parent, &fragment.node.selection_set.node, pending)?;
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
                        self.collect(parent, &inline.node.selection_set.node, pending)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn lower_field(
        &mut self,
        parent: &ObjectType,
        response_key: &str,
        entry: PendingField<'a>,
    ) -> Result<FieldId, GraphqlError> {
        let field = &entry.field.node;
        let location = Location::new(entry.field.pos.line as u32, entry.field.pos.column as u32);
        let name = field.name.node.as_str();

        if name == "__typename" {
            return Ok(self.push(CompiledField {
                response_key: response_key.to_string(),
                ty: FieldType::named("String").non_null(),
                binding: FieldBinding::Typename {
                    type_name: parent.name.clone(),
                },
                arguments: Vec::new(),
                selection: Vec::new(),
                location,
            }));
        }

        let definition = parent
            .field(name)
            .ok_or_else(GraphqlError::internal_server_error)?;

        let mut arguments: Vec<CompiledArgument> = field
            .arguments
            .iter()
            .map(|(arg_name, value)| CompiledArgument {
                name: arg_name.node.to_string(),
                value: match value.node.clone().into_const() {
                    Some(value) => ArgumentValue::Const(value),
                    None => ArgumentValue::Template(value.node.clone()),
                },
            })
            .collect();
        for argument in &definition.arguments {
            if let Some(default) = &argument.default_value {
                if !arguments.iter().any(|existing| existing.name == argument.name) {
                    arguments.push(CompiledArgument {
                        name: argument.name.clone(),
                        value: ArgumentValue::Const(
                            ConstValue::from_json(default.clone()).unwrap_or(ConstValue::Null),
                        ),
                    });
                }
            }
        }

        let binding = match self.loaders.get(&parent.name, name) {
            Some(loader) => FieldBinding::Loader(loader.clone()),
            None => match &definition.resolver {
                ResolverBinding::Property => FieldBinding::Property {
                    name: definition.name.clone(),
                },
                ResolverBinding::Resolve(resolver) => FieldBinding::Resolver(resolver.clone()),
            },
        };

        let selection = if entry.selection_sets.is_empty() {
            Vec::new()
        } else {
            let child = self
                .schema
                .object(definition.ty.named_type())
                .ok_or_else(GraphqlError::internal_server_error)?;
            self.lower_selection_sets(child, entry.selection_sets)?
        };

        Ok(self.push(CompiledField {
            response_key: response_key.to_string(),
            ty: definition.ty.clone(),
            binding,
            arguments,
            selection,
            location,
        }))
    }

    fn push(&mut self, field: CompiledField) -> FieldId {
        self.fields.push(field);
        FieldId(self.fields.len() - 1)
    }
}
