mod builder;
mod field_type;
mod resolver;
mod version;

pub use builder::{SchemaBuilder, SchemaError};
pub use field_type::FieldType;
pub use resolver::{AppContext, ResolverBinding, ResolverFn, ResolverFuture, ResolverInput};
pub use version::SchemaVersion;

use fxhash::FxHashMap;
use indexmap::IndexMap;

/// An in-process schema: type definitions, root operation types and a version
/// token. The engine validates and executes operations against it but never
/// mutates it; replacing the schema means building a new one, which carries a
/// strictly greater version.
#[derive(Debug)]
pub struct Schema {
    version: SchemaVersion,
    query_root: String,
    mutation_root: Option<String>,
    types: FxHashMap<String, TypeDefinition>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.types.get(name) {
            Some(TypeDefinition::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub fn query_root(&self) -> &ObjectType {
        self.object(&self.query_root)
            .expect("validated at build time")
    }

    pub fn mutation_root(&self) -> Option<&ObjectType> {
        self.mutation_root.as_deref().and_then(|name| self.object(name))
    }
}

#[derive(Debug)]
pub enum TypeDefinition {
    Scalar(ScalarType),
    Object(ObjectType),
    Enum(EnumType),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Scalar(scalar) => &scalar.name,
            TypeDefinition::Object(object) => &object.name,
            TypeDefinition::Enum(enumeration) => &enumeration.name,
        }
    }

    /// Composite types require a sub-selection, leaf types forbid one.
    pub fn is_composite(&self) -> bool {
        matches!(self, TypeDefinition::Object(_))
    }
}

#[derive(Debug)]
pub struct ScalarType {
    pub name: String,
}

#[derive(Debug)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug)]
pub struct ObjectType {
    pub name: String,
    fields: IndexMap<String, FieldDefinition>,
}

impl ObjectType {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }
}

#[derive(Debug)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: FieldType,
    pub arguments: Vec<ArgumentDefinition>,
    pub resolver: ResolverBinding,
}

impl FieldDefinition {
    /// A field resolved by reading the same-named property off the parent
    /// value, unless a resolver is attached.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        FieldDefinition {
            name: name.into(),
            ty,
            arguments: Vec::new(),
            resolver: ResolverBinding::Property,
        }
    }

    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.arguments.push(ArgumentDefinition {
            name: name.into(),
            ty,
            default_value: None,
        });
        self
    }

    #[must_use]
    pub fn argument_with_default(
        mut self,
        name: impl Into<String>,
        ty: FieldType,
        default_value: serde_json::Value,
    ) -> Self {
        self.arguments.push(ArgumentDefinition {
            name: name.into(),
            ty,
            default_value: Some(default_value),
        });
        self
    }

    #[must_use]
    pub fn resolve(mut self, resolver: impl ResolverFn + 'static) -> Self {
        self.resolver = ResolverBinding::Resolve(std::sync::Arc::new(resolver));
        self
    }
}

#[derive(Debug)]
pub struct ArgumentDefinition {
    pub name: String,
    pub ty: FieldType,
    pub default_value: Option<serde_json::Value>,
}
