use fxhash::FxHashMap;
use indexmap::IndexMap;

use crate::{
    EnumType, FieldDefinition, ObjectType, ScalarType, Schema, SchemaVersion, TypeDefinition,
};

pub const BUILT_IN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("type '{name}' is defined twice")]
    DuplicateType { name: String },
    #[error("'{referenced_by}' references unknown type '{name}'")]
    UnknownType { name: String, referenced_by: String },
    #[error("root type '{name}' is not an object type")]
    InvalidRootType { name: String },
}

pub struct SchemaBuilder {
    query_root: String,
    mutation_root: Option<String>,
    types: FxHashMap<String, TypeDefinition>,
    duplicate: Option<String>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        let mut types = FxHashMap::default();
        for name in BUILT_IN_SCALARS {
            types.insert(
                name.to_string(),
                TypeDefinition::Scalar(ScalarType {
                    name: name.to_string(),
                }),
            );
        }
        SchemaBuilder {
            query_root: "Query".to_string(),
            mutation_root: None,
            types,
            duplicate: None,
        }
    }
}

impl SchemaBuilder {
    #[must_use]
    pub fn query_root(mut self, name: impl Into<String>) -> Self {
        self.query_root = name.into();
        self
    }

    #[must_use]
    pub fn mutation_root(mut self, name: impl Into<String>) -> Self {
        self.mutation_root = Some(name.into());
        self
    }

    #[must_use]
    pub fn scalar(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.insert(name.clone(), TypeDefinition::Scalar(ScalarType { name }));
        self
    }

    #[must_use]
    pub fn enumeration(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let name = name.into();
        self.insert(
            name.clone(),
            TypeDefinition::Enum(EnumType {
                name,
                values: values.into_iter().map(Into::into).collect(),
            }),
        );
        self
    }

    #[must_use]
    pub fn object(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDefinition>,
    ) -> Self {
        let name = name.into();
        let fields: IndexMap<String, FieldDefinition> = fields
            .into_iter()
            .map(|field| (field.name.clone(), field))
            .collect();
        self.insert(
            name.clone(),
            TypeDefinition::Object(ObjectType { name, fields }),
        );
        self
    }

    fn insert(&mut self, name: String, definition: TypeDefinition) {
        // Redefining a built-in scalar is tolerated, anything else is an error
        // reported at build time.
        if self.types.contains_key(&name) && !BUILT_IN_SCALARS.contains(&name.as_str()) {
            self.duplicate.get_or_insert(name.clone());
        }
        self.types.insert(name, definition);
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        if let Some(name) = self.duplicate {
            return Err(SchemaError::DuplicateType { name });
        }

        for root in std::iter::once(&self.query_root).chain(self.mutation_root.as_ref()) {
            match self.types.get(root) {
                Some(TypeDefinition::Object(_)) => (),
                Some(_) => {
                    return Err(SchemaError::InvalidRootType { name: root.clone() });
                }
                None => {
                    return Err(SchemaError::UnknownType {
                        name: root.clone(),
                        referenced_by: "schema roots".to_string(),
                    });
                }
            }
        }

        for definition in self.types.values() {
            let TypeDefinition::Object(object) = definition else {
                continue;
            };
            for field in object.fields() {
                let check = |referenced: &str, site: String| {
                    if self.types.contains_key(referenced) {
                        Ok(())
                    } else {
                        Err(SchemaError::UnknownType {
                            name: referenced.to_string(),
                            referenced_by: site,
                        })
                    }
                };
                check(field.ty.named_type(), format!("{}.{}", object.name, field.name))?;
                for argument in &field.arguments {
                    check(
                        argument.ty.named_type(),
                        format!("{}.{}({}:)", object.name, field.name, argument.name),
                    )?;
                }
            }
        }

        Ok(Schema {
            version: SchemaVersion::next(),
            query_root: self.query_root,
            mutation_root: self.mutation_root,
            types: self.types,
        })
    }
}
