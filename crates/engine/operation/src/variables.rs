use async_graphql_value::ConstValue;
use fxhash::FxHashMap;
use graphloom_schema::Schema;

use crate::{Error, ParsedOperation, RawVariables};

/// Variables bound against the selected operation's declarations: defaults
/// applied, required ones enforced, values shallowly type-checked. Variables
/// provided but not declared are ignored.
#[derive(Debug, Default)]
pub struct Variables(FxHashMap<String, ConstValue>);

impl Variables {
    pub fn get(&self, name: &str) -> Option<&ConstValue> {
        self.0.get(name)
    }

    pub fn bind(schema: &Schema, operation: &ParsedOperation, raw: RawVariables) -> Result<Variables, Vec<Error>> {
        let mut raw: std::collections::BTreeMap<_, _> = raw.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut bound = FxHashMap::default();
        let mut errors = Vec::new();

        for definition in &operation.definition().node.variable_definitions {
            let definition = &definition.node;
            let name = definition.name.node.as_str();
            let declared_type = &definition.var_type.node;

            let value = match raw.remove(name) {
                Some(value) => match ConstValue::from_json(value) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        errors.push(
                            Error::variable(format!("Variable '${name}' has an invalid value: {err}"))
                                .at(definition.name.pos),
                        );
                        continue;
                    }
                },
                None => definition.default_value.as_ref().map(|default| default.node.clone()),
            };

            match value {
                Some(ConstValue::Null) | None if !declared_type.nullable => {
                    errors.push(
                        Error::variable(format!(
                            "Variable '${name}' of required type '{declared_type}' was not provided."
                        ))
                        .at(definition.name.pos),
                    );
                }
                Some(value) => {
                    if let Err(detail) = check_scalar_value(schema, &declared_type.base, &value) {
                        errors.push(
                            Error::variable(format!("Variable '${name}' of type '{declared_type}' {detail}"))
                                .at(definition.name.pos),
                        );
                    } else {
                        bound.insert(name.to_string(), value);
                    }
                }
                None => (),
            }
        }

        if errors.is_empty() {
            Ok(Variables(bound))
        } else {
            Err(errors)
        }
    }
}

/// Shallow check of a variable value against the declared scalar/enum type.
/// List wrapping and unknown named types are accepted as-is; resolvers see
/// plain JSON either way.
fn check_scalar_value(
    schema: &Schema,
    base: &async_graphql_parser::types::BaseType,
    value: &ConstValue,
) -> Result<(), String> {
    use async_graphql_parser::types::BaseType;

    if matches!(value, ConstValue::Null) {
        return Ok(());
    }

    match base {
        BaseType::List(inner) => match value {
            ConstValue::List(items) => {
                for item in items {
                    check_scalar_value(schema, &inner.base, item)?;
                }
                Ok(())
            }
            // A single value coerces to a one-element list.
            _ => check_scalar_value(schema, &inner.base, value),
        },
        BaseType::Named(name) => {
            let ok = match name.as_str() {
                "Int" => matches!(value, ConstValue::Number(n) if n.is_i64() || n.is_u64()),
                "Float" => matches!(value, ConstValue::Number(_)),
                "String" => matches!(value, ConstValue::String(_)),
                "Boolean" => matches!(value, ConstValue::Boolean(_)),
                "ID" => matches!(value, ConstValue::String(_)) || matches!(value, ConstValue::Number(_)),
                name => match schema.type_definition(name) {
                    Some(graphloom_schema::TypeDefinition::Enum(enumeration)) => match value {
                        ConstValue::Enum(v) => enumeration.values.iter().any(|candidate| candidate == v.as_str()),
                        ConstValue::String(v) => enumeration.values.iter().any(|candidate| candidate == v),
                        _ => false,
                    },
                    // Custom scalars and anything unknown pass through.
                    _ => true,
                },
            };
            if ok {
                Ok(())
            } else {
                Err(format!("received an incompatible value: {value}"))
            }
        }
    }
}
