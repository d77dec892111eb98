use std::sync::{Arc, Mutex};

use graphloom::{ErrorCode, GraphqlError, GraphqlResult, LoadRequest, LoaderRegistry};
use graphloom_schema::{FieldDefinition, FieldType, ResolverInput, Schema};

/// Records every batch function invocation as (loader name, batch size), in
/// call order.
#[derive(Clone, Default)]
pub struct BatchLog(Arc<Mutex<Vec<(String, usize)>>>);

impl BatchLog {
    pub fn record(&self, loader: &str, size: usize) {
        self.0.lock().unwrap().push((loader.to_string(), size));
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.0.lock().unwrap().clone()
    }
}

/// Resolver-backed schema covering scalars, nested objects, failures and a
/// mutation that appends to an app-context log.
pub fn query_schema() -> Schema {
    Schema::builder()
        .object(
            "Query",
            [
                FieldDefinition::new("add", FieldType::named("Int").non_null())
                    .argument("x", FieldType::named("Int").non_null())
                    .argument("y", FieldType::named("Int").non_null())
                    .resolve(|input: ResolverInput| async move {
                        let x = input.argument("x").and_then(serde_json::Value::as_i64).unwrap_or_default();
                        let y = input.argument("y").and_then(serde_json::Value::as_i64).unwrap_or_default();
                        Ok(serde_json::json!(x + y))
                    }),
                FieldDefinition::new("boom", FieldType::named("String").non_null()).resolve(
                    |_: ResolverInput| async { Err(GraphqlError::new("boom", ErrorCode::FieldError)) },
                ),
                FieldDefinition::new("wrap", FieldType::named("Wrap"))
                    .resolve(|_: ResolverInput| async { Ok(serde_json::json!({})) }),
                FieldDefinition::new("node", FieldType::named("Node")).resolve(|_: ResolverInput| async {
                    Ok(serde_json::json!({
                        "value": 1,
                        "next": {"value": 2, "next": {"value": 3, "next": null}},
                    }))
                }),
            ],
        )
        .object(
            "Wrap",
            [
                FieldDefinition::new("boom", FieldType::named("String").non_null()).resolve(
                    |_: ResolverInput| async { Err(GraphqlError::new("wrapped boom", ErrorCode::FieldError)) },
                ),
            ],
        )
        .object(
            "Node",
            [
                FieldDefinition::new("value", FieldType::named("Int")),
                FieldDefinition::new("next", FieldType::named("Node")),
            ],
        )
        .object(
            "Mutation",
            [FieldDefinition::new("append", FieldType::list(FieldType::named("String").non_null()).non_null())
                .argument("value", FieldType::named("String").non_null())
                .resolve(|input: ResolverInput| async move {
                    let value = input
                        .argument("value")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let log = input
                        .app
                        .downcast_ref::<Mutex<Vec<String>>>()
                        .ok_or_else(|| GraphqlError::new("missing mutation log", ErrorCode::InternalServerError))?;
                    let mut log = log.lock().unwrap();
                    log.push(value);
                    Ok(serde_json::json!(log.clone()))
                })],
        )
        .mutation_root("Mutation")
        .build()
        .unwrap()
}

/// User graph resolved entirely through loaders: `Query.user` by id and
/// `User.friends` off the parent's id.
pub fn social(cache_results: bool) -> (Schema, LoaderRegistry, BatchLog) {
    let schema = Schema::builder()
        .object(
            "Query",
            [FieldDefinition::new("user", FieldType::named("User")).argument("id", FieldType::named("ID").non_null())],
        )
        .object(
            "User",
            [
                FieldDefinition::new("id", FieldType::named("ID").non_null()),
                FieldDefinition::new("name", FieldType::named("String").non_null()),
                FieldDefinition::new("nickname", FieldType::named("String")),
                FieldDefinition::new("friends", FieldType::list(FieldType::named("User").non_null()).non_null()),
            ],
        )
        .build()
        .unwrap();

    let log = BatchLog::default();
    let mut loaders = LoaderRegistry::default();

    let user_log = log.clone();
    loaders.register("Query", "user", cache_results, move |requests: Vec<LoadRequest>| {
        let log = user_log.clone();
        async move {
            log.record("Query.user", requests.len());
            let results: Vec<GraphqlResult<serde_json::Value>> = requests
                .iter()
                .map(|request| {
                    let id = request.argument("id").and_then(serde_json::Value::as_str).unwrap_or_default();
                    Ok(user_by_id(id))
                })
                .collect();
            Ok(results)
        }
    });

    let friends_log = log.clone();
    loaders.register("User", "friends", cache_results, move |requests: Vec<LoadRequest>| {
        let log = friends_log.clone();
        async move {
            log.record("User.friends", requests.len());
            let results: Vec<GraphqlResult<serde_json::Value>> = requests
                .iter()
                .map(|request| {
                    let id = request.parent.get("id").and_then(serde_json::Value::as_str).unwrap_or_default();
                    let friends: Vec<serde_json::Value> = friend_ids(id).iter().map(|id| user_by_id(id)).collect();
                    Ok(serde_json::Value::Array(friends))
                })
                .collect();
            Ok(results)
        }
    });

    (schema, loaders, log)
}

fn user_by_id(id: &str) -> serde_json::Value {
    match id {
        "1" => serde_json::json!({"id": "1", "name": "Alice"}),
        "2" => serde_json::json!({"id": "2", "name": "Bob"}),
        "3" => serde_json::json!({"id": "3", "name": "Carol"}),
        "4" => serde_json::json!({"id": "4", "name": "Dave"}),
        _ => serde_json::Value::Null,
    }
}

fn friend_ids(id: &str) -> &'static [&'static str] {
    match id {
        "1" => &["2", "3"],
        "2" => &["3"],
        "4" => &["1"],
        _ => &[],
    }
}
