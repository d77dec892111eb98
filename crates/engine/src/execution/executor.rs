use std::{collections::VecDeque, sync::Arc};

use async_graphql_value::{ConstValue, Name};
use fxhash::FxHashMap;
use graphloom_error::{ErrorCode, ErrorPath, GraphqlError, GraphqlResult, Location};
use graphloom_operation::{OperationType, Variables};
use graphloom_schema::{AppContext, FieldType, ResolverInput};

use crate::{
    execution::collector::BatchCollector,
    loader::LoadRequest,
    prepare::{ArgumentValue, CompiledArgument, CompiledField, CompiledOperation, FieldBinding, FieldId, PreparedOperation},
    response::{Origin, Response, ResponseData, ResponseValue, SlotId},
};

/// One field occurrence to resolve: the plan node, the parent value it runs
/// against, the response slot reserved for it and the path leading there.
pub(crate) struct FieldTask {
    field: FieldId,
    parent: Arc<serde_json::Value>,
    slot: SlotId,
    path: ErrorPath,
}

pub(crate) async fn execute(prepared: &PreparedOperation, app: AppContext) -> Response {
    let mut executor = Executor {
        compiled: &prepared.compiled,
        variables: &prepared.variables,
        app,
        data: ResponseData::new(),
        errors: Vec::new(),
        queue: VecDeque::new(),
        collector: BatchCollector::new(),
        load_caches: FxHashMap::default(),
    };

    let root_value = Arc::new(serde_json::Value::Object(serde_json::Map::new()));
    match prepared.compiled.ty {
        OperationType::Query => {
            executor.seed_root(&prepared.compiled.root, &root_value);
            executor.run().await;
        }
        OperationType::Mutation => {
            // Root mutation fields run serially, each drained to completion
            // before the next starts.
            for &field in &prepared.compiled.root {
                executor.seed_root(&[field], &root_value);
                executor.run().await;
            }
        }
        OperationType::Subscription => {
            return Response::request_error([GraphqlError::new(
                "Subscription operations are not supported.",
                ErrorCode::OperationValidationError,
            )]);
        }
    }

    Response::Executed {
        data: executor.data,
        errors: executor.errors,
    }
}

struct Executor<'exec> {
    compiled: &'exec CompiledOperation,
    variables: &'exec Variables,
    app: AppContext,
    data: ResponseData,
    errors: Vec<GraphqlError>,
    queue: VecDeque<FieldTask>,
    collector: BatchCollector,
    /// Per-operation memo for loaders that opted into result caching, keyed
    /// by loader name then by canonical (parent, arguments) JSON.
    load_caches: FxHashMap<String, FxHashMap<String, GraphqlResult<serde_json::Value>>>,
}

impl<'exec> Executor<'exec> {
    fn field(&self, id: FieldId) -> &'exec CompiledField {
        self.compiled.field(id)
    }

    fn seed_root(&mut self, fields: &[FieldId], root_value: &Arc<serde_json::Value>) {
        let root = self.data.root();
        for &id in fields {
            let field = self.field(id);
            let slot = self.data.push_field(root, field.response_key.clone());
            self.queue.push_back(FieldTask {
                field: id,
                parent: root_value.clone(),
                slot,
                path: ErrorPath::default().with_field(field.response_key.as_str()),
            });
        }
    }

    /// Turn loop: drain the task queue, then flush every batch collected
    /// during the turn. Loads enqueue follow-up tasks for the next turn, so
    /// each dependency level costs one flush.
    async fn run(&mut self) {
        loop {
            while let Some(task) = self.queue.pop_front() {
                self.resolve(task).await;
            }
            if self.collector.is_empty() {
                break;
            }
            self.flush_batches().await;
        }
    }

    async fn resolve(&mut self, task: FieldTask) {
        let field = self.field(task.field);
        match &field.binding {
            FieldBinding::Typename { type_name } => {
                self.data
                    .set(task.slot, ResponseValue::Leaf(serde_json::Value::String(type_name.clone())));
            }
            FieldBinding::Property { name } => {
                let value = task.parent.get(name).cloned().unwrap_or(serde_json::Value::Null);
                self.write(task, value);
            }
            FieldBinding::Resolver(resolver) => {
                let arguments = match self.evaluate_arguments(&field.arguments) {
                    Ok(arguments) => arguments,
                    Err(err) => return self.fail(task, err),
                };
                let input = ResolverInput {
                    parent: task.parent.clone(),
                    arguments,
                    app: self.app.clone(),
                };
                match resolver.resolve(input).await {
                    Ok(value) => self.write(task, value),
                    Err(err) => self.fail(task, err),
                }
            }
            FieldBinding::Loader(loader) => {
                let arguments = match self.evaluate_arguments(&field.arguments) {
                    Ok(arguments) => arguments,
                    Err(err) => return self.fail(task, err),
                };
                let request = LoadRequest {
                    parent: task.parent.clone(),
                    arguments,
                };
                let cache_key = loader.cache_results.then(|| load_cache_key(&request));
                if let Some(key) = &cache_key {
                    let hit = self
                        .load_caches
                        .get(loader.name())
                        .and_then(|cache| cache.get(key))
                        .cloned();
                    if let Some(result) = hit {
                        return match result {
                            Ok(value) => self.write(task, value),
                            Err(err) => self.fail(task, err),
                        };
                    }
                }
                self.collector.submit(loader.clone(), request, cache_key, task);
            }
        }
    }

    async fn flush_batches(&mut self) {
        for batch in self.collector.drain() {
            let loader = batch.loader;
            let size = batch.entries.len();
            tracing::debug!(loader = loader.name(), size, "flushing loader batch");

            let requests: Vec<LoadRequest> = batch.entries.iter().map(|entry| entry.request.clone()).collect();
            match loader.batch.load(requests).await {
                Ok(results) if results.len() == size => {
                    for (entry, result) in batch.entries.into_iter().zip(results) {
                        if let Some(key) = entry.cache_key {
                            self.load_caches
                                .entry(loader.name().to_string())
                                .or_default()
                                .insert(key, result.clone());
                        }
                        self.complete(entry.tasks, result);
                    }
                }
                Ok(results) => {
                    let error = GraphqlError::loader_contract_violation(
                        loader.name(),
                        format!("expected {size} results, received {}", results.len()),
                    );
                    tracing::error!(loader = loader.name(), "loader returned a mismatched result count");
                    for entry in batch.entries {
                        self.complete(entry.tasks, Err(error.clone()));
                    }
                }
                Err(error) => {
                    for entry in batch.entries {
                        self.complete(entry.tasks, Err(error.clone()));
                    }
                }
            }
        }
    }

    fn complete(&mut self, tasks: Vec<FieldTask>, result: GraphqlResult<serde_json::Value>) {
        for task in tasks {
            match result.clone() {
                Ok(value) => self.write(task, value),
                Err(err) => self.fail(task, err),
            }
        }
    }

    fn write(&mut self, task: FieldTask, value: serde_json::Value) {
        let field = self.field(task.field);
        let FieldTask { slot, path, .. } = task;
        self.write_value(field, &field.ty, slot, path, value);
    }

    /// Places a resolved JSON value into the response, recursing through
    /// list wrappers. Composite values spawn tasks for their sub-selection.
    fn write_value(
        &mut self,
        field: &'exec CompiledField,
        ty: &'exec FieldType,
        slot: SlotId,
        path: ErrorPath,
        value: serde_json::Value,
    ) {
        match ty {
            FieldType::Named { nullable, .. } => {
                if value.is_null() {
                    if *nullable {
                        self.data.set(slot, ResponseValue::Null);
                    } else {
                        self.fail_at(
                            slot,
                            false,
                            path,
                            field.location,
                            GraphqlError::new(
                                format!("Cannot return null for non-nullable field '{}'.", field.response_key),
                                ErrorCode::FieldError,
                            ),
                        );
                    }
                    return;
                }

                if field.selection.is_empty() {
                    // Leaf: the resolver's JSON passes through as-is.
                    self.data.set(slot, ResponseValue::Leaf(value));
                    return;
                }

                let serde_json::Value::Object(_) = &value else {
                    self.fail_at(
                        slot,
                        *nullable,
                        path,
                        field.location,
                        GraphqlError::new(
                            format!("Field '{}' resolved to a non-object value.", field.response_key),
                            ErrorCode::FieldError,
                        ),
                    );
                    return;
                };

                let object_id = self.data.push_object(Origin { slot, nullable: *nullable });
                self.data.set(slot, ResponseValue::Object(object_id));
                let parent = Arc::new(value);
                for &child_id in &field.selection {
                    let child = self.field(child_id);
                    let child_slot = self.data.push_field(object_id, child.response_key.clone());
                    self.queue.push_back(FieldTask {
                        field: child_id,
                        parent: parent.clone(),
                        slot: child_slot,
                        path: path.clone().with_field(child.response_key.as_str()),
                    });
                }
            }
            FieldType::List { inner, nullable } => {
                let serde_json::Value::Array(items) = value else {
                    self.fail_at(
                        slot,
                        *nullable,
                        path,
                        field.location,
                        GraphqlError::new(
                            format!("Field '{}' resolved to a non-list value.", field.response_key),
                            ErrorCode::FieldError,
                        ),
                    );
                    return;
                };
                let list_id = self.data.push_list(Origin { slot, nullable: *nullable });
                self.data.set(slot, ResponseValue::List(list_id));
                for (index, item) in items.into_iter().enumerate() {
                    let item_slot = self.data.push_item(list_id);
                    self.write_value(field, inner, item_slot, path.clone().with_index(index), item);
                }
            }
        }
    }

    fn fail(&mut self, task: FieldTask, error: GraphqlError) {
        let field = self.field(task.field);
        self.fail_at(task.slot, field.ty.is_nullable(), task.path, field.location, error);
    }

    /// Records the error at the given position and path, then nulls out the
    /// slot or bubbles the null upward.
    fn fail_at(&mut self, slot: SlotId, nullable: bool, path: ErrorPath, location: Location, error: GraphqlError) {
        let mut error = error.with_path(path);
        if error.locations.is_empty() {
            error = error.with_location(location);
        }
        self.errors.push(error);
        self.data.null_out(slot, nullable);
    }

    fn evaluate_arguments(&self, arguments: &[CompiledArgument]) -> GraphqlResult<serde_json::Map<String, serde_json::Value>> {
        let mut map = serde_json::Map::new();
        for argument in arguments {
            let value = match &argument.value {
                ArgumentValue::Const(value) => value.clone(),
                ArgumentValue::Template(template) => template.clone().into_const_with(|name: Name| {
                    Ok::<_, GraphqlError>(self.variables.get(name.as_str()).cloned().unwrap_or(ConstValue::Null))
                })?,
            };
            let value = value.into_json().map_err(|err| {
                GraphqlError::new(
                    format!("Invalid value for argument '{}': {err}", argument.name),
                    ErrorCode::VariableError,
                )
            })?;
            map.insert(argument.name.clone(), value);
        }
        Ok(map)
    }
}

/// Canonical JSON of the (parent, arguments) pair; argument keys serialize
/// sorted, so equal inputs produce equal keys regardless of argument order.
fn load_cache_key(request: &LoadRequest) -> String {
    let arguments: std::collections::BTreeMap<&String, &serde_json::Value> = request.arguments.iter().collect();
    serde_json::to_string(&(request.parent.as_ref(), arguments)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::load_cache_key;
    use crate::loader::LoadRequest;
    use std::sync::Arc;

    #[test]
    fn load_cache_keys_ignore_argument_order() {
        let parent = Arc::new(serde_json::json!({"id": 1}));
        let mut a = serde_json::Map::new();
        a.insert("x".to_string(), serde_json::json!(1));
        a.insert("y".to_string(), serde_json::json!(2));
        let mut b = serde_json::Map::new();
        b.insert("y".to_string(), serde_json::json!(2));
        b.insert("x".to_string(), serde_json::json!(1));

        let first = load_cache_key(&LoadRequest {
            parent: parent.clone(),
            arguments: a,
        });
        let second = load_cache_key(&LoadRequest {
            parent,
            arguments: b,
        });
        assert_eq!(first, second);
    }
}
