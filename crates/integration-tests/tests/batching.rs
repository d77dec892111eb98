use graphloom::{ErrorCode, GraphqlError, GraphqlResult, LoadRequest, LoaderRegistry};
use graphloom_schema::{FieldDefinition, FieldType, Schema};
use integration_tests::{fixtures, TestEngine};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn coalesces_loads_submitted_in_the_same_turn() {
    let (schema, loaders, log) = fixtures::social(true);
    let engine = TestEngine::builder(schema).with_loaders(loaders).build();

    let response = engine
        .execute_query(r#"{ a: user(id: "1") { name } b: user(id: "2") { name } }"#)
        .await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "a": {
          "name": "Alice"
        },
        "b": {
          "name": "Bob"
        }
      }
    }
    "#);
    assert_eq!(log.calls(), vec![("Query.user".to_string(), 2)]);
}

#[tokio::test]
async fn flushes_one_batch_per_dependency_level() {
    let (schema, loaders, log) = fixtures::social(true);
    let engine = TestEngine::builder(schema).with_loaders(loaders).build();

    let response = engine
        .execute_query(r#"{ user(id: "1") { name friends { name } } }"#)
        .await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "user": {
          "friends": [
            {
              "name": "Bob"
            },
            {
              "name": "Carol"
            }
          ],
          "name": "Alice"
        }
      }
    }
    "#);
    assert_eq!(
        log.calls(),
        vec![("Query.user".to_string(), 1), ("User.friends".to_string(), 1)]
    );
}

#[tokio::test]
async fn deduplicates_identical_keys_within_a_turn() {
    let (schema, loaders, log) = fixtures::social(true);
    let engine = TestEngine::builder(schema).with_loaders(loaders).build();

    let response = engine
        .execute_query(r#"{ a: user(id: "1") { name } b: user(id: "1") { nickname } }"#)
        .await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "a": {
          "name": "Alice"
        },
        "b": {
          "nickname": null
        }
      }
    }
    "#);
    assert_eq!(log.calls(), vec![("Query.user".to_string(), 1)]);
}

#[tokio::test]
async fn reuses_cached_results_across_turns() {
    let (schema, loaders, log) = fixtures::social(true);
    let engine = TestEngine::builder(schema).with_loaders(loaders).build();

    let response = engine
        .execute_query(r#"{ user(id: "1") { friends { friends { friends { name } } } } }"#)
        .await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "user": {
          "friends": [
            {
              "friends": [
                {
                  "friends": []
                }
              ]
            },
            {
              "friends": []
            }
          ]
        }
      }
    }
    "#);
    // The last level only needs friends of user 3, already loaded during the
    // previous turn, so no third flush happens.
    assert_eq!(
        log.calls(),
        vec![
            ("Query.user".to_string(), 1),
            ("User.friends".to_string(), 1),
            ("User.friends".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn loaders_without_result_caching_repeat_keys() {
    let (schema, loaders, log) = fixtures::social(false);
    let engine = TestEngine::builder(schema).with_loaders(loaders).build();

    engine
        .execute_query(r#"{ a: user(id: "1") { name } b: user(id: "1") { name } }"#)
        .await;
    assert_eq!(log.calls(), vec![("Query.user".to_string(), 2)]);
}

fn lookup_schema() -> Schema {
    Schema::builder()
        .object(
            "Query",
            [FieldDefinition::new("lookup", FieldType::named("String")).argument("id", FieldType::named("ID").non_null())],
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn result_count_mismatch_is_a_contract_violation() {
    let mut loaders = LoaderRegistry::default();
    loaders.register("Query", "lookup", false, |_: Vec<LoadRequest>| async {
        Ok(Vec::new())
    });
    let engine = TestEngine::builder(lookup_schema()).with_loaders(loaders).build();

    let response = engine.execute_query(r#"{ lookup(id: "1") }"#).await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "lookup": null
      },
      "errors": [
        {
          "extensions": {
            "code": "LOADER_CONTRACT_VIOLATION"
          },
          "locations": [
            {
              "column": 3,
              "line": 1
            }
          ],
          "message": "Loader 'Query.lookup' violated its batching contract: expected 1 results, received 0",
          "path": [
            "lookup"
          ]
        }
      ]
    }
    "#);
}

#[tokio::test]
async fn whole_batch_failure_fails_every_entry() {
    let mut loaders = LoaderRegistry::default();
    loaders.register("Query", "lookup", false, |_: Vec<LoadRequest>| async {
        Err(GraphqlError::new("database offline", ErrorCode::InternalServerError))
    });
    let engine = TestEngine::builder(lookup_schema()).with_loaders(loaders).build();

    let response = engine
        .execute_query(r#"{ x: lookup(id: "1") y: lookup(id: "2") }"#)
        .await;
    assert_eq!(response["data"], serde_json::json!({"x": null, "y": null}));
    assert_eq!(response["errors"].as_array().unwrap().len(), 2);
    assert_eq!(
        response["errors"][0]["message"],
        serde_json::json!("database offline")
    );
    assert_eq!(response["errors"][0]["path"], serde_json::json!(["x"]));
    assert_eq!(response["errors"][1]["path"], serde_json::json!(["y"]));
}

#[tokio::test]
async fn entries_within_a_batch_fail_independently() {
    let mut loaders = LoaderRegistry::default();
    loaders.register("Query", "lookup", false, |requests: Vec<LoadRequest>| async move {
        let results: Vec<GraphqlResult<serde_json::Value>> = requests
            .iter()
            .map(|request| match request.argument("id").and_then(serde_json::Value::as_str) {
                Some("bad") => Err(GraphqlError::new("not found", ErrorCode::FieldError)),
                other => Ok(serde_json::json!(other)),
            })
            .collect();
        Ok(results)
    });
    let engine = TestEngine::builder(lookup_schema()).with_loaders(loaders).build();

    let response = engine
        .execute_query(r#"{ x: lookup(id: "good") y: lookup(id: "bad") }"#)
        .await;
    assert_eq!(response["data"], serde_json::json!({"x": "good", "y": null}));
    assert_eq!(response["errors"].as_array().unwrap().len(), 1);
    assert_eq!(response["errors"][0]["path"], serde_json::json!(["y"]));
}
