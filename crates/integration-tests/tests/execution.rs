use std::sync::{Arc, Mutex};

use graphloom::{AppContext, EngineConfig, Request};
use integration_tests::{fixtures, TestEngine};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn resolves_scalar_fields_with_arguments() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine.execute_query("{ add(x: 2, y: 2) }").await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "add": 4
      }
    }
    "#);
}

#[tokio::test]
async fn selects_the_operation_by_name_and_binds_variables() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let document = "query MyQuery { add(x: 1, y: 2) } query Double($x: Int!) { add(x: $x, y: $x) }";

    let response = engine
        .execute(
            Request::new(document)
                .with_operation_name("Double")
                .with_variables(serde_json::json!({"x": 21, "unused": true})),
        )
        .await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "add": 42
      }
    }
    "#);

    let response = engine
        .execute(Request::new(document).with_operation_name("Triple"))
        .await;
    assert_eq!(
        response["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_NOT_FOUND")
    );
    assert!(response.get("data").is_none(), "{response}");
}

#[tokio::test]
async fn typename_and_aliases() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine.execute_query("{ __typename sum: add(x: 1, y: 2) }").await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "__typename": "Query",
        "sum": 3
      }
    }
    "#);
}

#[tokio::test]
async fn merges_duplicate_response_keys() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine.execute_query("{ node { value } node { next { value } } }").await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "node": {
          "next": {
            "value": 2
          },
          "value": 1
        }
      }
    }
    "#);
}

#[tokio::test]
async fn expands_named_and_inline_fragments() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine
        .execute_query("{ node { ...Parts ... on Node { value } } } fragment Parts on Node { next { value } }")
        .await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "node": {
          "next": {
            "value": 2
          },
          "value": 1
        }
      }
    }
    "#);
}

#[tokio::test]
async fn missing_properties_resolve_to_null() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine
        .execute_query("{ node { next { next { value next { value } } } } }")
        .await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "node": {
          "next": {
            "next": {
              "next": null,
              "value": 3
            }
          }
        }
      }
    }
    "#);
}

#[tokio::test]
async fn root_field_error_on_non_nullable_field_nulls_data() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine.execute_query("{ boom }").await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": null,
      "errors": [
        {
          "extensions": {
            "code": "FIELD_ERROR"
          },
          "locations": [
            {
              "column": 3,
              "line": 1
            }
          ],
          "message": "boom",
          "path": [
            "boom"
          ]
        }
      ]
    }
    "#);
}

#[tokio::test]
async fn nested_error_bubbles_to_the_nearest_nullable_field() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine.execute_query("{ wrap { boom } }").await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "wrap": null
      },
      "errors": [
        {
          "extensions": {
            "code": "FIELD_ERROR"
          },
          "locations": [
            {
              "column": 10,
              "line": 1
            }
          ],
          "message": "wrapped boom",
          "path": [
            "wrap",
            "boom"
          ]
        }
      ]
    }
    "#);
}

#[tokio::test]
async fn enforces_the_configured_depth_limit() {
    let engine = TestEngine::builder(fixtures::query_schema())
        .with_config(EngineConfig {
            max_query_depth: 2,
            ..Default::default()
        })
        .build();

    let response = engine.execute_query("{ node { value } }").await;
    assert_eq!(response["data"]["node"]["value"], serde_json::json!(1));

    let response = engine.execute_query("{ node { next { value } } }").await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "errors": [
        {
          "extensions": {
            "code": "QUERY_DEPTH_EXCEEDED"
          },
          "message": "Query depth 3 exceeds the configured maximum of 2."
        }
      ]
    }
    "#);
}

#[tokio::test]
async fn conflicting_fields_under_one_response_key_fail_validation() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    let response = engine.execute_query("{ a: add(x: 1, y: 1) a: node { value } }").await;
    assert_eq!(
        response["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_VALIDATION_ERROR")
    );
    assert_eq!(
        response["errors"][0]["message"],
        serde_json::json!("Fields 'add' and 'node' cannot be merged under response key 'a'.")
    );
    assert!(response.get("data").is_none(), "{response}");
    // Rejected at validation, so the failure is cached like any other.
    engine.execute_query("{ a: add(x: 1, y: 1) a: node { value } }").await;
    assert_eq!(engine.plan_cache_entries(), 1);
}

#[tokio::test]
async fn conflicting_arguments_under_one_response_key_fail_validation() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    let response = engine.execute_query("{ a: add(x: 1, y: 1) a: add(x: 2, y: 2) }").await;
    assert_eq!(
        response["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_VALIDATION_ERROR")
    );
    assert_eq!(
        response["errors"][0]["message"],
        serde_json::json!("Field 'add' under response key 'a' is selected with conflicting arguments.")
    );
    assert!(response.get("data").is_none(), "{response}");
}

#[tokio::test]
async fn nested_selections_of_merged_keys_must_agree() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    // The outer 'node's merge cleanly; the inner response key does not.
    let response = engine
        .execute_query("{ node { v: value } node { v: next { value } } }")
        .await;
    assert_eq!(
        response["errors"][0]["message"],
        serde_json::json!("Fields 'value' and 'next' cannot be merged under response key 'v'.")
    );
}

#[tokio::test]
async fn oversized_documents_are_rejected_before_parsing() {
    let query = "{ add(x: 1, y: 2) }";
    let engine = TestEngine::builder(fixtures::query_schema())
        .with_config(EngineConfig {
            executable_document_limit_bytes: query.len(),
            ..Default::default()
        })
        .build();

    // A document of exactly the configured size still executes.
    let response = engine.execute_query(query).await;
    assert_eq!(response, serde_json::json!({"data": {"add": 3}}));

    let response = engine.execute_query("{ add(x: 10, y: 20) }").await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "errors": [
        {
          "extensions": {
            "code": "OPERATION_VALIDATION_ERROR"
          },
          "message": "Executable document exceeded the maximum configured size."
        }
      ]
    }
    "#);
}

#[tokio::test]
async fn recursive_fragment_spreads_fail_validation() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine
        .execute_query("{ node { ...Chain } } fragment Chain on Node { value ...Chain }")
        .await;
    assert_eq!(
        response["errors"][0]["message"],
        serde_json::json!("Fragment 'Chain' cannot be spread within itself.")
    );
    assert_eq!(
        response["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_VALIDATION_ERROR")
    );
}

#[tokio::test]
async fn validation_and_parse_failures_are_request_errors() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    let response = engine.execute_query("{ missing }").await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "errors": [
        {
          "extensions": {
            "code": "OPERATION_VALIDATION_ERROR"
          },
          "locations": [
            {
              "column": 3,
              "line": 1
            }
          ],
          "message": "Unknown field 'missing' on type 'Query'."
        }
      ]
    }
    "#);

    let response = engine.execute_query("{ add(").await;
    assert_eq!(
        response["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_PARSING_ERROR")
    );
    assert!(response.get("data").is_none(), "{response}");
}

#[tokio::test]
async fn missing_required_variables_are_reported() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine
        .execute_query("query Add($x: Int!) { add(x: $x, y: 1) }")
        .await;
    assert_eq!(
        response["errors"][0]["extensions"]["code"],
        serde_json::json!("VARIABLE_ERROR")
    );
    let message = response["errors"][0]["message"].as_str().unwrap();
    assert!(message.contains("'$x'"), "{message}");
}

#[tokio::test]
async fn subscriptions_are_rejected() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let response = engine.execute_query("subscription { add(x: 1, y: 1) }").await;
    assert_eq!(
        response["errors"][0]["message"],
        serde_json::json!("Subscription operations are not supported.")
    );
    assert_eq!(
        response["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_VALIDATION_ERROR")
    );
}

#[tokio::test]
async fn mutation_root_fields_run_serially() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let log: AppContext = Arc::new(Mutex::new(Vec::<String>::new()));
    let response = engine
        .execute_with(
            Request::new(r#"mutation { a: append(value: "a") b: append(value: "b") }"#),
            log,
        )
        .await;
    // Each append sees every previous append completed.
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "a": [
          "a"
        ],
        "b": [
          "a",
          "b"
        ]
      }
    }
    "#);
}
