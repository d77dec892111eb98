use integration_tests::{fixtures, TestEngine};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn a_single_body_produces_a_single_response() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    let response = engine
        .execute_body(serde_json::json!({"query": "{ add(x: 1, y: 2) }"}))
        .await;
    insta::assert_json_snapshot!(response, @r#"
    {
      "data": {
        "add": 3
      }
    }
    "#);
}

#[tokio::test]
async fn batched_operations_are_isolated_and_keep_their_order() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    let response = engine
        .execute_body(serde_json::json!([
            {"query": "{ add(x: 1, y: 1) }"},
            {"query": "{ add("},
            {"query": "{ missing }"},
            {"query": "{ add(x: 2, y: 2) }"},
        ]))
        .await;
    let slots = response.as_array().unwrap();
    assert_eq!(slots.len(), 4);
    assert_eq!(slots[0], serde_json::json!({"data": {"add": 2}}));
    // Failing slots do not disturb their neighbours: one malformed, one
    // schema-invalid, both answered in place with no data key.
    assert_eq!(
        slots[1]["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_PARSING_ERROR")
    );
    assert!(slots[1].get("data").is_none(), "{response}");
    assert_eq!(
        slots[2]["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_VALIDATION_ERROR")
    );
    assert!(slots[2].get("data").is_none(), "{response}");
    assert_eq!(slots[3], serde_json::json!({"data": {"add": 4}}));
}

#[tokio::test]
async fn an_empty_batch_is_an_empty_array() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    let response = engine.execute_body(serde_json::json!([])).await;
    assert_eq!(response, serde_json::json!([]));
}

#[tokio::test]
async fn batched_operations_share_the_plan_cache() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    engine
        .execute_body(serde_json::json!([
            {"query": "{ add(x: 1, y: 1) }"},
            {"query": "{ add(x: 1, y: 1) }"},
        ]))
        .await;
    assert_eq!(engine.plan_cache_entries(), 1);
}
