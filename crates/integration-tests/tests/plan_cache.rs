use graphloom::{EngineConfig, Request};
use integration_tests::{fixtures, plan_cache, TestEngine};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn repeated_executions_share_one_cache_entry() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    for _ in 0..3 {
        let response = engine.execute_query("{ add(x: 1, y: 1) }").await;
        assert_eq!(response, serde_json::json!({"data": {"add": 2}}));
    }
    assert_eq!(engine.plan_cache_entries(), 1);

    engine.execute_query("{ add(x: 2, y: 2) }").await;
    assert_eq!(engine.plan_cache_entries(), 2);
}

#[tokio::test]
async fn validation_failures_are_cached_negatively() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();

    let first = engine.execute_query("{ missing }").await;
    let second = engine.execute_query("{ missing }").await;
    assert_eq!(first, second);
    assert_eq!(
        first["errors"][0]["extensions"]["code"],
        serde_json::json!("OPERATION_VALIDATION_ERROR")
    );
    assert_eq!(engine.plan_cache_entries(), 1);
}

#[tokio::test]
async fn results_are_identical_across_compile_thresholds() {
    for threshold in [0, 1, 5] {
        let engine = TestEngine::builder(fixtures::query_schema())
            .with_config(EngineConfig {
                compile_threshold: threshold,
                ..Default::default()
            })
            .build();
        for _ in 0..6 {
            let response = engine.execute_query("{ add(x: 2, y: 3) }").await;
            assert_eq!(response, serde_json::json!({"data": {"add": 5}}), "threshold {threshold}");
        }
    }
}

#[tokio::test]
async fn the_cache_is_bounded_with_lru_discard() {
    let engine = TestEngine::builder(fixtures::query_schema())
        .with_plan_cache(plan_cache(2))
        .build();

    engine.execute_query("{ add(x: 1, y: 1) }").await;
    engine.execute_query("{ add(x: 2, y: 2) }").await;
    engine.execute_query("{ add(x: 3, y: 3) }").await;
    assert_eq!(engine.plan_cache_entries(), 2);
}

#[tokio::test]
async fn a_new_schema_version_misses_old_entries() {
    let shared = plan_cache(10);

    let first = TestEngine::builder(fixtures::query_schema())
        .with_plan_cache(shared.clone())
        .build();
    let response = first.execute_query("{ add(x: 1, y: 2) }").await;
    assert_eq!(response, serde_json::json!({"data": {"add": 3}}));
    assert_eq!(first.plan_cache_entries(), 1);

    // Same cache, rebuilt schema: the version prefix changes every key.
    let second = TestEngine::builder(fixtures::query_schema())
        .with_plan_cache(shared)
        .build();
    let response = second.execute_query("{ add(x: 1, y: 2) }").await;
    assert_eq!(response, serde_json::json!({"data": {"add": 3}}));
    assert_eq!(second.plan_cache_entries(), 2);
}

#[tokio::test]
async fn warming_precompiles_documents() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    engine.engine().warm(["{ add(x: 2, y: 2) }", "{ nope }"]).await;
    // The invalid document is skipped.
    assert_eq!(engine.plan_cache_entries(), 1);

    let response = engine.execute_query("{ add(x: 2, y: 2) }").await;
    assert_eq!(response, serde_json::json!({"data": {"add": 4}}));
    assert_eq!(engine.plan_cache_entries(), 1);
}

#[tokio::test]
async fn the_operation_name_is_part_of_the_cache_key() {
    let engine = TestEngine::builder(fixtures::query_schema()).build();
    let document = "query Add { add(x: 1, y: 1) }";

    engine.execute(Request::new(document)).await;
    engine.execute(Request::new(document).with_operation_name("Add")).await;
    assert_eq!(engine.plan_cache_entries(), 2);
}
