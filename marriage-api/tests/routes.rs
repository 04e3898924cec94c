use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use marriage_bus::InMemoryBus;
use marriage_common::{EnvConfig, FixedClock, RequestScope, TenantId, TENANT_HEADER};
use marriage_engine::character_service::testing::FakeCharacterService;
use marriage_engine::MarriageProcessor;
use marriage_store::Store;

fn test_state() -> (marriage_api::state::ApiState, Arc<MarriageProcessor>) {
    let store = Arc::new(Mutex::new(Store::open_memory().unwrap()));
    let characters = FakeCharacterService::new().with_character(1, 20).with_character(2, 20);
    let clock = Arc::new(FixedClock::new(chrono::Utc::now()));
    let processor = Arc::new(MarriageProcessor::new(store, Arc::new(InMemoryBus::new()), Arc::new(characters), clock, "marriage.status"));
    let state = marriage_api::state::ApiState {
        processor: processor.clone(),
        env: Arc::new(EnvConfig::default()),
    };
    (state, processor)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn current_marriage_returns_404_when_none_exists() {
    let (state, _processor) = test_state();
    let app = marriage_api::build_router(state);
    let tenant_id = TenantId::new(uuid::Uuid::new_v4());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/characters/1/marriage")
                .header(TENANT_HEADER, tenant_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn current_marriage_requires_tenant_header() {
    let (state, _processor) = test_state();
    let app = marriage_api::build_router(state);

    let response = app
        .oneshot(Request::builder().uri("/api/characters/1/marriage").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pending_proposals_lists_proposals_for_character() {
    let (state, processor) = test_state();
    let tenant_id = TenantId::new(uuid::Uuid::new_v4());
    let scope = RequestScope::new(tenant_id);
    processor.propose(&scope, 1, 2).await.unwrap();

    let app = marriage_api::build_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/characters/1/marriage/proposals")
                .header(TENANT_HEADER, tenant_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["proposals"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_endpoint_is_reachable_without_a_tenant() {
    let (state, _processor) = test_state();
    let app = marriage_api::build_router(state);

    let response = app.oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
