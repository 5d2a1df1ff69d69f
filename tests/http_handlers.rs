use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use campaign_advisor::model::{ModelManager, ModelStatus};
use campaign_advisor::scoring::RandomSource;
use campaign_advisor::server::{health, platforms, recommendations, router, AppState};
use campaign_advisor::{Platform, PredictionSource, RecommendationEngine};
use tower::ServiceExt;

fn state() -> AppState {
    AppState::new(RecommendationEngine::new(
        ModelManager::unloaded(),
        RandomSource::Seeded(5),
    ))
}

#[tokio::test]
async fn valid_campaign_returns_recommendation() {
    let body = r#"{
        "product_name": "CloudTech CRM Software",
        "budget": 5000,
        "location": "United States",
        "target_audience": { "age_group": "25-34", "interests": ["technology", "business"] },
        "objectives": ["leads"]
    }"#;
    let (status, response) = recommendations(State(state()), body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.0.success);
    let data = response.0.data.as_ref().unwrap();
    assert_eq!(data.recommended_platform, Platform::Google);
    assert_eq!(data.source, PredictionSource::Heuristic);
    assert_eq!(data.ad_copy_suggestions[0], "Get Your Free CloudTech CRM Software Demo Today");
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let cases = [
        ("", "Campaign data is required"),
        ("{}", "Campaign data is required"),
        ("not json", "Campaign data is required"),
        (r#"{"budget": 100}"#, "Product name is required"),
        (r#"{"product_name": "X", "budget": "lots"}"#, "Budget must be a valid number"),
        (r#"{"product_name": "X", "budget": -1}"#, "Budget must not be negative"),
    ];

    for (body, message) in cases {
        let (status, response) = recommendations(State(state()), body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(!response.0.success);
        assert!(response.0.data.is_none());
        assert_eq!(response.0.error.as_deref(), Some(message));
    }
}

#[tokio::test]
async fn health_reports_model_state() {
    let response = health(State(state())).await;
    assert_eq!(response.0.status, "healthy");
    assert_eq!(response.0.model, ModelStatus::Unloaded);

    let json = serde_json::to_value(&response.0).unwrap();
    assert_eq!(json["model"], "unloaded");
}

#[tokio::test]
async fn platforms_lists_every_platform() {
    let response = platforms().await;
    let catalog = response.0.data.unwrap();

    assert_eq!(catalog.len(), Platform::ALL.len());
    assert_eq!(catalog[1].id, Platform::Google);
    assert_eq!(catalog[1].name, "Google Ads");
    assert_eq!(catalog[3].min_budget, 10);
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/campaign/recommendations")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn preflight_allows_only_configured_origins() {
    let origins = vec!["http://localhost:3000".to_string(), "bad\norigin".to_string()];
    let app = router(state(), &origins);

    let allowed = app
        .clone()
        .oneshot(preflight("http://localhost:3000"))
        .await
        .unwrap();
    let allow_origin = allowed
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .unwrap();
    assert_eq!(allow_origin, "http://localhost:3000");

    let rejected = app.oneshot(preflight("http://evil.example")).await.unwrap();
    assert!(rejected
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
