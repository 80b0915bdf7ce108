use super::*;
use crate::orchestrator::test_helpers::{
    CollectingSink, Harness, ScriptedFetcher, ScriptedResolver, create_harness,
    create_test_orchestrator, numbered_tracks, test_config,
};
use crate::types::Track;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Router over scripted collaborators, plus handles to inspect them
struct TestApp {
    orchestrator: Arc<Orchestrator>,
    config: Arc<Config>,
    resolver: Arc<ScriptedResolver>,
    fetcher: Arc<ScriptedFetcher>,
    sink: Arc<CollectingSink>,
}

impl TestApp {
    fn from_harness(harness: Harness) -> Self {
        let Harness {
            orchestrator,
            resolver,
            fetcher,
            sink,
        } = harness;
        let orchestrator = Arc::new(orchestrator);
        let config = orchestrator.get_config();
        Self {
            orchestrator,
            config,
            resolver,
            fetcher,
            sink,
        }
    }

    fn router(&self) -> Router {
        create_router(self.orchestrator.clone(), self.config.clone())
    }

    fn router_with(&self, config: Config) -> Router {
        create_router(self.orchestrator.clone(), Arc::new(config))
    }
}

/// App over playlist "p1" holding `tracks`
fn create_test_app(tracks: Vec<Track>) -> TestApp {
    TestApp::from_harness(create_test_orchestrator(tracks))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// JSON payloads of every `data:` line in an SSE body
fn sse_data(body: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let app = create_test_app(vec![]);

    let mut config = (*app.config).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let orchestrator = app.orchestrator.clone();
        async move { start_api_server(orchestrator, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server exited early");

    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let app = create_test_app(vec![]);
    let mut config = (*app.config).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.router_with(config).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let app = create_test_app(vec![]);
    let mut config = (*app.config).clone();
    config.server.api.cors_origins = vec!["http://localhost:4200".to_string()];

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:4200")
        .body(Body::empty())
        .unwrap();

    let response = app.router_with(config).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:4200"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let app = create_test_app(vec![]);
    let mut config = (*app.config).clone();
    config.server.api.cors_enabled = false;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.router_with(config).oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_api_key_protects_routes() {
    let app = create_test_app(numbered_tracks(1));
    let mut config = (*app.config).clone();
    config.server.api.api_key = Some("secret".to_string());
    let router = app.router_with(config);

    let response = router.clone().oneshot(get("/playlists")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/playlists")
        .header("X-Api-Key", "secret")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // EventSource clients pass the key as a query parameter
    let response = router
        .oneshot(get("/playlists/p1/download-all-stream?api_key=secret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let app = create_test_app(vec![]);

    let response = app.router().oneshot(get("/swagger-ui/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = (*app.config).clone();
    config.server.api.swagger_ui = false;
    let response = app
        .router_with(config)
        .oneshot(get("/swagger-ui/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let mut config = test_config();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let harness = create_harness(Arc::new(crate::catalog::StaticCatalog::new()), config);
    let orchestrator = Arc::new(harness.orchestrator);

    let api_handle = orchestrator.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server exited early");

    api_handle.abort();
}
