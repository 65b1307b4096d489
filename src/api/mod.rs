//! Cartback REST API
//!
//! HTTP API layer for the recovery dashboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Carts
//! - `GET /api/v1/carts` - List abandoned carts
//! - `POST /api/v1/carts` - Log an abandoned cart
//! - `GET /api/v1/carts/:id` - Get a cart
//! - `POST /api/v1/carts/:id/recover` - Mark a cart as recovered
//!
//! ## Campaigns
//! - `GET /api/v1/campaigns` - List campaigns
//! - `POST /api/v1/campaigns` - Create a campaign
//! - `PUT /api/v1/campaigns/:id/status` - Change a campaign's status
//!
//! ## Dashboard and analytics
//! - `GET /api/v1/dashboard` - Stat cards, trend, channels, recent carts
//! - `GET /api/v1/progress` - Goal progress
//! - `GET /api/v1/analytics` - Windowed metrics and chart series
//! - `GET /api/v1/experiments` - A/B test results
//!
//! ## Discounts
//! - `GET /api/v1/discounts` - List strategies
//! - `GET /api/v1/discounts/:id` - Get a strategy
//! - `POST /api/v1/discounts/:id/activate` - Activate a strategy
//! - `POST /api/v1/discounts/:id/pause` - Pause a strategy
//! - `GET /api/v1/discounts/suggestion` - Suggested strategy
//! - `POST /api/v1/discounts/suggestion/apply` - Save the suggestion as a draft
//!
//! ## Feedback
//! - `GET /api/v1/feedback` - List feedback
//! - `POST /api/v1/feedback` - Add feedback
//! - `GET /api/v1/feedback/distribution` - Sentiment distribution
//!
//! ## Demo data
//! - `POST /api/v1/demo/carts` - Generate random carts
//! - `POST /api/v1/demo/campaigns` - Insert the stock campaigns
//!
//! ## Functions
//! - `POST /functions/v1/process-payment`
//! - `POST /functions/v1/send-recovery-email`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/realtime` - Store changes and notices
//!
//! # Example
//!
//! ```rust,no_run
//! use cartback::api::{serve, AppState};
//! use cartback::config::Config;
//! use cartback::store::Store;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let store = Arc::new(Store::open(&config.database.store_config())?);
//!
//!     let state = Arc::new(AppState::new(store, config));
//!     serve(state).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::functions;
use crate::realtime::{websocket_handler, RealtimeEvent};

/// Build the API router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Cart routes
        .route(
            "/carts",
            get(routes::carts::list_carts).post(routes::carts::create_cart),
        )
        .route("/carts/:id", get(routes::carts::get_cart))
        .route("/carts/:id/recover", post(routes::carts::recover_cart))
        // Campaign routes
        .route(
            "/campaigns",
            get(routes::campaigns::list_campaigns).post(routes::campaigns::create_campaign),
        )
        .route(
            "/campaigns/:id/status",
            put(routes::campaigns::update_campaign_status),
        )
        // Dashboard and analytics routes
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route("/progress", get(routes::dashboard::get_progress))
        .route("/analytics", get(routes::analytics::get_analytics))
        .route("/experiments", get(routes::analytics::list_experiments_handler))
        // Discount routes
        .route("/discounts", get(routes::discounts::list_strategies))
        .route("/discounts/suggestion", get(routes::discounts::get_suggestion))
        .route(
            "/discounts/suggestion/apply",
            post(routes::discounts::apply_suggestion),
        )
        .route("/discounts/:id", get(routes::discounts::get_strategy))
        .route(
            "/discounts/:id/activate",
            post(routes::discounts::activate_strategy),
        )
        .route("/discounts/:id/pause", post(routes::discounts::pause_strategy))
        // Feedback routes
        .route(
            "/feedback",
            get(routes::feedback::list_feedback).post(routes::feedback::add_feedback),
        )
        .route("/feedback/distribution", get(routes::feedback::get_distribution))
        // Demo routes
        .route("/demo/carts", post(routes::demo::generate_carts))
        .route("/demo/campaigns", post(routes::demo::generate_campaigns))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.api.request_timeout_secs,
        )))
        // WebSocket route, outside the request timeout
        .route("/realtime", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(CorsLayer::permissive())
        .with_state(Arc::clone(&state));

    // Function endpoints carry their own CORS policy
    app.merge(functions::router(Arc::clone(&state.functions)))
        .layer(TraceLayer::new_for_http())
}

/// Start the API server
pub async fn serve(state: Arc<AppState>) -> Result<(), ApiError> {
    let router = build_router(Arc::clone(&state));

    let addr = state.config.api.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Cartback API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    state
        .hub
        .broadcast(&RealtimeEvent::system("Server shutting down"))
        .await;
    state.shutdown();

    tracing::info!("Cartback API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::realtime::ServerMessage;
    use crate::store::{Store, StoreConfig};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    async fn create_test_app() -> (Router, Arc<AppState>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::open(&StoreConfig::file(dir.path().join("test.db"))).unwrap());

        let state = Arc::new(AppState::new(store, Config::default()));
        let router = build_router(Arc::clone(&state));

        (router, state, dir)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const CART: &str = r#"{"user_email": "emma.wilson@example.com", "items": [{"id": "p1", "name": "Wireless Headphones", "price": 89.99, "quantity": 1}]}"#;

    #[tokio::test]
    async fn test_health_live() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app.oneshot(get_request("/health/live")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app.oneshot(get_request("/health/ready")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app.oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "ok");
    }

    #[tokio::test]
    async fn test_list_carts_empty() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app.oneshot(get_request("/api/v1/carts")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["total"], 0);
    }

    #[tokio::test]
    async fn test_create_and_recover_cart() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/carts", CART))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "Not Sent");
        assert_eq!(created["item_count"], 1);

        let id = created["id"].as_str().unwrap().to_string();
        let response = app
            .clone()
            .oneshot(json_request("POST", &format!("/api/v1/carts/{}/recover", id), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["recovered"], true);

        let response = app
            .oneshot(get_request("/api/v1/carts?recovered=true"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["total"], 1);
    }

    #[tokio::test]
    async fn test_create_cart_rejects_bad_input() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/carts",
                r#"{"user_email": "not-an-email", "items": []}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");

        let response = app
            .oneshot(json_request("POST", "/api/v1/carts", "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_cart_is_not_found() {
        let (app, _state, _dir) = create_test_app().await;

        let uri = format!("/api/v1/carts/{}/recover", uuid::Uuid::new_v4());
        let response = app
            .clone()
            .oneshot(json_request("POST", &uri, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get_request("/api/v1/carts/abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_campaign_lifecycle() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/campaigns",
                r#"{"name": "Welcome Back", "status": "draft", "channels": ["email"]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/campaigns/{}/status", id),
                r#"{"status": "active"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_request("/api/v1/campaigns?status=active"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["campaigns"][0]["last_modified"], "just now");

        let response = app
            .oneshot(get_request("/api/v1/campaigns?status=paused"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_demo_then_dashboard() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/demo/carts", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["created"], 10);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/demo/carts", r#"{"count": 0}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get_request("/api/v1/dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["cards"].as_array().unwrap().len(), 4);
        assert_eq!(body["recent_carts"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_analytics_period() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .clone()
            .oneshot(get_request("/api/v1/analytics"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["period"], "30days");

        let response = app
            .oneshot(get_request("/api/v1/analytics?period=decade"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_progress() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .oneshot(get_request("/api/v1/progress?current=150&target=100"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["percentage"], 100);
    }

    #[tokio::test]
    async fn test_discount_activation() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/discounts/999/activate", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/discounts/suggestion/apply", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(json_request("POST", &format!("/api/v1/discounts/{}/activate", id), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "active");
    }

    #[tokio::test]
    async fn test_feedback_add_and_filter() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/feedback",
                r#"{"content": "Checkout was broken and slow", "customer": "Zed"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["sentiment"], "negative");

        let response = app
            .oneshot(get_request("/api/v1/feedback?search=zed"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_functions_are_mounted() {
        let (app, _state, _dir) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/functions/v1/process-payment")
                    .header("Origin", "https://shop.example.com")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }

    #[tokio::test]
    async fn test_changes_reach_hub_subscribers() {
        let (app, state, _dir) = create_test_app().await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = state.hub.register(tx).await.unwrap();
        state
            .hub
            .subscribe(&id, vec!["abandoned_carts.*".to_string()])
            .await
            .unwrap();

        let response = app
            .oneshot(json_request("POST", "/api/v1/carts", CART))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match message {
            ServerMessage::Change { topic, .. } => assert_eq!(topic, "abandoned_carts.insert"),
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
