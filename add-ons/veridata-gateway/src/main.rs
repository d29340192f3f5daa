//! Axum gateway for the verifiable data agent. Config-driven via CoreConfig.
//!
//! Three surfaces:
//! - `POST /v1/chat`: inbound chat message carrying a structured request plus
//!   a `sender` reply address. Binds session -> sender, acknowledges
//!   immediately, and answers asynchronously: the fetch runs in a spawned
//!   task and the formatted report is POSTed to the bound address.
//! - `POST /v1/fetch`: synchronous structured fetch, envelope back as JSON.
//! - `GET /health`: live bitcoin/usd probe against the price upstream.

mod formatter;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use veridata_core::{
    CoreConfig, ErrorReply, FetchError, FetchRouter, SessionStore, TtlCache,
    VerifiableDataRequest, VerifiableDataResponse,
};
use veridata_resolvers::standard_registry;

use formatter::format_report;

struct AppState {
    router: FetchRouter,
    sessions: Arc<SessionStore>,
    http: reqwest::Client,
    config: CoreConfig,
}

/// Inbound chat message: the language-understanding collaborator has already
/// produced the structured request; `sender` is the reply address.
#[derive(Debug, Deserialize)]
struct InboundChatMessage {
    sender: String,
    request: VerifiableDataRequest,
}

/// Outbound chat message delivered to the bound address.
#[derive(Debug, Serialize)]
struct OutboundChatMessage {
    msg_id: String,
    timestamp: String,
    session_id: String,
    text: String,
    end_session: bool,
}

impl OutboundChatMessage {
    fn new(session_id: &str, text: String) -> Self {
        Self {
            msg_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            session_id: session_id.to_string(),
            text,
            end_session: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatAck {
    status: &'static str,
    session_id: String,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    agent_name: String,
    status: &'static str,
    message: String,
}

async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(message): Json<InboundChatMessage>,
) -> impl IntoResponse {
    let session_id = message.request.session_id.clone();
    if session_id.is_empty() {
        tracing::error!("inbound chat message missing session_id, cannot correlate a reply");
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatAck {
                status: "rejected",
                session_id,
            }),
        );
    }

    state.sessions.bind(&session_id, &message.sender);
    tracing::info!(%session_id, sender = %message.sender, "session bound, dispatching fetch");

    let state_for_task = Arc::clone(&state);
    tokio::spawn(async move {
        let envelope = state_for_task.router.route(&message.request).await;
        complete_session(&state_for_task, envelope).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(ChatAck {
            status: "accepted",
            session_id,
        }),
    )
}

/// Formats the finished envelope and delivers it to the session's bound
/// address. Failed fetches travel as the slim error reply and are formatted
/// through the same Error Report path.
async fn complete_session(state: &AppState, envelope: VerifiableDataResponse) {
    let session_id = envelope.session_id.clone();

    let text = if envelope.is_error() {
        let reply = ErrorReply {
            session_id: session_id.clone(),
            error: envelope.error_message.clone().unwrap_or_default(),
        };
        tracing::warn!(%session_id, error = %reply.error, "fetch completed with error");
        let error_envelope = VerifiableDataResponse {
            session_id: reply.session_id,
            request_data_type: "error_report".to_string(),
            request_identifier: "unknown_request_due_to_error".to_string(),
            source_description: None,
            timestamp: None,
            data_payload: None,
            verification_summary: None,
            error_message: Some(reply.error),
        };
        format_report(&error_envelope)
    } else {
        format_report(&envelope)
    };

    let Some(address) = state.sessions.resolve(&session_id) else {
        tracing::error!(
            "dropping completed response: {}",
            FetchError::MissingSession(session_id)
        );
        return;
    };

    let outbound = OutboundChatMessage::new(&session_id, text);
    if !state.config.deliver_responses {
        tracing::info!(%session_id, %address, "delivery disabled, report:\n{}", outbound.text);
        return;
    }

    match state.http.post(&address).json(&outbound).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::info!(%session_id, %address, "delivered final report");
        }
        Ok(response) => {
            tracing::error!(
                %session_id,
                %address,
                status = %response.status(),
                "bound address rejected the final report"
            );
        }
        Err(err) => {
            tracing::error!(%session_id, %address, "failed to deliver final report: {err}");
        }
    }
}

async fn handle_fetch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifiableDataRequest>,
) -> Json<VerifiableDataResponse> {
    Json(state.router.route(&request).await)
}

async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = VerifiableDataRequest {
        session_id: "health-check".to_string(),
        data_type: "crypto_price".to_string(),
        identifier: "bitcoin".to_string(),
        query_details: Some("vs_currency=usd".to_string()),
    };
    let envelope = state.router.route(&probe).await;

    let report = match envelope.error_message {
        None => HealthReport {
            agent_name: state.config.app_name.clone(),
            status: "healthy",
            message: "Price API connection successful.".to_string(),
        },
        Some(error) => {
            tracing::warn!("health probe failed: {error}");
            HealthReport {
                agent_name: state.config.app_name.clone(),
                status: "unhealthy",
                message: format!("Failed to fetch test data from price API: {error}"),
            }
        }
    };
    let code = if report.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat", post(handle_chat))
        .route("/v1/fetch", post(handle_fetch))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn build_state(config: CoreConfig) -> Arc<AppState> {
    let cache = Arc::new(TtlCache::new());
    let registry = standard_registry(cache, &config.price_api_url);
    Arc::new(AppState {
        router: FetchRouter::new(Arc::new(registry)),
        sessions: Arc::new(SessionStore::new()),
        http: reqwest::Client::new(),
        config,
    })
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[veridata-gateway] .env not loaded: {e} (using system environment)");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("failed to load configuration: {e}");
            return;
        }
    };

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("{} listening on {}", config.app_name, addr);

    let state = build_state(config);
    let app = build_app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    // Unroutable upstream so no test touches the network.
    fn test_state(deliver: bool) -> Arc<AppState> {
        build_state(CoreConfig {
            app_name: "Test Gateway".to_string(),
            port: 0,
            price_api_url: "http://127.0.0.1:1".to_string(),
            deliver_responses: deliver,
        })
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn fetch_endpoint_returns_the_envelope() {
        let app = build_app(test_state(false));
        let response = app
            .oneshot(json_request(
                "/v1/fetch",
                serde_json::json!({
                    "session_id": "s1",
                    "data_type": "carbon_footprint",
                    "identifier": "macbook_pro"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["request_data_type"], "carbon_footprint");
        assert_eq!(body["data_payload"]["carbonFootprint"]["total"], 185.3);
        assert!(body["error_message"].is_null());
    }

    #[tokio::test]
    async fn chat_endpoint_acks_and_binds_the_session() {
        let state = test_state(false);
        let app = build_app(Arc::clone(&state));
        let response = app
            .oneshot(json_request(
                "/v1/chat",
                serde_json::json!({
                    "sender": "http://127.0.0.1:1/reply",
                    "request": {
                        "session_id": "chat-42",
                        "data_type": "education_credential",
                        "identifier": "alex_chen"
                    }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "accepted");
        assert_eq!(state.sessions.resolve("chat-42").as_deref(), Some("http://127.0.0.1:1/reply"));
    }

    #[tokio::test]
    async fn chat_without_session_id_is_rejected() {
        let app = build_app(test_state(false));
        let response = app
            .oneshot(json_request(
                "/v1/chat",
                serde_json::json!({
                    "sender": "http://127.0.0.1:1/reply",
                    "request": {
                        "session_id": "",
                        "data_type": "crypto_price",
                        "identifier": "bitcoin"
                    }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_unhealthy_when_upstream_is_down() {
        let app = build_app(test_state(false));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["status"], "unhealthy");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Failed to fetch test data"));
    }

    #[tokio::test]
    async fn unbound_completion_is_dropped_without_panicking() {
        let state = test_state(true);
        let request = VerifiableDataRequest {
            session_id: "never-bound".to_string(),
            data_type: "carbon_footprint".to_string(),
            identifier: "macbook_pro".to_string(),
            query_details: None,
        };
        let envelope = state.router.route(&request).await;
        complete_session(&state, envelope).await;
        assert!(state.sessions.is_empty());
    }
}
