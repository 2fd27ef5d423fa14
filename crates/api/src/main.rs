use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use orchestrator::{
    Attachment, Caller, GenerationError, HistoryMessage, Mode, ResponseEnvelope, TurnOrchestrator,
    TurnRequest,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
struct AppState {
    api_token: Option<String>,
    orchestrator: Arc<TurnOrchestrator>,
}

#[derive(Debug, Deserialize)]
struct TurnPayload {
    #[serde(default)]
    text: String,
    #[serde(default)]
    history: Vec<HistoryMessage>,
    #[serde(default)]
    attachments: Vec<AttachmentPayload>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    system_instruction: Option<String>,
    #[serde(default)]
    mode: Option<Mode>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct AttachmentPayload {
    #[serde(alias = "filename", alias = "name")]
    file_name: String,
    #[serde(alias = "mime_type", alias = "content_type")]
    media_type: String,
    /// Base64 (standard alphabet) file bytes.
    data: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
    knowledge_base_passages: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = env::var("ASSISTANT_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string());
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| format!("Invalid ASSISTANT_API_ADDR '{}': {}", addr, e))?;
    let api_token = env::var("ASSISTANT_API_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty());
    if api_token.is_none() {
        warn!("ASSISTANT_API_TOKEN not set, every caller is anonymous");
    }

    let orchestrator = Arc::new(TurnOrchestrator::from_env().await?);
    info!(
        primary = orchestrator.dispatcher().primary_name(),
        alternates = ?orchestrator.dispatcher().alternate_names(),
        passages = orchestrator.knowledge_base_size(),
        "Orchestrator ready"
    );

    let state = AppState {
        api_token,
        orchestrator: orchestrator.clone(),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/turns", post(create_turn))
        .with_state(state);

    info!(%addr, "Assistant API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    orchestrator.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        knowledge_base_passages: state.orchestrator.knowledge_base_size(),
    })
}

async fn create_turn(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TurnPayload>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let caller = authorize(&state, &headers)?;
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let turn = payload.into_turn()?;

    let envelope = state.orchestrator.process(&turn, &caller).await?;
    Ok(Json(envelope))
}

/// Check the bearer token and work out who is calling.
///
/// `x-user-id` is only trusted when a token is configured and matched.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<Caller, ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(Caller::anonymous());
    };

    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized);
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token != expected {
        return Err(ApiError::Unauthorized);
    }

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty());

    Ok(match user_id {
        Some(id) => Caller::authenticated(id),
        None => Caller::anonymous(),
    })
}

impl TurnPayload {
    fn into_turn(self) -> Result<TurnRequest, ApiError> {
        let mut turn = TurnRequest::new(self.text).with_history(self.history);

        for attachment in self.attachments {
            let data = STANDARD.decode(attachment.data.trim()).map_err(|e| {
                ApiError::BadRequest(format!(
                    "attachment '{}' is not valid base64: {}",
                    attachment.file_name, e
                ))
            })?;
            turn = turn.with_attachment(Attachment::new(
                attachment.file_name,
                attachment.media_type,
                data,
            ));
        }

        turn.context = self.context;
        turn.system_instruction = self.system_instruction;
        turn.mode = self.mode;
        turn.provider = self.provider;
        turn.language = self.language;
        turn.utc_offset_minutes = self.utc_offset_minutes;
        Ok(turn)
    }
}

#[derive(Debug)]
enum ApiError {
    Unauthorized,
    BadRequest(String),
    Generation(GenerationError),
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        ApiError::Generation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            ApiError::Unauthorized => {
                warn!("Unauthorized request");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), "auth_error")
            }
            ApiError::BadRequest(message) => {
                warn!("Rejected malformed turn: {}", message);
                (StatusCode::BAD_REQUEST, message, "invalid_request")
            }
            ApiError::Generation(err) => {
                error!(provider = %err.provider, attempts = err.attempts, "Turn failed: {}", err);
                (StatusCode::BAD_GATEWAY, err.provider_message(), "generation_error")
            }
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": kind
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use mock_brain::EchoBrain;

    fn state(token: Option<&str>) -> AppState {
        AppState {
            api_token: token.map(str::to_string),
            orchestrator: Arc::new(TurnOrchestrator::new(Arc::new(EchoBrain::new()))),
        }
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_authorize_without_token_is_anonymous() {
        let caller = authorize(&state(None), &headers(&[("x-user-id", "u1")])).unwrap();
        assert!(!caller.is_authenticated());
    }

    #[test]
    fn test_authorize_with_token() {
        let state = state(Some("secret"));

        let caller = authorize(
            &state,
            &headers(&[("authorization", "Bearer secret"), ("x-user-id", "u1")]),
        )
        .unwrap();
        assert_eq!(caller.user_id(), Some("u1"));

        let caller = authorize(&state, &headers(&[("authorization", "Bearer secret")])).unwrap();
        assert!(!caller.is_authenticated());

        assert!(matches!(
            authorize(&state, &headers(&[("authorization", "Bearer wrong")])),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            authorize(&state, &HeaderMap::new()),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_payload_into_turn() {
        let payload: TurnPayload = serde_json::from_value(serde_json::json!({
            "text": "convert this to pdf",
            "history": [{"role": "model", "content": "Hi!"}],
            "attachments": [{"filename": "notes.docx", "media_type": "application/msword", "data": "UEs="}],
            "mode": "FILE_CONVERSION",
            "utc_offset_minutes": 330
        }))
        .unwrap();

        let turn = payload.into_turn().unwrap();
        assert_eq!(turn.text, "convert this to pdf");
        assert_eq!(turn.history.len(), 1);
        assert_eq!(turn.attachments[0].file_name, "notes.docx");
        assert_eq!(turn.attachments[0].data, b"PK".to_vec());
        assert_eq!(turn.mode, Some(Mode::FileConversion));
        assert_eq!(turn.utc_offset_minutes, Some(330));
    }

    #[test]
    fn test_bad_base64_is_rejected() {
        let payload: TurnPayload = serde_json::from_value(serde_json::json!({
            "text": "hi",
            "attachments": [{"file_name": "a.png", "media_type": "image/png", "data": "!!!"}]
        }))
        .unwrap();

        assert!(matches!(payload.into_turn(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_generation_error_maps_to_bad_gateway() {
        let err = ApiError::Generation(GenerationError {
            provider: "gemini".to_string(),
            attempts: 3,
            source: orchestrator::BrainError::Timeout,
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
