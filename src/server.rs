//! HTTP intake layer.
//!
//! Parses inbound chat requests (JSON or form-encoded), rejects empty
//! messages, records traffic in the bounded request log, and hands the rest
//! to the dispatch core. Failures from the core arrive pre-rendered as text
//! and ride the success envelope, matching the original API contract.

use crate::dispatch::Dispatcher;
use crate::models::{ChatReply, ChatRequestBody, Gender, MessagesReply, RequestLog, StyleRequest};
use axum::body::to_bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::info;

const LOG_CAPACITY: usize = 256;
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    log: Arc<Mutex<RequestLog>>,
    model: String,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, model: String) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            log: Arc::new(Mutex::new(RequestLog::new(LOG_CAPACITY))),
            model,
        }
    }
}

/// Build the service router. CORS is permissive because the browser
/// frontend is served from a different origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/chat", post(chat))
        .route("/messages", get(messages))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "ChicEnsemble Style Assistant API is running!",
        "endpoints": ["/api/chat"],
        "ai_model": state.model,
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn messages(State(state): State<AppState>) -> Json<MessagesReply> {
    let log = state.log.lock().unwrap();
    Json(MessagesReply {
        total: log.total(),
        messages: log.recent(),
    })
}

async fn chat(State(state): State<AppState>, req: Request) -> Json<ChatReply> {
    let request = match extract_style_request(req).await {
        Ok(request) => request,
        Err(error) => return Json(ChatReply::Error { error }),
    };

    if request.message.is_empty() {
        return Json(ChatReply::Error {
            error: "No message provided".to_string(),
        });
    }

    info!(
        "Chat request ({}, {} chars)",
        request.gender.as_str(),
        request.message.len()
    );

    state
        .log
        .lock()
        .unwrap()
        .push(request.message.clone(), request.gender);

    let response = state
        .dispatcher
        .generate_styling_response(&request.message, request.gender)
        .await;

    Json(ChatReply::Success { response })
}

/// Accept the chat body as JSON, urlencoded form, or multipart form data.
/// The original backend tried JSON first and fell back to form parsing;
/// here the content type picks the decoder.
async fn extract_style_request(req: Request) -> std::result::Result<StyleRequest, String> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| e.to_string())?;

        let mut message = String::new();
        let mut gender = None;
        let mut image = None;
        while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
            match field.name() {
                Some("message") => message = field.text().await.map_err(|e| e.to_string())?,
                Some("gender") => {
                    gender = Some(field.text().await.map_err(|e| e.to_string())?);
                }
                Some("image") => {
                    image = Some(field.bytes().await.map_err(|e| e.to_string())?.to_vec());
                }
                _ => {}
            }
        }

        return Ok(StyleRequest {
            message,
            gender: Gender::parse(gender.as_deref()),
            image,
        });
    }

    let bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| e.to_string())?;

    let body: ChatRequestBody = if content_type.starts_with("application/json") {
        serde_json::from_slice(&bytes).map_err(|e| e.to_string())?
    } else {
        // JSON first, urlencoded as fallback, mirroring the original intake.
        serde_json::from_slice(&bytes)
            .or_else(|_| serde_urlencoded::from_bytes(&bytes))
            .map_err(|e: serde_urlencoded::de::Error| e.to_string())?
    };

    Ok(body.into())
}
