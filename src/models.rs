//! Data models and structures
//!
//! Defines the core data structures for styling requests, API replies,
//! the in-memory request log, and environment configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Caller-supplied hint choosing which instruction template to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
    Unisex,
}

impl Gender {
    /// Map the wire value onto a template category. Anything other than the
    /// two known selectors (including an absent one) falls back to unisex.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("men") => Gender::Men,
            Some("women") => Gender::Women,
            _ => Gender::Unisex,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Men => "men",
            Gender::Women => "women",
            Gender::Unisex => "unisex",
        }
    }
}

/// A single inbound styling request after intake parsing.
///
/// The image attachment is accepted for wire compatibility but never
/// forwarded to the generation service.
#[derive(Debug, Clone)]
pub struct StyleRequest {
    pub message: String,
    pub gender: Gender,
    pub image: Option<Vec<u8>>,
}

/// Wire body for `POST /api/chat` (JSON or form-encoded).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default)]
    pub message: String,
    pub gender: Option<String>,
    pub image: Option<String>,
}

impl From<ChatRequestBody> for StyleRequest {
    fn from(body: ChatRequestBody) -> Self {
        Self {
            message: body.message,
            gender: Gender::parse(body.gender.as_deref()),
            image: body.image.map(String::into_bytes),
        }
    }
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChatReply {
    Success { response: String },
    Error { error: String },
}

/// Response body for `GET /messages`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesReply {
    pub total: u64,
    pub messages: Vec<RequestLogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub message: String,
    pub gender: Gender,
    pub received_at: DateTime<Utc>,
}

/// Bounded ring buffer of recent requests, owned by the intake layer.
///
/// `total` keeps counting past eviction, so it always equals the number of
/// requests processed since startup.
#[derive(Debug)]
pub struct RequestLog {
    entries: VecDeque<RequestLogEntry>,
    total: u64,
    capacity: usize,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            total: 0,
            capacity,
        }
    }

    pub fn push(&mut self, message: String, gender: Gender) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(RequestLogEntry {
            message,
            gender,
            received_at: Utc::now(),
        });
        self.total += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Recent entries, oldest first.
    pub fn recent(&self) -> Vec<RequestLogEntry> {
        self.entries.iter().cloned().collect()
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub port: u16,
    pub insecure_tls: bool,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| crate::Error::Config(format!("Invalid PORT value: {}", raw)))?,
            Err(_) => 8001,
        };

        Ok(Self {
            // A missing key is surfaced per-request by the dispatcher, not at startup.
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            port,
            insecure_tls: matches!(
                std::env::var("GEMINI_INSECURE_TLS").as_deref(),
                Ok("1") | Ok("true")
            ),
        })
    }
}
