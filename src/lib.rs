//! Backend for the ChicEnsemble style assistant
//!
//! Exposes a small HTTP API that forwards styling requests to Gemini with a
//! gender-specific system instruction and masks transient overload failures
//! with a bounded retry loop.

pub mod ai;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
