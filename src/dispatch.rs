//! Prompt dispatch and bounded retry around the generation service.
//!
//! Selects the instruction template, composes the prompt, and submits it to
//! the generation capability. Overload failures are retried with exponential
//! backoff; everything else fails fast. Failures stay structured here and
//! are rendered to user-facing text only at the HTTP boundary.

use crate::ai::GenerationService;
use crate::models::Gender;
use crate::prompts;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Terminal dispatch failures. The `Display` text of each variant is the
/// exact sentence shown to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error(
        "Error: GEMINI_API_KEY not found in environment variables. Please check your .env file."
    )]
    MissingApiKey,

    #[error("Sorry, the AI service is currently overloaded. Please try again in a few moments.")]
    OverloadExhausted,

    #[error("Sorry, I encountered an error: {0}")]
    Upstream(String),

    #[error("Sorry, unable to get a response after multiple attempts. Please try again later.")]
    NoResponse,
}

/// Overload markers in the upstream failure text that make an attempt
/// retryable.
fn is_overload(detail: &str) -> bool {
    detail.contains("503") || detail.to_lowercase().contains("overloaded")
}

/// Dispatch core. Holds no mutable state; each call runs an independent
/// attempt loop.
pub struct Dispatcher {
    service: Option<Box<dyn GenerationService>>,
}

impl Dispatcher {
    pub fn new(service: Box<dyn GenerationService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// Dispatcher with no generation capability behind it. Every call
    /// reports the missing credential without touching the network.
    pub fn unconfigured() -> Self {
        Self { service: None }
    }

    /// Submit a styling request and return the generated text or a
    /// structured failure.
    ///
    /// Up to three attempts are made. Overload failures back off 1s then 2s
    /// before retrying; any other failure is terminal on first sight.
    pub async fn dispatch(
        &self,
        message: &str,
        gender: Gender,
    ) -> std::result::Result<String, DispatchError> {
        let Some(service) = self.service.as_deref() else {
            warn!("Rejecting request: GEMINI_API_KEY is not configured");
            return Err(DispatchError::MissingApiKey);
        };

        let instruction = prompts::instruction_for(gender, message);
        let prompt = prompts::compose_prompt(instruction, message);

        let mut backoff = INITIAL_BACKOFF;
        for attempt in 1..=MAX_ATTEMPTS {
            match service.generate(&prompt).await {
                Ok(text) => {
                    info!(
                        "Generated response ({} chars) on attempt {}/{}",
                        text.len(),
                        attempt,
                        MAX_ATTEMPTS
                    );
                    return Ok(text);
                }
                Err(e) => {
                    let detail = e.to_string();
                    if !is_overload(&detail) {
                        error!("AI error: {}", detail);
                        return Err(DispatchError::Upstream(detail));
                    }
                    if attempt == MAX_ATTEMPTS {
                        error!("Model still overloaded after {} attempts", MAX_ATTEMPTS);
                        return Err(DispatchError::OverloadExhausted);
                    }
                    warn!(
                        "Model overloaded. Retrying in {:?} (attempt {}/{})",
                        backoff, attempt, MAX_ATTEMPTS
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }

        // Every loop iteration returns or retries, so this is unreachable;
        // kept as the terminal state of the attempt loop.
        Err(DispatchError::NoResponse)
    }

    /// String-typed boundary used by the HTTP layer: failures are flattened
    /// to their user-facing sentence, so this never fails.
    pub async fn generate_styling_response(&self, message: &str, gender: Gender) -> String {
        match self.dispatch(message, gender).await {
            Ok(text) => text,
            Err(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerationClient;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    fn dispatcher_with(mock: &MockGenerationClient) -> Dispatcher {
        Dispatcher::new(Box::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let mock = MockGenerationClient::new().with_response("• White blouse + ...");
        let dispatcher = dispatcher_with(&mock);

        let text = dispatcher
            .dispatch("wedding outfit", Gender::Women)
            .await
            .unwrap();
        assert_eq!(text, "• White blouse + ...");
        assert_eq!(mock.get_call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_overload_with_exponential_backoff() {
        let mock = MockGenerationClient::new()
            .with_error("Gemini API error (status 503 Service Unavailable): busy")
            .with_error("Gemini API error (status 503 Service Unavailable): busy")
            .with_response("third time lucky");
        let dispatcher = dispatcher_with(&mock);

        let start = Instant::now();
        let text = dispatcher
            .dispatch("office outfit", Gender::Men)
            .await
            .unwrap();

        assert_eq!(text, "third time lucky");
        assert_eq!(mock.get_call_count(), 3);
        // Paused clock advances only inside the backoff sleeps: 1s + 2s.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_exhausts_after_three_attempts() {
        let mock = MockGenerationClient::new()
            .with_error("model is Overloaded")
            .with_error("model is Overloaded")
            .with_error("model is Overloaded")
            .with_response("never reached");
        let dispatcher = dispatcher_with(&mock);

        let err = dispatcher
            .dispatch("party outfit", Gender::Unisex)
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::OverloadExhausted);
        assert_eq!(mock.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_non_overload_failure_is_terminal() {
        let mock = MockGenerationClient::new()
            .with_error("invalid request")
            .with_response("never reached");
        let dispatcher = dispatcher_with(&mock);

        let err = dispatcher
            .dispatch("beach outfit", Gender::Women)
            .await
            .unwrap_err();

        match &err {
            DispatchError::Upstream(detail) => assert!(detail.contains("invalid request")),
            other => panic!("expected Upstream, got {:?}", other),
        }
        assert_eq!(mock.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_makes_no_calls() {
        let dispatcher = Dispatcher::unconfigured();

        let err = dispatcher
            .dispatch("wedding outfit", Gender::Men)
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::MissingApiKey);
    }

    #[tokio::test]
    async fn test_flattened_boundary_renders_failure_text() {
        let mock = MockGenerationClient::new().with_error("invalid request");
        let dispatcher = dispatcher_with(&mock);

        let text = dispatcher
            .generate_styling_response("gala outfit", Gender::Women)
            .await;
        assert_eq!(text, "Sorry, I encountered an error: invalid request");
    }

    #[test]
    fn test_overload_marker_detection() {
        assert!(is_overload("status 503"));
        assert!(is_overload("The model is OVERLOADED right now"));
        assert!(!is_overload("invalid request"));
        assert!(!is_overload("status 500"));
    }
}
