use super::GenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted generation service for tests.
///
/// Queued outcomes are consumed in order; once the script is exhausted (or
/// when none was given) every call succeeds with a canned response.
#[derive(Clone)]
pub struct MockGenerationClient {
    script: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn with_error(self, detail: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(detail.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        *self.call_count.lock().unwrap() += 1;

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(detail)) => Err(Error::AiProvider(detail)),
            None => Ok("Here are 5 stylish outfit combinations".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_response() {
        let client = MockGenerationClient::new();
        let text = client.generate("prompt").await.unwrap();
        assert!(text.contains("outfit"));
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_scripted_outcomes_in_order() {
        let client = MockGenerationClient::new()
            .with_error("503 Service Unavailable")
            .with_response("second call wins");

        let err = client.generate("prompt").await.unwrap_err();
        assert!(err.to_string().contains("503"));

        let text = client.generate("prompt").await.unwrap();
        assert_eq!(text, "second call wins");
        assert_eq!(client.get_call_count(), 2);
    }
}
