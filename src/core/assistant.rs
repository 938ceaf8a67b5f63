//! Remote assistant client.
//!
//! The backend is an opaque HTTP endpoint taking `{"text": ...}` and replying
//! with the answer in `answer` (the `/ask` service) or `response` (the
//! `/student` lookup service).

use crate::config::Settings;
use crate::core::traits::RemoteAssistant;
use crate::error::AssistantError;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize, Debug)]
struct AskRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct AskResponse {
    answer: Option<String>,
    response: Option<String>,
    error: Option<String>,
}

impl AskResponse {
    fn into_text(self) -> Result<String, AssistantError> {
        if let Some(text) = self.answer.or(self.response) {
            Ok(text)
        } else if let Some(error) = self.error {
            Ok(format!("I encountered an error: {error}"))
        } else {
            Err(AssistantError::EmptyReply)
        }
    }
}

pub struct HttpRemoteAssistant {
    client: reqwest::Client,
    endpoint: String,
}

#[injectable(RemoteAssistant)]
impl HttpRemoteAssistant {
    #[inject]
    pub fn create(settings: Ref<Settings>) -> HttpRemoteAssistant {
        HttpRemoteAssistant::new(settings.assistant_url.clone(), settings.assistant_timeout)
    }
}

impl HttpRemoteAssistant {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> HttpRemoteAssistant {
        let client = reqwest::Client::builder()
            .user_agent(concat!("remi-assistant/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("failed to configure HTTP client ({e}), using defaults");
                reqwest::Client::new()
            });

        HttpRemoteAssistant {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RemoteAssistant for HttpRemoteAssistant {
    async fn ask(&self, text: &str) -> Result<String, AssistantError> {
        debug!("asking {} ({} chars)", self.endpoint, text.chars().count());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { text })
            .send()
            .await
            .map_err(AssistantError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Status(status.as_u16()));
        }

        response
            .json::<AskResponse>()
            .await
            .map_err(AssistantError::Decode)?
            .into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<String, AssistantError> {
        serde_json::from_str::<AskResponse>(json).unwrap().into_text()
    }

    #[test]
    fn test_answer_field() {
        assert_eq!(parse(r#"{"answer":"Study hard."}"#).unwrap(), "Study hard.");
    }

    #[test]
    fn test_response_field() {
        assert_eq!(
            parse(r#"{"response":"Amara is pursuing Law.","similarity":0.8}"#).unwrap(),
            "Amara is pursuing Law."
        );
    }

    #[test]
    fn test_answer_preferred_over_response() {
        assert_eq!(parse(r#"{"answer":"a","response":"b"}"#).unwrap(), "a");
    }

    #[test]
    fn test_error_field_is_reported() {
        assert_eq!(
            parse(r#"{"error":"quota exceeded"}"#).unwrap(),
            "I encountered an error: quota exceeded"
        );
    }

    #[test]
    fn test_reply_without_text() {
        assert!(matches!(parse("{}"), Err(AssistantError::EmptyReply)));
    }

    #[test]
    fn test_create_uses_settings() {
        let settings = Settings {
            assistant_url: "http://assistant.test/student".to_owned(),
            ..Settings::default()
        };

        let assistant = HttpRemoteAssistant::create(Ref::new(settings));
        assert_eq!(assistant.endpoint, "http://assistant.test/student");
    }
}
