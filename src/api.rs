use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ApiConfig;

/// Shown in place of a reply when the chat request fails.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },
    #[error("could not decode reply: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    sender: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

impl ConnectionStatus {
    fn new(connected: bool, message: &str) -> Self {
        ConnectionStatus {
            connected,
            message: message.to_string(),
        }
    }

    /// Status before the first probe has finished.
    pub fn checking() -> Self {
        Self::new(false, "Connecting...")
    }

    pub fn label(&self) -> &'static str {
        if self.connected {
            "Online"
        } else {
            "Offline"
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl HealthApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not build configured HTTP client, using defaults");
                reqwest::Client::new()
            });

        HealthApiClient {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        let url = self.endpoint("chat");
        tracing::debug!(%url, chars = message.len(), "sending chat message");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                message,
                sender: "user",
            })
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        let reply: ChatReply = response.json().await.map_err(ApiError::Decode)?;
        if let Some(intent) = &reply.intent {
            tracing::info!(
                intent = %intent,
                confidence = reply.confidence.unwrap_or_default(),
                "intent detected"
            );
        }
        Ok(reply)
    }

    /// Probes the tips endpoint, falling back to the test endpoint only when
    /// the first request could not be made at all.
    pub async fn check_connection(&self) -> ConnectionStatus {
        let url = self.endpoint("health-tips");
        tracing::info!(%url, "checking backend connection");

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("backend connected");
                ConnectionStatus::new(true, "Connected")
            }
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "backend returned error");
                ConnectionStatus::new(false, "Service unavailable")
            }
            Err(e) => {
                tracing::warn!(error = %e, "connection check failed, trying fallback");
                self.check_fallback().await
            }
        }
    }

    async fn check_fallback(&self) -> ConnectionStatus {
        match self.client.get(self.endpoint("test")).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("fallback connection successful");
                ConnectionStatus::new(true, "Connected (fallback)")
            }
            Ok(_) => ConnectionStatus::new(false, "Connection failed"),
            Err(e) => {
                tracing::error!(error = %e, "fallback also failed");
                ConnectionStatus::new(false, "Backend offline")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let client = HealthApiClient::new(&ApiConfig {
            base_url: "http://localhost:5000/api/health/".into(),
            timeout_secs: 5,
        });
        assert_eq!(client.base_url(), "http://localhost:5000/api/health");
        assert_eq!(client.endpoint("chat"), "http://localhost:5000/api/health/chat");
    }

    #[test]
    fn reply_without_intent_decodes() {
        let reply: ChatReply = serde_json::from_str(r#"{"response":"Rest"}"#).unwrap();
        assert_eq!(reply.intent, None);
        assert_eq!(reply.confidence, None);
    }
}
