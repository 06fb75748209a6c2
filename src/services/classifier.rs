use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClassifierConfig;
use crate::kernel::intent::{Classification, IntentClassifier};

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed classifier reply: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    intent: String,
    /// Label before the server's own confidence gate; the router applies its own.
    #[serde(default)]
    raw_intent: Option<String>,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    runner_up: Option<f32>,
    /// Top-2 gap, for servers that report it instead of `runner_up`.
    #[serde(default)]
    margin: Option<f32>,
}

impl PredictResponse {
    fn into_classification(self) -> Classification {
        let label = match self.raw_intent {
            Some(raw) if self.intent.is_empty() && !raw.is_empty() => raw,
            _ => self.intent,
        };
        let result = Classification::new(&label, self.confidence);
        let runner_up = self
            .runner_up
            .or_else(|| self.margin.map(|margin| (self.confidence - margin).max(0.0)));
        match runner_up {
            Some(second) => result.with_runner_up(second),
            None => result,
        }
    }
}

/// Parses a `/predict` reply body.
pub fn parse_reply(body: &str) -> Result<Classification, ClassifierError> {
    let reply: PredictResponse = serde_json::from_str(body)?;
    Ok(reply.into_classification())
}

/// Blocking client for the `/predict` endpoint.
///
/// Called from inside a kernel step, so the host must run steps where
/// blocking is allowed (`block_in_place` or a plain thread).
pub struct HttpIntentClassifier {
    client: Client,
    url: String,
}

impl HttpIntentClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs)) // hard network timeout
            .build()?;
        Ok(Self { client, url: config.url.clone() })
    }

    pub fn predict(&self, text: &str) -> Result<Classification, ClassifierError> {
        let response = self.client.post(&self.url).json(&PredictRequest { text }).send()?;
        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status()));
        }
        let body = response.text()?;
        parse_reply(&body)
    }
}

impl IntentClassifier for HttpIntentClassifier {
    fn classify(&self, text: &str) -> Option<Classification> {
        match self.predict(text) {
            Ok(result) => {
                debug!(intent = %result.intent, confidence = result.confidence, "classifier reply");
                Some(result)
            }
            Err(e) => {
                warn!("classifier unavailable: {}", e);
                None
            }
        }
    }
}

/// Used when no classifier URL is configured. Everything falls back to "not sure".
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineClassifier;

impl IntentClassifier for OfflineClassifier {
    fn classify(&self, _text: &str) -> Option<Classification> {
        None
    }
}
