use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

use crate::error::ScanError;

use super::frame::Frame;
use super::reconcile::{DisposalBin, Severity};

/// Raw result from the classification endpoint, snake_case on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationResult {
    pub waste_type: String,
    pub category: String,
    pub bin: BinField,
    pub tip: String,
    pub recyclable: bool,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Explicit severity from the classifier, overriding the
    /// recyclable-derived default when present.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// The endpoint has shipped two shapes for `bin`: a structured object and a
/// plain bin name. Accept both; normalization happens in reconciliation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Structured(DisposalBin),
    Name(String),
}

/// One frame in, one classification out. Implementations must not retry
/// internally; retries are the capture loop's decision at the next tick.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, frame: &Frame) -> Result<ClassificationResult, ScanError>;
}

/// Classifier backed by the HTTP prediction endpoint: a single multipart POST
/// with one part named `file`.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ScanError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, frame: &Frame) -> Result<ClassificationResult, ScanError> {
        if frame.bytes.is_empty() {
            return Err(ScanError::NoFrameAvailable);
        }

        let part = Part::bytes(frame.bytes.clone())
            .file_name(frame.file_name.clone())
            .mime_str("image/jpeg")
            .map_err(|err| ScanError::Transport(err.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| ScanError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Service {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| ScanError::Transport(err.to_string()))?;
        debug!("classifier response: {body}");

        parse_result(&body)
    }
}

pub(crate) fn parse_result(body: &str) -> Result<ClassificationResult, ScanError> {
    serde_json::from_str(body).map_err(|err| ScanError::malformed(err.to_string()))
}
