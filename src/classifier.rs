use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier timed out")]
    Timeout,

    #[error("classifier unreachable: {0}")]
    Unreachable(String),

    #[error("classifier answered with status {0}")]
    Status(u16),

    #[error("malformed classifier response: {0}")]
    Malformed(String),

    #[error("classifier response has no predicted_class")]
    MissingClass,
}

impl ClassifierError {
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClassifierError::Timeout
        } else if e.is_decode() {
            ClassifierError::Malformed(e.to_string())
        } else {
            ClassifierError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image_ref: &str) -> Result<String, ClassifierError>;
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predicted_class: Option<String>,
}

//GET <base_url>/<image_ref>
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Unreachable(e.to_string()))?;
        Ok(HttpClassifier {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, image_ref: &str) -> String {
        format!("{}/{}", self.base_url, image_ref)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image_ref: &str) -> Result<String, ClassifierError> {
        let url = self.url_for(image_ref);
        log::debug!("classifying image {} via {}", image_ref, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ClassifierError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(ClassifierError::from_transport)?;
        let payload: PredictResponse = serde_json::from_slice(&body)
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;
        payload.predicted_class.ok_or(ClassifierError::MissingClass)
    }
}
