use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::info;

use crate::document::{PrepDocument, StepDocument};
use crate::error::PrepdocError;

/// Write-only view of the Arnold document store. One call is one batch
/// insert; the store owns upsert and duplicate-key semantics.
pub trait ArnoldClient {
    fn submit_steps(&self, documents: &[StepDocument]) -> Result<(), PrepdocError>;

    fn submit_preps(&self, documents: &[PrepDocument]) -> Result<(), PrepdocError>;
}

#[derive(Clone)]
pub struct ArnoldHttpClient {
    client: Client,
    host: String,
}

impl ArnoldHttpClient {
    pub fn new(host: &str) -> Result<Self, PrepdocError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("prepdoc/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PrepdocError::ArnoldHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| PrepdocError::ArnoldHttp(err.to_string()))?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    fn post_batch<T: Serialize>(&self, endpoint: &str, batch: &[T]) -> Result<(), PrepdocError> {
        let url = format!("{}/{}", self.host, endpoint);
        info!(url, count = batch.len(), "arnold.request");
        let response = self
            .client
            .post(&url)
            .json(batch)
            .send()
            .map_err(|err| PrepdocError::ArnoldHttp(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Arnold request failed".to_string());
            return Err(PrepdocError::ArnoldStatus { status, message });
        }
        Ok(())
    }
}

impl ArnoldClient for ArnoldHttpClient {
    fn submit_steps(&self, documents: &[StepDocument]) -> Result<(), PrepdocError> {
        self.post_batch("steps", documents)
    }

    fn submit_preps(&self, documents: &[PrepDocument]) -> Result<(), PrepdocError> {
        self.post_batch("preps", documents)
    }
}
