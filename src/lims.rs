use std::cmp::Reverse;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{ProcessId, SampleId, UdfMap};
use crate::error::PrepdocError;

/// The process step that produced an artifact, with its own UDF map.
#[derive(Debug, Clone, Deserialize)]
pub struct ParentProcess {
    pub process_id: ProcessId,
    pub process_type: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_run: Option<NaiveDate>,
    #[serde(default)]
    pub udf: UdfMap,
}

/// One artifact as served by the LIMS: an aliquot, pool or derived analyte
/// with its UDF map, placement and a back-reference to its parent process.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactRecord {
    pub artifact_id: String,
    pub sample_ids: Vec<SampleId>,
    #[serde(default)]
    pub udf: UdfMap,
    #[serde(default)]
    pub well_position: Option<String>,
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub container_type: Option<String>,
    pub parent_process: ParentProcess,
}

/// Read-only view of the LIMS. Absence of a matching artifact is a value,
/// not an error; the caller owns the optional/required decision.
pub trait LimsClient {
    fn samples_for_process(&self, process_id: &ProcessId) -> Result<Vec<SampleId>, PrepdocError>;

    fn latest_artifact(
        &self,
        sample_id: &SampleId,
        process_types: &[&str],
    ) -> Result<Option<ArtifactRecord>, PrepdocError>;
}

/// Picks the artifact from the most recently executed step. Ties on the
/// timestamp are broken by the highest numeric process id; ids without a
/// numeric tail sort after numeric ones, by id string.
pub fn select_latest(mut artifacts: Vec<ArtifactRecord>) -> Option<ArtifactRecord> {
    artifacts.sort_by_key(|artifact| {
        let process = &artifact.parent_process;
        (
            Reverse(process.started_at),
            Reverse(process.process_id.numeric_tail()),
            Reverse(process.process_id.as_str().to_string()),
        )
    });
    artifacts.into_iter().next()
}

#[derive(Clone)]
pub struct LimsHttpClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl LimsHttpClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self, PrepdocError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("prepdoc/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PrepdocError::LimsHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| PrepdocError::LimsHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PrepdocError> {
        debug!(url, "lims.request");
        let response = self
            .client
            .get(url)
            .query(query)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .map_err(|err| PrepdocError::LimsHttp(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "LIMS request failed".to_string());
            return Err(PrepdocError::LimsStatus { status, message });
        }

        response
            .json()
            .map_err(|err| PrepdocError::LimsHttp(err.to_string()))
    }
}

impl LimsClient for LimsHttpClient {
    fn samples_for_process(&self, process_id: &ProcessId) -> Result<Vec<SampleId>, PrepdocError> {
        let url = format!("{}/api/processes/{}/samples", self.base_url, process_id);
        self.get_json(&url, &[])
    }

    fn latest_artifact(
        &self,
        sample_id: &SampleId,
        process_types: &[&str],
    ) -> Result<Option<ArtifactRecord>, PrepdocError> {
        let url = format!("{}/api/samples/{}/artifacts", self.base_url, sample_id);
        let query: Vec<(&str, &str)> = process_types
            .iter()
            .map(|process_type| ("process_type", *process_type))
            .collect();
        let artifacts: Vec<ArtifactRecord> = self.get_json(&url, &query)?;
        Ok(select_latest(artifacts))
    }
}
