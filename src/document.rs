use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{ProcessId, SampleId, Workflow};
use crate::extract::Record;

/// Prep identity: one sample's passage through one workflow, anchored at the
/// process that triggered the run. `{sample_id}_{process_id}`.
pub fn prep_id(sample_id: &SampleId, process_id: &ProcessId) -> String {
    format!("{sample_id}_{process_id}")
}

/// Container/well metadata attached when a step opts in. All fields come
/// from the artifact's placement, not its UDFs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Placement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub well_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_run: Option<NaiveDate>,
}

/// The assembled, validated record of one process step for one sample, in
/// the exact shape the Arnold store ingests: flat object, `_id` first,
/// absent fields omitted.
#[derive(Debug, Clone, Serialize)]
pub struct StepDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub prep_id: String,
    pub step_type: String,
    pub workflow: Workflow,
    pub sample_id: SampleId,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(flatten)]
    pub fields: Record,
}

impl StepDocument {
    /// Identity is fully determined by (sample, triggering process, step
    /// type); assembling the same triple twice yields the same `_id`.
    pub fn new(
        prep_id: String,
        step_type: &str,
        workflow: Workflow,
        sample_id: SampleId,
        placement: Placement,
        fields: Record,
    ) -> Self {
        Self {
            id: format!("{prep_id}_{step_type}"),
            prep_id,
            step_type: step_type.to_string(),
            workflow,
            sample_id,
            placement,
            fields,
        }
    }
}

/// Prep-level record posted to `{host}/preps`. Used by the microbial
/// pipeline; identity is the prep id itself.
#[derive(Debug, Clone, Serialize)]
pub struct PrepDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub prep_id: String,
    pub workflow: Workflow,
    pub sample_id: SampleId,
    #[serde(flatten)]
    pub fields: Record,
}

impl PrepDocument {
    pub fn new(prep_id: String, workflow: Workflow, sample_id: SampleId, fields: Record) -> Self {
        Self {
            id: prep_id.clone(),
            prep_id,
            workflow,
            sample_id,
            fields,
        }
    }
}
