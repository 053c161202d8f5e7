use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PrepdocError {
    #[error("invalid sample id: {0}")]
    InvalidSampleId(String),

    #[error("invalid process id: {0}")]
    InvalidProcessId(String),

    #[error("missing config file prepdoc.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("LIMS request failed: {0}")]
    LimsHttp(String),

    #[error("LIMS returned status {status}: {message}")]
    LimsStatus { status: u16, message: String },

    #[error("Arnold request failed: {0}")]
    ArnoldHttp(String),

    #[error("Arnold returned status {status}: {message}")]
    ArnoldStatus { status: u16, message: String },

    #[error("sample {sample_id}: no artifact found for required step \"{step_type}\" (process types: {process_types})")]
    MissingArtifact {
        sample_id: String,
        step_type: String,
        process_types: String,
    },

    #[error("required field \"{field}\" (UDF \"{udf}\") is missing")]
    MissingField { field: String, udf: String },

    #[error("field \"{field}\" (UDF \"{udf}\") has invalid value {value}: expected {expected}")]
    InvalidValue {
        field: String,
        udf: String,
        value: String,
        expected: &'static str,
    },

    #[error("sample {sample_id}, step \"{step_type}\": {source}")]
    StepAssembly {
        sample_id: String,
        step_type: String,
        #[source]
        source: Box<PrepdocError>,
    },
}

impl PrepdocError {
    /// Wraps a validation error with the sample/step it occurred in, so the
    /// operator can locate the offending LIMS record.
    pub fn in_step(self, sample_id: &str, step_type: &str) -> Self {
        PrepdocError::StepAssembly {
            sample_id: sample_id.to_string(),
            step_type: step_type.to_string(),
            source: Box::new(self),
        }
    }
}
