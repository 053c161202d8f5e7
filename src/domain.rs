use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PrepdocError;

/// Opaque LIMS sample identifier (e.g. "ACC1234A1").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleId(String);

impl SampleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SampleId {
    type Err = PrepdocError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !is_valid {
            return Err(PrepdocError::InvalidSampleId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Opaque LIMS process (step execution) identifier (e.g. "24-123456").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric tail of the id, used for deterministic tie-breaking when two
    /// steps share a timestamp. "24-123456" -> 123456.
    pub fn numeric_tail(&self) -> Option<u64> {
        let tail = self.0.rsplit('-').next().unwrap_or(&self.0);
        tail.parse().ok()
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProcessId {
    type Err = PrepdocError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
        if !is_valid {
            return Err(PrepdocError::InvalidProcessId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// The workflows a prep document can be assembled for. Prep workflows cover a
/// sample's library preparation; the sequencing variants cover run documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    Wgs,
    Twist,
    Microbial,
    #[serde(rename = "sars-cov-2")]
    SarsCov2,
    Rna,
    #[serde(rename = "novaseq")]
    NovaSeq,
    #[serde(rename = "novaseq-x")]
    NovaSeqX,
}

impl Workflow {
    /// Tag written into every document; matches the store's workflow vocabulary.
    pub fn tag(&self) -> &'static str {
        match self {
            Workflow::Wgs => "wgs",
            Workflow::Twist => "twist",
            Workflow::Microbial => "microbial",
            Workflow::SarsCov2 => "sars-cov-2",
            Workflow::Rna => "rna",
            Workflow::NovaSeq => "novaseq",
            Workflow::NovaSeqX => "novaseq-x",
        }
    }

}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One UDF value as stored by the LIMS. The LIMS serves everything as JSON;
/// untagged deserialization keeps numbers numeric and recognizes calendar-date
/// strings, while anything else stays a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UdfValue {
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Str(String),
}

impl fmt::Display for UdfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UdfValue::Int(value) => write!(f, "{value}"),
            UdfValue::Float(value) => write!(f, "{value}"),
            UdfValue::Date(value) => write!(f, "{value}"),
            UdfValue::Str(value) => write!(f, "{value}"),
        }
    }
}

/// A UDF map as attached to a process step or an artifact, keyed by the UDF
/// display name. BTreeMap keeps serialization order stable.
pub type UdfMap = BTreeMap<String, UdfValue>;

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_sample_id_valid() {
        let id: SampleId = " ACC1234A1 ".parse().unwrap();
        assert_eq!(id.as_str(), "ACC1234A1");
    }

    #[test]
    fn parse_sample_id_invalid() {
        let err = "ACC 1234".parse::<SampleId>().unwrap_err();
        assert_matches!(err, PrepdocError::InvalidSampleId(_));
        let err = "".parse::<SampleId>().unwrap_err();
        assert_matches!(err, PrepdocError::InvalidSampleId(_));
    }

    #[test]
    fn process_id_numeric_tail() {
        let id: ProcessId = "24-123456".parse().unwrap();
        assert_eq!(id.numeric_tail(), Some(123456));

        let id: ProcessId = "P1".parse().unwrap();
        assert_eq!(id.numeric_tail(), None);
    }

    #[test]
    fn workflow_tag_matches_store_vocabulary() {
        assert_eq!(Workflow::SarsCov2.tag(), "sars-cov-2");
        assert_eq!(Workflow::NovaSeqX.tag(), "novaseq-x");
        assert_eq!(
            serde_json::to_string(&Workflow::SarsCov2).unwrap(),
            "\"sars-cov-2\""
        );
    }

    #[test]
    fn udf_value_from_json() {
        let value: UdfValue = serde_json::from_str("42").unwrap();
        assert_eq!(value, UdfValue::Int(42));

        let value: UdfValue = serde_json::from_str("37.5").unwrap();
        assert_eq!(value, UdfValue::Float(37.5));

        let value: UdfValue = serde_json::from_str("\"2024-03-01\"").unwrap();
        assert_eq!(
            value,
            UdfValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );

        let value: UdfValue = serde_json::from_str("\"Qubit\"").unwrap();
        assert_eq!(value, UdfValue::Str("Qubit".to_string()));
    }

    #[test]
    fn udf_date_serializes_as_calendar_string() {
        let value = UdfValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"2024-03-01\"");
    }
}
