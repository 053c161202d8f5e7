use tracing::debug;

use crate::document::{Placement, StepDocument};
use crate::domain::{SampleId, Workflow};
use crate::error::PrepdocError;
use crate::extract::{Record, extract};
use crate::lims::{ArtifactRecord, LimsClient};
use crate::schema::FieldSchema;

/// Static description of one step in a workflow: which process types count
/// as this step, whether a sample may legitimately have skipped it, and the
/// schemas its document is extracted with.
#[derive(Debug, Clone)]
pub struct StepSpec {
    pub step_type: &'static str,
    pub process_types: &'static [&'static str],
    pub optional: bool,
    pub process_schema: FieldSchema,
    pub artifact_schema: FieldSchema,
    pub with_placement: bool,
}

impl StepSpec {
    pub fn required(step_type: &'static str, process_types: &'static [&'static str]) -> Self {
        Self {
            step_type,
            process_types,
            optional: false,
            process_schema: FieldSchema::new(),
            artifact_schema: FieldSchema::new(),
            with_placement: false,
        }
    }

    pub fn optional(step_type: &'static str, process_types: &'static [&'static str]) -> Self {
        Self {
            optional: true,
            ..Self::required(step_type, process_types)
        }
    }

    pub fn process_schema(mut self, schema: FieldSchema) -> Self {
        self.process_schema = schema;
        self
    }

    pub fn artifact_schema(mut self, schema: FieldSchema) -> Self {
        self.artifact_schema = schema;
        self
    }

    pub fn with_placement(mut self) -> Self {
        self.with_placement = true;
        self
    }
}

/// Builds the step document for one (sample, step) pair. Returns `None` when
/// an optional step never ran; a required step that never ran is a
/// `MissingArtifact` error. Validation failures are fatal for the sample —
/// incomplete lab metadata must not silently produce a document.
pub fn build_step_document(
    lims: &dyn LimsClient,
    sample_id: &SampleId,
    prep: &str,
    workflow: Workflow,
    spec: &StepSpec,
) -> Result<Option<StepDocument>, PrepdocError> {
    let artifact = lims.latest_artifact(sample_id, spec.process_types)?;

    let Some(artifact) = artifact else {
        if spec.optional {
            debug!(
                sample = %sample_id,
                step_type = spec.step_type,
                "optional step never ran, skipping"
            );
            return Ok(None);
        }
        return Err(PrepdocError::MissingArtifact {
            sample_id: sample_id.to_string(),
            step_type: spec.step_type.to_string(),
            process_types: spec.process_types.join(", "),
        });
    };

    let fields = extract_merged(spec, &artifact)
        .map_err(|err| err.in_step(sample_id.as_str(), spec.step_type))?;

    let placement = if spec.with_placement {
        Placement {
            well_position: artifact.well_position.clone(),
            container_name: artifact.container_name.clone(),
            container_id: artifact.container_id.clone(),
            container_type: artifact.container_type.clone(),
            date_run: artifact.parent_process.date_run,
        }
    } else {
        Placement::default()
    };

    Ok(Some(StepDocument::new(
        prep.to_string(),
        spec.step_type,
        workflow,
        sample_id.clone(),
        placement,
        fields,
    )))
}

/// Process-level and artifact-level records merged into one field set.
/// Artifact values win on collision: they describe the actual physical unit.
fn extract_merged(spec: &StepSpec, artifact: &ArtifactRecord) -> Result<Record, PrepdocError> {
    let mut fields = if spec.process_schema.is_empty() {
        Record::new()
    } else {
        extract(&spec.process_schema, &artifact.parent_process.udf)?
    };
    if !spec.artifact_schema.is_empty() {
        let artifact_fields = extract(&spec.artifact_schema, &artifact.udf)?;
        fields.extend(artifact_fields);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::domain::{ProcessId, UdfMap, UdfValue};
    use crate::lims::ParentProcess;
    use crate::schema::{FieldKind, FieldSpec};

    struct OneArtifactLims {
        artifact: Option<ArtifactRecord>,
    }

    impl LimsClient for OneArtifactLims {
        fn samples_for_process(
            &self,
            _process_id: &ProcessId,
        ) -> Result<Vec<SampleId>, PrepdocError> {
            Ok(Vec::new())
        }

        fn latest_artifact(
            &self,
            _sample_id: &SampleId,
            _process_types: &[&str],
        ) -> Result<Option<ArtifactRecord>, PrepdocError> {
            Ok(self.artifact.clone())
        }
    }

    fn sample() -> SampleId {
        "S1".parse().unwrap()
    }

    fn artifact_with(
        process_udfs: &[(&str, UdfValue)],
        artifact_udfs: &[(&str, UdfValue)],
    ) -> ArtifactRecord {
        let to_map = |entries: &[(&str, UdfValue)]| -> UdfMap {
            entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect()
        };
        ArtifactRecord {
            artifact_id: "2-1".to_string(),
            sample_ids: vec![sample()],
            udf: to_map(artifact_udfs),
            well_position: Some("A:1".to_string()),
            container_name: Some("plate-1".to_string()),
            container_id: None,
            container_type: Some("96 well plate".to_string()),
            parent_process: ParentProcess {
                process_id: "24-100".parse().unwrap(),
                process_type: "Fragment DNA (TruSeq DNA)".to_string(),
                started_at: None,
                date_run: None,
                udf: to_map(process_udfs),
            },
        }
    }

    #[test]
    fn required_step_without_artifact_fails() {
        let lims = OneArtifactLims { artifact: None };
        let spec = StepSpec::required("end_repair", &["End-Repair and A-tailing (TruSeq DNA)"]);
        let err = build_step_document(&lims, &sample(), "S1_P1", Workflow::Wgs, &spec).unwrap_err();
        assert_matches!(
            err,
            PrepdocError::MissingArtifact { sample_id, step_type, .. }
                if sample_id == "S1" && step_type == "end_repair"
        );
    }

    #[test]
    fn optional_step_without_artifact_is_skipped() {
        let lims = OneArtifactLims { artifact: None };
        let spec = StepSpec::optional("buffer_exchange", &["Buffer Exchange v1"]);
        let doc = build_step_document(&lims, &sample(), "S1_P1", Workflow::Twist, &spec).unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn artifact_fields_win_over_process_fields() {
        let lims = OneArtifactLims {
            artifact: Some(artifact_with(
                &[("Concentration", UdfValue::Float(10.0))],
                &[("Concentration", UdfValue::Float(99.0))],
            )),
        };
        let conc = FieldSchema::new().field(FieldSpec::required(
            "concentration",
            "Concentration",
            FieldKind::Float,
        ));
        let spec = StepSpec::required("fragment_dna", &["Fragment DNA (TruSeq DNA)"])
            .process_schema(conc.clone())
            .artifact_schema(conc);

        let doc = build_step_document(&lims, &sample(), "S1_P1", Workflow::Wgs, &spec)
            .unwrap()
            .unwrap();
        assert_eq!(
            doc.fields.get("concentration"),
            Some(&UdfValue::Float(99.0))
        );
    }

    #[test]
    fn validation_failure_names_sample_and_step() {
        let lims = OneArtifactLims {
            artifact: Some(artifact_with(&[], &[])),
        };
        let spec = StepSpec::required("fragment_dna", &["Fragment DNA (TruSeq DNA)"])
            .artifact_schema(FieldSchema::new().field(FieldSpec::required(
                "concentration",
                "Concentration",
                FieldKind::Float,
            )));

        let err = build_step_document(&lims, &sample(), "S1_P1", Workflow::Wgs, &spec).unwrap_err();
        assert_matches!(
            err,
            PrepdocError::StepAssembly { sample_id, step_type, .. }
                if sample_id == "S1" && step_type == "fragment_dna"
        );
    }

    #[test]
    fn placement_is_attached_when_requested() {
        let lims = OneArtifactLims {
            artifact: Some(artifact_with(&[], &[])),
        };
        let spec =
            StepSpec::required("fragment_dna", &["Fragment DNA (TruSeq DNA)"]).with_placement();

        let doc = build_step_document(&lims, &sample(), "S1_P1", Workflow::Wgs, &spec)
            .unwrap()
            .unwrap();
        assert_eq!(doc.placement.well_position.as_deref(), Some("A:1"));
        assert_eq!(doc.placement.container_type.as_deref(), Some("96 well plate"));
        assert_eq!(doc.id, "S1_P1_fragment_dna");
    }
}
