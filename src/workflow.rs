use crate::builder::{StepSpec, build_step_document};
use crate::document::{PrepDocument, StepDocument, prep_id};
use crate::domain::{ProcessId, SampleId, Workflow};
use crate::error::PrepdocError;
use crate::extract::extract;
use crate::lims::LimsClient;
use crate::schema::{FieldSchema, groups};

const RECEPTION_CONTROL: &[&str] = &["CG002 - Reception Control", "Reception Control v2"];
const BUFFER_EXCHANGE: &[&str] = &["Buffer Exchange v1", "Buffer Exchange v2"];

fn reception_control() -> StepSpec {
    StepSpec::required("reception_control", RECEPTION_CONTROL)
        .process_schema(FieldSchema::new().group(groups::RECEPTION))
}

/// The ordered step list for a workflow. This is static configuration:
/// changing a catalog is a deployment-time decision, not a runtime one.
pub fn steps(workflow: Workflow) -> Vec<StepSpec> {
    match workflow {
        Workflow::Wgs => wgs(),
        Workflow::Twist => twist(),
        Workflow::Microbial => microbial(),
        Workflow::SarsCov2 => sars_cov_2(),
        Workflow::Rna => rna(),
        Workflow::NovaSeq => novaseq(),
        Workflow::NovaSeqX => novaseq_x(),
    }
}

fn wgs() -> Vec<StepSpec> {
    vec![
        reception_control(),
        StepSpec::required("fragment_dna", &["Fragment DNA (TruSeq DNA)"])
            .process_schema(FieldSchema::new().group(groups::INSTRUMENT))
            .artifact_schema(FieldSchema::new().group(groups::VOLUMES)),
        StepSpec::required(
            "aliquot_samples_for_covaris",
            &["Aliquot Samples for Covaris", "Pooling and Clean-up (Cov) v1"],
        )
        .artifact_schema(FieldSchema::new().group(groups::AMOUNT).group(groups::VOLUMES)),
        StepSpec::required("end_repair", &["End-Repair and A-tailing (TruSeq DNA)"])
            .process_schema(FieldSchema::new().group(groups::INSTRUMENT))
            .artifact_schema(
                FieldSchema::new()
                    .group(groups::CONCENTRATION)
                    .group(groups::LIBRARY_SIZE),
            )
            .with_placement(),
    ]
}

fn twist() -> Vec<StepSpec> {
    vec![
        reception_control(),
        StepSpec::optional("buffer_exchange", BUFFER_EXCHANGE).artifact_schema(
            FieldSchema::new()
                .group(groups::VOLUMES)
                .group(groups::CONCENTRATION),
        ),
        StepSpec::required(
            "aliquot_samples_for_enzymatic_fragmentation",
            &["Aliquot samples for enzymatic fragmentation TWIST v2"],
        )
        .artifact_schema(FieldSchema::new().group(groups::AMOUNT).group(groups::VOLUMES)),
        StepSpec::optional(
            "enzymatic_fragmentation",
            &["Enzymatic fragmentation TWIST v2"],
        )
        .process_schema(FieldSchema::new().group(groups::INSTRUMENT)),
        StepSpec::required("kapa_library_preparation", &["KAPA Library Preparation TWIST v1"])
            .process_schema(FieldSchema::new().group(groups::INSTRUMENT).group(groups::PCR))
            .artifact_schema(
                FieldSchema::new()
                    .group(groups::CONCENTRATION)
                    .group(groups::LIBRARY_SIZE),
            )
            .with_placement(),
        StepSpec::required(
            "pool_samples_for_hybridization",
            &["Pool samples TWIST v2", "Pool samples TWIST v1"],
        )
        .artifact_schema(FieldSchema::new().group(groups::AMOUNT)),
        StepSpec::required("hybridize_library", &["Hybridize Library TWIST v2"])
            .process_schema(
                FieldSchema::new()
                    .group(groups::HYBRIDIZATION)
                    .group(groups::INSTRUMENT),
            ),
        StepSpec::required("capture_and_wash", &["Capture and Wash TWIST v2"])
            .process_schema(FieldSchema::new().group(groups::INSTRUMENT)),
        StepSpec::required(
            "amplify_captured_library",
            &["Amplify Captured Libraries TWIST v2"],
        )
        .process_schema(FieldSchema::new().group(groups::PCR))
        .artifact_schema(FieldSchema::new().group(groups::CONCENTRATION)),
        StepSpec::required("bead_purification", &["Bead Purification TWIST v2"]).artifact_schema(
            FieldSchema::new()
                .group(groups::CONCENTRATION)
                .group(groups::LIBRARY_SIZE),
        ),
        StepSpec::required(
            "aliquot_samples_for_pooling",
            &["Aliquot samples for pooling TWIST v1"],
        )
        .artifact_schema(
            FieldSchema::new()
                .group(groups::VOLUMES)
                .group(groups::CONCENTRATION),
        ),
        StepSpec::required(
            "normalization_of_samples",
            &["Normalization of samples for sequencing TWIST v1"],
        )
        .artifact_schema(
            FieldSchema::new()
                .group(groups::CONCENTRATION)
                .group(groups::VOLUMES),
        ),
    ]
}

fn microbial() -> Vec<StepSpec> {
    vec![
        reception_control(),
        StepSpec::optional("buffer_exchange", BUFFER_EXCHANGE).artifact_schema(
            FieldSchema::new()
                .group(groups::VOLUMES)
                .group(groups::CONCENTRATION),
        ),
        StepSpec::required(
            "normalization_of_samples",
            &["CG002 - Normalization of microbial samples"],
        )
        .artifact_schema(
            FieldSchema::new()
                .group(groups::CONCENTRATION)
                .group(groups::VOLUMES),
        ),
        StepSpec::required("microbial_library_prep", &["Microbial Library Prep (Nextera) v1"])
            .process_schema(FieldSchema::new().group(groups::INSTRUMENT).group(groups::PCR))
            .with_placement(),
        StepSpec::required("post_pcr_bead_purification", &["Post-PCR bead purification v1"])
            .artifact_schema(
                FieldSchema::new()
                    .group(groups::CONCENTRATION)
                    .group(groups::LIBRARY_SIZE),
            ),
        StepSpec::required(
            "normalization_for_sequencing",
            &["CG002 - Normalization of microbial samples for sequencing"],
        )
        .artifact_schema(
            FieldSchema::new()
                .group(groups::CONCENTRATION)
                .group(groups::VOLUMES),
        ),
    ]
}

fn sars_cov_2() -> Vec<StepSpec> {
    vec![
        reception_control(),
        StepSpec::required("library_preparation", &["Library Preparation (Cov) v1"])
            .process_schema(FieldSchema::new().group(groups::INSTRUMENT).group(groups::PCR)),
        StepSpec::required("pooling_and_cleanup", &["Pooling and Clean-up (Cov) v1"])
            .artifact_schema(
                FieldSchema::new()
                    .group(groups::VOLUMES)
                    .group(groups::CONCENTRATION),
            ),
        StepSpec::optional("sort_samples", &["Sort (Cov) v1"]).with_placement(),
    ]
}

fn rna() -> Vec<StepSpec> {
    vec![
        reception_control(),
        StepSpec::required(
            "aliquot_samples_for_fragmentation",
            &["Aliquot samples for fragmentation (RNA) v1"],
        )
        .artifact_schema(FieldSchema::new().group(groups::AMOUNT).group(groups::VOLUMES)),
        StepSpec::required(
            "fragment_and_end_repair",
            &["Fragment DNA & End repair (RNA) v1"],
        )
        .process_schema(FieldSchema::new().group(groups::INSTRUMENT)),
        StepSpec::required(
            "a_tailing_and_adapter_ligation",
            &["A-tailing and Adapter ligation (RNA) v1"],
        )
        .process_schema(FieldSchema::new().group(groups::INSTRUMENT)),
        StepSpec::required("dual_index_pcr", &["Dual index PCR (RNA) v1"])
            .process_schema(FieldSchema::new().group(groups::PCR)),
        StepSpec::required("bead_purification", &["Bead purification (RNA) v1"])
            .artifact_schema(
                FieldSchema::new()
                    .group(groups::CONCENTRATION)
                    .group(groups::LIBRARY_SIZE),
            )
            .with_placement(),
    ]
}

fn novaseq() -> Vec<StepSpec> {
    vec![
        StepSpec::required(
            "define_run_format",
            &["Define Run Format and Calculate Volumes (NovaSeq)"],
        )
        .artifact_schema(
            FieldSchema::new()
                .group(groups::VOLUMES)
                .group(groups::CONCENTRATION),
        ),
        StepSpec::required(
            "make_denaturation_pool",
            &["STANDARD Make Denaturation Pool for Sequencing (NovaSeq)"],
        )
        .artifact_schema(FieldSchema::new().group(groups::CONCENTRATION)),
        StepSpec::required("novaseq_run", &["AUTOMATED - NovaSeq Run (NovaSeq 6000)"])
            .process_schema(FieldSchema::new().group(groups::SEQUENCING_RUN))
            .with_placement(),
    ]
}

fn novaseq_x() -> Vec<StepSpec> {
    vec![
        StepSpec::required(
            "prepare_for_sequencing",
            &["Prepare for Sequencing (NovaSeq X)"],
        )
        .artifact_schema(
            FieldSchema::new()
                .group(groups::VOLUMES)
                .group(groups::CONCENTRATION),
        ),
        StepSpec::required("novaseq_x_run", &["NovaSeq X Run"])
            .process_schema(FieldSchema::new().group(groups::SEQUENCING_RUN))
            .with_placement(),
    ]
}

/// Runs every step builder in the workflow's catalog for one sample.
/// Skipped optional steps are filtered out; the first failing required step
/// aborts the sample's assembly.
pub fn assemble(
    lims: &dyn LimsClient,
    sample_id: &SampleId,
    process_id: &ProcessId,
    workflow: Workflow,
) -> Result<Vec<StepDocument>, PrepdocError> {
    let prep = prep_id(sample_id, process_id);
    let mut documents = Vec::new();
    for spec in steps(workflow) {
        if let Some(document) = build_step_document(lims, sample_id, &prep, workflow, &spec)? {
            documents.push(document);
        }
    }
    Ok(documents)
}

/// Prep-level document for workflows that post to `{host}/preps`. Only the
/// microbial pipeline does; its prep record carries the reception-control
/// fields next to the prep identity.
pub fn assemble_prep(
    lims: &dyn LimsClient,
    sample_id: &SampleId,
    process_id: &ProcessId,
    workflow: Workflow,
) -> Result<Option<PrepDocument>, PrepdocError> {
    if workflow != Workflow::Microbial {
        return Ok(None);
    }

    let schema = FieldSchema::new().group(groups::RECEPTION);
    let fields = match lims.latest_artifact(sample_id, RECEPTION_CONTROL)? {
        Some(artifact) => extract(&schema, &artifact.parent_process.udf)
            .map_err(|err| err.in_step(sample_id.as_str(), "reception_control"))?,
        None => {
            return Err(PrepdocError::MissingArtifact {
                sample_id: sample_id.to_string(),
                step_type: "reception_control".to_string(),
                process_types: RECEPTION_CONTROL.join(", "),
            });
        }
    };

    Ok(Some(PrepDocument::new(
        prep_id(sample_id, process_id),
        workflow,
        sample_id.clone(),
        fields,
    )))
}
