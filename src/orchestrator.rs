use serde::Serialize;
use tracing::{info, warn};

use crate::arnold::ArnoldClient;
use crate::document::{PrepDocument, StepDocument};
use crate::domain::{ProcessId, SampleId, Workflow};
use crate::error::PrepdocError;
use crate::lims::LimsClient;
use crate::workflow::{assemble, assemble_prep};

/// What happens when one sample's assembly fails. `AbortAll` is the
/// conservative default: nothing is submitted. `Isolate` collects the
/// failure, submits the surviving samples and reports the casualties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    AbortAll,
    Isolate,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub policy: FailurePolicy,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::AbortAll,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleFailure {
    pub sample_id: SampleId,
    pub error: String,
}

/// Machine-readable outcome of one orchestrator run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub workflow: Workflow,
    pub process_id: ProcessId,
    pub samples: usize,
    pub step_documents: usize,
    pub prep_documents: usize,
    pub submitted: bool,
    pub failures: Vec<SampleFailure>,
}

impl RunReport {
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Orchestrator<L: LimsClient, A: ArnoldClient> {
    lims: L,
    arnold: A,
}

impl<L: LimsClient, A: ArnoldClient> Orchestrator<L, A> {
    pub fn new(lims: L, arnold: A) -> Self {
        Self { lims, arnold }
    }

    /// Assembles documents for every sample on the triggering process and
    /// submits them to the store in one batch per endpoint. Store failures
    /// are always fatal for the whole batch regardless of policy.
    pub fn run(
        &self,
        process_id: &ProcessId,
        workflow: Workflow,
        options: RunOptions,
    ) -> Result<RunReport, PrepdocError> {
        let samples = self.lims.samples_for_process(process_id)?;
        info!(%workflow, %process_id, samples = samples.len(), "assembling documents");

        let mut step_documents: Vec<StepDocument> = Vec::new();
        let mut prep_documents: Vec<PrepDocument> = Vec::new();
        let mut failures: Vec<SampleFailure> = Vec::new();

        for sample_id in &samples {
            match assemble_sample(&self.lims, sample_id, process_id, workflow) {
                Ok((steps, prep)) => {
                    step_documents.extend(steps);
                    prep_documents.extend(prep);
                }
                Err(err) => match options.policy {
                    FailurePolicy::AbortAll => return Err(err),
                    FailurePolicy::Isolate => {
                        warn!(sample = %sample_id, error = %err, "sample assembly failed");
                        failures.push(SampleFailure {
                            sample_id: sample_id.clone(),
                            error: err.to_string(),
                        });
                    }
                },
            }
        }

        let mut submitted = false;
        if options.dry_run {
            info!("dry run, skipping store submission");
        } else {
            if !step_documents.is_empty() {
                self.arnold.submit_steps(&step_documents)?;
                submitted = true;
            }
            if !prep_documents.is_empty() {
                self.arnold.submit_preps(&prep_documents)?;
                submitted = true;
            }
        }

        info!(
            step_documents = step_documents.len(),
            prep_documents = prep_documents.len(),
            failed_samples = failures.len(),
            submitted,
            "run complete"
        );

        Ok(RunReport {
            workflow,
            process_id: process_id.clone(),
            samples: samples.len(),
            step_documents: step_documents.len(),
            prep_documents: prep_documents.len(),
            submitted,
            failures,
        })
    }
}

fn assemble_sample(
    lims: &dyn LimsClient,
    sample_id: &SampleId,
    process_id: &ProcessId,
    workflow: Workflow,
) -> Result<(Vec<StepDocument>, Option<PrepDocument>), PrepdocError> {
    let steps = assemble(lims, sample_id, process_id, workflow)?;
    let prep = assemble_prep(lims, sample_id, process_id, workflow)?;
    Ok((steps, prep))
}
