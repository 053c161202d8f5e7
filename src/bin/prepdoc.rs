use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use prepdoc::arnold::ArnoldHttpClient;
use prepdoc::config::ConfigLoader;
use prepdoc::domain::{ProcessId, Workflow};
use prepdoc::error::PrepdocError;
use prepdoc::lims::LimsHttpClient;
use prepdoc::orchestrator::{FailurePolicy, Orchestrator, RunOptions};
use prepdoc::output::JsonOutput;

#[derive(Parser)]
#[command(name = "prepdoc")]
#[command(about = "Assemble LIMS prep/sequencing step documents and push them to Arnold")]
#[command(version, author)]
struct Cli {
    /// Path to prepdoc.json (default: ./prepdoc.json, PREPDOC_* env vars win)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Build prep documents for every sample on a LIMS process")]
    Prep(PrepArgs),
    #[command(about = "Build sequencing-run documents for every sample on a LIMS process")]
    Sequencing(SequencingArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PrepWorkflow {
    Wgs,
    Twist,
    Micro,
    Cov,
    Rna,
}

impl From<PrepWorkflow> for Workflow {
    fn from(value: PrepWorkflow) -> Self {
        match value {
            PrepWorkflow::Wgs => Workflow::Wgs,
            PrepWorkflow::Twist => Workflow::Twist,
            PrepWorkflow::Micro => Workflow::Microbial,
            PrepWorkflow::Cov => Workflow::SarsCov2,
            PrepWorkflow::Rna => Workflow::Rna,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SequencingWorkflow {
    Novaseq,
    #[value(name = "novaseq-x")]
    NovaseqX,
}

impl From<SequencingWorkflow> for Workflow {
    fn from(value: SequencingWorkflow) -> Self {
        match value {
            SequencingWorkflow::Novaseq => Workflow::NovaSeq,
            SequencingWorkflow::NovaseqX => Workflow::NovaSeqX,
        }
    }
}

#[derive(Args)]
struct PrepArgs {
    workflow: PrepWorkflow,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct SequencingArgs {
    workflow: SequencingWorkflow,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct RunArgs {
    /// Id of the LIMS process that triggered this run
    #[arg(long)]
    process: String,

    /// Collect per-sample failures and still submit the surviving samples
    #[arg(long)]
    keep_going: bool,

    /// Assemble and report without writing to the document store
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PrepdocError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PrepdocError) -> u8 {
    match error {
        PrepdocError::MissingConfig
        | PrepdocError::ConfigRead(_)
        | PrepdocError::ConfigParse(_)
        | PrepdocError::InvalidSampleId(_)
        | PrepdocError::InvalidProcessId(_)
        | PrepdocError::MissingArtifact { .. }
        | PrepdocError::MissingField { .. }
        | PrepdocError::InvalidValue { .. }
        | PrepdocError::StepAssembly { .. } => 2,
        PrepdocError::LimsHttp(_)
        | PrepdocError::LimsStatus { .. }
        | PrepdocError::ArnoldHttp(_)
        | PrepdocError::ArnoldStatus { .. } => 3,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (workflow, run_args) = match cli.command {
        Commands::Prep(args) => (Workflow::from(args.workflow), args.run),
        Commands::Sequencing(args) => (Workflow::from(args.workflow), args.run),
    };

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    let process_id: ProcessId = run_args.process.parse().into_diagnostic()?;

    let lims = LimsHttpClient::new(
        &config.lims_base_url,
        &config.lims_username,
        &config.lims_password,
    )
    .into_diagnostic()?;
    let arnold = ArnoldHttpClient::new(&config.arnold_host).into_diagnostic()?;
    let orchestrator = Orchestrator::new(lims, arnold);

    let options = RunOptions {
        policy: if run_args.keep_going {
            FailurePolicy::Isolate
        } else {
            FailurePolicy::AbortAll
        },
        dry_run: run_args.dry_run,
    };

    let report = orchestrator
        .run(&process_id, workflow, options)
        .into_diagnostic()?;
    JsonOutput::print_report(&report).into_diagnostic()?;

    if !report.ok() {
        return Err(miette::Report::msg(format!(
            "{} of {} sample(s) failed assembly",
            report.failures.len(),
            report.samples
        )));
    }
    Ok(())
}
