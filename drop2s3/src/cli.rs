///
/// This module implements the CLI interface for drop2s3: command parsing, config
/// resolution and dispatch to the reconciliation core.
///
/// All reconciliation logic (scanning, classification, transfers, workflow) lives in
/// the [`drop2s3-core`] crate. This module is glue: it builds a
/// [`ReconcileSession`] for the chosen partition, runs one operation and renders the
/// resulting report.
///
/// ## How To Use
/// - From a shell: `drop2s3 --bucket-name my-photos --year 2024 --month 01 cp --dry-run false`.
/// - Programmatically: call [`run`] with a constructed [`Cli`].
///
/// Mutating subcommands default to a dry run; pass `--dry-run false` to act.
///
/// [`drop2s3-core`]: ../../drop2s3-core/
use crate::load_config::{load_config, CliConfig};
use crate::prompt::{choose_partition, StdinConfirm};
use crate::render::Output;
use crate::s3::build_remote;
use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use drop2s3_core::contract::{AutoConfirm, Confirm};
use drop2s3_core::error::OperationFailure;
use drop2s3_core::partition::{detect_partitions, PartitionKey};
use drop2s3_core::report::OperationReport;
use drop2s3_core::session::ReconcileSession;
use drop2s3_core::store::Location;
use drop2s3_core::transfer::{
    copy_to_staging, delete_from_inbox, diff_bucket, diff_local, download_from_remote,
    mkdir_staging, upload_to_remote,
};
use drop2s3_core::workflow::run_workflow;
use std::path::PathBuf;

/// CLI for drop2s3: back up camera uploads to S3 through a local staging directory.
#[derive(Parser)]
#[clap(
    name = "drop2s3",
    version,
    about = "Reconcile a photo inbox, a local staging directory and an S3 bucket"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Bucket to back up to (overrides `bucket_name` in the config)
    #[clap(long, global = true)]
    pub bucket_name: Option<String>,

    /// Four-digit year; detected from the inbox when omitted
    #[clap(long, global = true)]
    pub year: Option<String>,

    /// Two-digit month; detected from the inbox when omitted
    #[clap(long, global = true)]
    pub month: Option<String>,

    #[clap(long, global = true, default_value = "default")]
    pub device: String,

    /// Answer yes to every prompt
    #[clap(long, short = 'y', global = true)]
    pub yes: bool,

    /// Print reports as JSON
    #[clap(long, global = true)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct DryRun {
    /// Only report what would happen
    #[clap(long = "dry-run", default_value_t = true, action = clap::ArgAction::Set)]
    pub enabled: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Place {
    Inbox,
    Staging,
    Remote,
}

impl From<Place> for Location {
    fn from(place: Place) -> Self {
        match place {
            Place::Inbox => Location::Inbox,
            Place::Staging => Location::Staging,
            Place::Remote => Location::Remote,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the months that have dated files in the inbox
    Detect,
    #[clap(flatten)]
    Partition(PartitionCommand),
}

/// Subcommands that work on one partition's scanned session.
#[derive(Subcommand)]
pub enum PartitionCommand {
    /// Create the staging directories for the partition
    Mkdir(DryRun),
    /// Copy inbox files into staging
    Cp(DryRun),
    /// Upload staged files to the bucket
    Upload(DryRun),
    /// Download bucket-only files into staging
    Download(DryRun),
    /// Delete inbox files that are verified in staging and present in the bucket
    RmInbox(DryRun),
    /// Compare inbox with staging
    DiffLocal,
    /// Compare staging with the bucket
    DiffBucket,
    /// List the partition's files at one location
    Ls {
        #[clap(value_enum)]
        location: Place,
    },
    /// Show every file with its reconciliation state
    Status,
    /// mkdir, diff-local, cp and upload, with confirmation before each transfer
    Workflow(DryRun),
}

/// Prints the report (partial on failure) and turns a halt into an error.
fn finish(out: Output, result: Result<OperationReport, OperationFailure>) -> Result<()> {
    match result {
        Ok(report) => out.report(&report),
        Err(failure) => {
            out.report(&failure.report)?;
            Err(failure.into())
        }
    }
}

fn resolve_partition(cli: &Cli, settings: &CliConfig) -> Result<PartitionKey> {
    let (year, month) = match (&cli.year, &cli.month) {
        (Some(year), Some(month)) => (year.clone(), month.clone()),
        (None, None) => {
            let ym = choose_partition(&settings.inbox_dir()?, cli.yes)?;
            (ym.year, ym.month)
        }
        _ => bail!("--year and --month must be given together"),
    };
    Ok(PartitionKey::new(&year, &month, &cli.device)?)
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let mut settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => CliConfig::default(),
    };
    settings.apply_env_overrides();
    let out = Output { json: cli.json };

    let command = match &cli.command {
        Commands::Detect => {
            let inbox = settings.inbox_dir()?;
            tracing::info!(command = "detect", inbox = %inbox.display(), "Detecting partitions");
            return out.partitions(&detect_partitions(&inbox)?);
        }
        Commands::Partition(command) => command,
    };

    let bucket = cli
        .bucket_name
        .clone()
        .or_else(|| settings.bucket_name.clone())
        .ok_or_else(|| anyhow!("No bucket given: pass --bucket-name or set bucket_name in the config"))?;
    let partition = resolve_partition(&cli, &settings)?;
    let session_config = settings.session_config(&bucket, partition)?;

    let remote = build_remote(&bucket, &settings.remote).await?;
    let session = ReconcileSession::build(session_config, remote.as_ref()).await?;

    match command {
        PartitionCommand::Mkdir(dry) => out.mkdir(&mkdir_staging(&session, dry.enabled)?),
        PartitionCommand::Cp(dry) => finish(out, copy_to_staging(&session, dry.enabled)),
        PartitionCommand::Upload(dry) => {
            finish(out, upload_to_remote(&session, remote.as_ref(), dry.enabled).await)
        }
        PartitionCommand::Download(dry) => finish(
            out,
            download_from_remote(&session, remote.as_ref(), dry.enabled).await,
        ),
        PartitionCommand::RmInbox(dry) => finish(out, delete_from_inbox(&session, dry.enabled)),
        PartitionCommand::DiffLocal => finish(out, diff_local(&session)),
        PartitionCommand::DiffBucket => finish(out, diff_bucket(&session)),
        PartitionCommand::Ls { location } => {
            out.listing(&session.store().filenames_at((*location).into()))
        }
        PartitionCommand::Status => out.status(session.store()),
        PartitionCommand::Workflow(dry) => {
            let confirm: Box<dyn Confirm> = if cli.yes {
                Box::new(AutoConfirm(true))
            } else {
                Box::new(StdinConfirm)
            };
            let report = run_workflow(&session, remote.as_ref(), confirm.as_ref(), dry.enabled).await?;
            out.workflow(&report)
        }
    }
}
