//! service-cleaner: tag-driven EC2 resource cleanup
//!
//! Stops, terminates, deletes or deregisters resources that are not marked
//! with a `keep` tag, across every configured region, and writes a report of
//! what was done.

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use service_cleaner::aws::s3::object_key;
use service_cleaner::aws::{AccountId, AwsContext, Ec2Client, S3Client, get_current_account_id};
use service_cleaner::config::{ConfigFile, Overrides, Settings};
use service_cleaner::logging::{init_logging, log_file_name};
use service_cleaner::orchestrator::{
    Cleaner, CleanerConfig, OperationMode, RegionClient, WaitTimeoutAction,
};
use service_cleaner::report::{JsonReport, OutcomeReporter, Reporters, SummaryTable};
use service_cleaner::sg_report;
use service_cleaner_common::KNOWN_REGIONS;
use service_cleaner_common::defaults::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "service-cleaner")]
#[command(about = "Tag-driven cleanup of EC2 resources across regions")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Options shared by commands that talk to AWS
#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Config file (default: cleaner.json, optional unless given explicitly)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Region to visit; repeat to visit several (replaces the config list)
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Account whose snapshots and images are cleaned (default: caller's account)
    #[arg(long)]
    account_id: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,
}

/// Arguments for the clean command
#[derive(clap::Args, Debug)]
struct CleanArgs {
    /// Which resource kinds to clean
    #[arg(short, long, value_enum)]
    operation: OperationMode,

    /// Send every mutating request with DryRun=true
    #[arg(long)]
    dry_run: bool,

    /// Also write the log to clean_log_<timestamp>.log
    #[arg(long)]
    log: bool,

    /// Upload the report (and log file) to this S3 bucket
    #[arg(long)]
    upload_bucket: Option<String>,

    /// Seconds between instance termination polls
    #[arg(long)]
    poll_delay: Option<u64>,

    /// Termination polls before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// What to do with volumes when termination cannot be confirmed
    #[arg(long, value_enum)]
    on_wait_timeout: Option<WaitTimeoutAction>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean up resources that are not tagged to be kept
    Clean(Box<CleanArgs>),

    /// Report every security group with its ingress rules and instances
    SgReport {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// List the regions the cleaner knows
    Regions,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let log_path = match &args.command {
        Command::Clean(clean) if clean.log => Some(log_file_name(Local::now())),
        _ => None,
    };
    init_logging(log_path.as_deref())?;

    match args.command {
        Command::Clean(clean) => handle_clean(*clean, log_path).await,
        Command::SgReport { common } => handle_sg_report(common).await,
        Command::Regions => {
            for region in KNOWN_REGIONS {
                println!("{region}");
            }
            Ok(())
        }
    }
}

fn load_settings(common: &CommonArgs, overrides: Overrides) -> Result<Settings> {
    let (path, explicit) = match &common.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    let settings = ConfigFile::load_or_default(&path, explicit)?.resolve(&Overrides {
        regions: common.regions.clone(),
        account_id: common.account_id.clone(),
        ..overrides
    })?;

    info!(regions = ?settings.regions, "Regions selected");
    Ok(settings)
}

/// One AWS context per region, plus the account to act on
async fn connect(
    settings: &Settings,
    profile: Option<&str>,
) -> Result<(AccountId, Vec<AwsContext>)> {
    if let Some(profile) = profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let mut contexts = Vec::with_capacity(settings.regions.len());
    for region in &settings.regions {
        contexts.push(AwsContext::with_profile(region, profile).await);
    }

    let account_id = match &settings.account_id {
        Some(id) => id.clone(),
        // Regions are non-empty after resolution
        None => match contexts.first() {
            Some(ctx) => get_current_account_id(ctx.sdk_config()).await?,
            None => anyhow::bail!("No regions to resolve the account from"),
        },
    };

    Ok((account_id, contexts))
}

/// Handle the clean command
async fn handle_clean(args: CleanArgs, log_path: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(
        &args.common,
        Overrides {
            poll_delay_secs: args.poll_delay,
            max_attempts: args.max_attempts,
            on_wait_timeout: args.on_wait_timeout,
            ..Default::default()
        },
    )?;
    let (account_id, contexts) = connect(&settings, args.common.aws_profile.as_deref()).await?;

    info!(
        account_id = %account_id,
        operation = ?args.operation,
        dry_run = args.dry_run,
        "Starting cleanup run"
    );

    let clients: Vec<_> = contexts
        .iter()
        .map(|ctx| RegionClient::new(ctx.region(), Ec2Client::from_context(ctx)))
        .collect();

    let json = JsonReport::new(&settings.report_dir, account_id.as_str(), args.dry_run);
    let report_path = json.path().to_path_buf();

    let config = CleanerConfig {
        account_id,
        wait: settings.wait.clone(),
        on_wait_timeout: settings.on_wait_timeout,
    };
    let mut cleaner = Cleaner::new(
        &config,
        clients,
        Reporters::new()
            .with(json)
            .with(SummaryTable::new(args.dry_run)),
    );

    let records = cleaner.run(args.operation, args.dry_run).await;
    cleaner.into_reporter().finish()?;

    println!(
        "\n{} records written to {}",
        records.len(),
        report_path.display()
    );

    if let Some(bucket) = &args.upload_bucket
        && let Some(ctx) = contexts.first()
    {
        let mut artifacts = vec![report_path];
        artifacts.extend(log_path);
        upload_artifacts(ctx, bucket, &artifacts).await;
    }

    Ok(())
}

/// Upload run artifacts to S3. Failures are logged, not fatal.
async fn upload_artifacts(ctx: &AwsContext, bucket: &str, paths: &[PathBuf]) {
    let s3 = S3Client::from_context(ctx);
    for path in paths {
        if let Err(e) = s3.upload_file(bucket, &object_key(path), path).await {
            warn!(bucket = %bucket, path = %path.display(), error = ?e, "Upload failed");
        }
    }
}

/// Handle the sg-report command
async fn handle_sg_report(common: CommonArgs) -> Result<()> {
    let settings = load_settings(&common, Overrides::default())?;

    let mut audits = Vec::new();
    for region in &settings.regions {
        let ctx = AwsContext::with_profile(region, common.aws_profile.as_deref()).await;
        let ec2 = Ec2Client::from_context(&ctx);
        audits.extend(sg_report::audit_region(&ec2, region).await);
    }

    let path = sg_report::report_path(&settings.report_dir, Local::now());
    sg_report::write_report(&path, &audits)?;

    if audits.is_empty() {
        println!("No security groups found.");
    } else {
        println!("{}", sg_report::render_table(&audits));
    }
    println!("\nReport written to {}", path.display());

    Ok(())
}
