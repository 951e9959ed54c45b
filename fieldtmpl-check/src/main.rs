//! Field template drift checker
//!
//! Compares object models against the field templates they are bound to,
//! reading everything from a JSON snapshot.
//!
//! Usage:
//!   fieldtmpl-check --snapshot cmdb.json status --template 1
//!   fieldtmpl-check --snapshot cmdb.json diff --template 1 --object 7
//!   fieldtmpl-check --snapshot cmdb.json plan --template 1 --object 7
//!
//! Reports are printed as JSON on stdout; logs go to stderr.

use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use fieldtmpl_check::{load_config, Checker};
use fieldtmpl_types::{ObjectId, TemplateId};
use serde::Serialize;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "fieldtmpl-check")]
#[command(about = "Checks object models against field templates")]
struct Args {
    /// Snapshot file with templates, bindings and object schemas
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Engine config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of objects checked at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Whether bound objects need sync
    Status {
        #[arg(short, long)]
        template: TemplateId,

        /// Objects to check; all bound objects when omitted
        #[arg(short, long, num_args = 1..)]
        objects: Vec<ObjectId>,
    },
    /// Every difference between a template and one object
    Diff {
        #[arg(short, long)]
        template: TemplateId,

        #[arg(short, long)]
        object: ObjectId,
    },
    /// Changes a sync of one object would make
    Plan {
        #[arg(short, long)]
        template: TemplateId,

        #[arg(short, long)]
        object: ObjectId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    debug!("Engine config: {:?}", config);

    let checker = Checker::open(&args.snapshot, config)?;
    info!("Loaded snapshot {}", args.snapshot.display());

    match args.command {
        Command::Status { template, objects } => {
            let report = checker.status(template, &objects).await?;
            info!("{} of {} objects need sync", report.need_sync, report.checked);
            print_json(&report)
        }
        Command::Diff { template, object } => print_json(&checker.diff(template, object).await?),
        Command::Plan { template, object } => print_json(&checker.plan(template, object).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
