use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mediasort_core::{OperationOutcome, ProcessOptions};

#[derive(Parser)]
#[command(
    name = "mediasort",
    version,
    about = "Sort photos and videos into per-device folders named by capture time"
)]
struct Cli {
    /// Root directory of the media tree
    root: PathBuf,

    /// Directory names to skip entirely during traversal
    #[arg(long = "ignore", value_name = "NAME", default_values_t = ["Unknown".to_string()])]
    ignore_dirs: Vec<String>,

    /// Stamp each moved file's mtime with its capture time
    #[arg(long)]
    set_file_times: bool,

    /// Write a JSON report of per-file outcomes
    #[arg(long, value_name = "PATH")]
    report_json: Option<PathBuf>,

    /// Also write logs to a timestamped file in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let t_total = Instant::now();

    let log_file = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let name = format!(
                "mediasort_{}.log",
                chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
            );
            Some(Arc::new(File::create(dir.join(name))?))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file)
        }))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let options = ProcessOptions {
        root: cli.root,
        ignore_dirs: cli.ignore_dirs,
        set_file_times: cli.set_file_times,
        report_json: cli.report_json,
    };

    let result = mediasort_core::process(&options, &|path, outcome| match outcome {
        OperationOutcome::Moved { .. } | OperationOutcome::AlreadyInPlace => {
            info!("{}: {outcome}", path.display());
        }
        OperationOutcome::SkippedNoMetadata | OperationOutcome::SkippedBadDate => {
            warn!("{}: {outcome}", path.display());
        }
        OperationOutcome::Failed { .. } => {
            error!("{}: {outcome}", path.display());
        }
    })?;

    eprintln!(
        "Done! {} files: {} moved, {} already in place, {} skipped (no metadata), {} skipped (bad date), {} failed ({:.2}s)",
        result.files_seen,
        result.moved,
        result.already_in_place,
        result.skipped_no_metadata,
        result.skipped_bad_date,
        result.failed,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
