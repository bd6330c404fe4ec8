pub mod date;
pub mod media;
pub mod placement;
pub mod provider;
pub mod report;
pub mod walk;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use media::MediaFile;
use placement::Resolution;
use provider::{MetadataProvider, ProviderChain};

/// Directory name a file lands under when no device model is known.
pub const DEFAULT_DEVICE_LABEL: &str = "Unknown Device";

fn default_ignore_dirs() -> Vec<String> {
    vec!["Unknown".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Root of the media tree; device directories are created directly
    /// under it.
    pub root: PathBuf,
    /// Directory names pruned before descent; their contents are never
    /// observed, moved, or logged.
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,
    /// Stamp each moved file's mtime with its capture time.
    #[serde(default)]
    pub set_file_times: bool,
    /// Where to write the JSON run report, if anywhere.
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

impl ProcessOptions {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_dirs: default_ignore_dirs(),
            set_file_times: false,
            report_json: None,
        }
    }
}

/// Terminal outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationOutcome {
    Moved { to: PathBuf },
    AlreadyInPlace,
    SkippedNoMetadata,
    SkippedBadDate,
    Failed { reason: String },
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutcome::Moved { to } => write!(f, "moved to {}", to.display()),
            OperationOutcome::AlreadyInPlace => write!(f, "already in place"),
            OperationOutcome::SkippedNoMetadata => write!(
                f,
                "skipped: no capture time in tags, creation date, or container metadata"
            ),
            OperationOutcome::SkippedBadDate => {
                write!(f, "skipped: unrecognized capture time format")
            }
            OperationOutcome::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-run tallies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResult {
    pub files_seen: u64,
    pub moved: u64,
    pub already_in_place: u64,
    pub skipped_no_metadata: u64,
    pub skipped_bad_date: u64,
    pub failed: u64,
}

/// Callback receiving each file's outcome. The orchestrator only borrows it
/// for the run; its lifecycle is owned by the caller.
pub type OutcomeSink<'a> = dyn Fn(&Path, &OperationOutcome) + 'a;

/// Process the tree with the system provider stack (exiftool/mdls/ffprobe).
pub fn process(options: &ProcessOptions, sink: &OutcomeSink<'_>) -> anyhow::Result<ProcessResult> {
    process_with_providers(options, &ProviderChain::system(), sink)
}

/// Process the tree with an explicit provider stack. Tests inject canned
/// providers here.
pub fn process_with_providers(
    options: &ProcessOptions,
    providers: &ProviderChain,
    sink: &OutcomeSink<'_>,
) -> anyhow::Result<ProcessResult> {
    if !options.root.is_dir() {
        anyhow::bail!("root directory does not exist: {}", options.root.display());
    }

    let files = walk::collect_media(&options.root, &options.ignore_dirs);

    let mut result = ProcessResult::default();
    let mut records = Vec::with_capacity(files.len());

    for file in &files {
        let outcome = process_file(file, options, providers);
        result.files_seen += 1;
        match &outcome {
            OperationOutcome::Moved { .. } => result.moved += 1,
            OperationOutcome::AlreadyInPlace => result.already_in_place += 1,
            OperationOutcome::SkippedNoMetadata => result.skipped_no_metadata += 1,
            OperationOutcome::SkippedBadDate => result.skipped_bad_date += 1,
            OperationOutcome::Failed { .. } => result.failed += 1,
        }
        sink(&file.path, &outcome);
        records.push(report::FileRecord {
            path: file.path.clone(),
            outcome,
        });
    }

    if let Some(report_path) = &options.report_json {
        report::write_report(report_path, &result, &records)?;
    }

    Ok(result)
}

/// Linear per-file state machine, no retries:
/// primary provider -> fallbacks? -> parse -> resolve -> move | skip.
/// Nothing thrown here escapes the file; the run continues regardless.
fn process_file(
    file: &MediaFile,
    options: &ProcessOptions,
    providers: &ProviderChain,
) -> OperationOutcome {
    // A primary invocation error aborts this file. It does not fall through
    // to the other providers.
    let record = match providers.primary.query(&file.path) {
        Ok(record) => record,
        Err(err) => {
            error!("{}: {err}", file.path.display());
            return OperationOutcome::Failed {
                reason: err.to_string(),
            };
        }
    };

    let raw = match record.capture_time.clone() {
        Some(raw) => Some(raw),
        None => fallback_capture_time(&file.path, &providers.fallbacks),
    };
    let Some(raw) = raw else {
        return OperationOutcome::SkippedNoMetadata;
    };

    let instant = match date::parse_capture_instant(&raw) {
        Ok(instant) => instant,
        Err(err) => {
            warn!("{}: {err}", file.path.display());
            return OperationOutcome::SkippedBadDate;
        }
    };

    // The device label always comes from the embedded tags, even when the
    // capture time came from a fallback source.
    let device_label = record
        .device_model
        .as_deref()
        .unwrap_or(DEFAULT_DEVICE_LABEL);

    let target = match placement::resolve(&options.root, device_label, &instant, file) {
        Ok(Resolution::AlreadyInPlace) => return OperationOutcome::AlreadyInPlace,
        Ok(Resolution::Target(target)) => target,
        Err(err) => {
            error!(
                "{}: cannot prepare target directory: {err}",
                file.path.display()
            );
            return OperationOutcome::Failed {
                reason: err.to_string(),
            };
        }
    };

    match move_into_place(file, &target, &instant, options.set_file_times) {
        Ok(to) => OperationOutcome::Moved { to },
        Err(err) => {
            error!("{}: move failed: {err}", file.path.display());
            OperationOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}

/// Query the soft fallbacks in order. An invocation error here is logged at
/// error level and treated as "no data"; the first capture-time string wins
/// and later providers are not queried.
fn fallback_capture_time(path: &Path, fallbacks: &[Box<dyn MetadataProvider>]) -> Option<String> {
    for provider in fallbacks {
        match provider.query(path) {
            Ok(record) => {
                if let Some(raw) = record.capture_time {
                    return Some(raw);
                }
            }
            Err(err) => error!("{}: {err}", path.display()),
        }
    }
    None
}

/// Move the file onto its target, falling back to copy+remove when rename
/// fails (cross-filesystem moves).
fn move_into_place(
    file: &MediaFile,
    target: &placement::PlacementTarget,
    instant: &date::CaptureInstant,
    set_file_times: bool,
) -> io::Result<PathBuf> {
    let dest = target.path();
    if let Err(rename_err) = fs::rename(&file.path, &dest) {
        if fs::copy(&file.path, &dest).is_err() {
            return Err(rename_err);
        }
        fs::remove_file(&file.path)?;
    }
    if set_file_times {
        if let Some(ts) = instant.timestamp() {
            filetime::set_file_mtime(&dest, filetime::FileTime::from_unix_time(ts, 0)).ok();
        }
    }
    Ok(dest)
}
