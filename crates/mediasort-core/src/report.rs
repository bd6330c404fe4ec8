use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{OperationOutcome, ProcessResult};

/// One processed file in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub outcome: OperationOutcome,
}

#[derive(Serialize)]
struct RunReport<'a> {
    result: &'a ProcessResult,
    files: &'a [FileRecord],
}

/// Write the run's tallies and per-file outcomes as pretty JSON.
pub fn write_report(
    path: &Path,
    result: &ProcessResult,
    files: &[FileRecord],
) -> anyhow::Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, &RunReport { result, files })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_report_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        let result = ProcessResult {
            files_seen: 2,
            moved: 1,
            failed: 1,
            ..Default::default()
        };
        let files = vec![
            FileRecord {
                path: PathBuf::from("/media/a.jpg"),
                outcome: OperationOutcome::Moved {
                    to: PathBuf::from("/media/Pixel 7/Y2023-M05-D01_h10-m15-s22_IMG.jpg"),
                },
            },
            FileRecord {
                path: PathBuf::from("/media/b.jpg"),
                outcome: OperationOutcome::Failed {
                    reason: "boom".to_string(),
                },
            },
        ];

        write_report(&path, &result, &files).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["result"]["files_seen"], 2);
        assert_eq!(value["files"].as_array().unwrap().len(), 2);
        assert_eq!(value["files"][1]["outcome"]["Failed"]["reason"], "boom");
    }
}
