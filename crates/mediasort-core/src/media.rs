use std::path::PathBuf;

/// A file observed during traversal. Ephemeral: built from a walk entry,
/// dropped once the file has been processed.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Directory the file currently lives in
    pub dir: PathBuf,
    /// Current file name
    pub file_name: String,
    /// Lower-cased extension including the leading dot, "" when absent
    pub extension: String,
}

impl MediaFile {
    /// Build an observation from a path. Returns None for paths without a
    /// parent or file name (the walk never produces those for files).
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let dir = path.parent()?.to_path_buf();
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Some(Self {
            path,
            dir,
            file_name,
            extension,
        })
    }
}
