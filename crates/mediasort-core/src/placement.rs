use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike};

use crate::date::CaptureInstant;
use crate::media::MediaFile;

/// The deterministic (directory, file name) pair a file is moved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementTarget {
    pub dir: PathBuf,
    pub file_name: String,
}

impl PlacementTarget {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

#[derive(Debug)]
pub enum Resolution {
    /// The file already sits in its target directory under a placed name.
    AlreadyInPlace,
    Target(PlacementTarget),
}

/// Timestamp-derived base name, a pure function of the instant's wall-clock
/// fields; the offset does not participate.
pub fn base_name(instant: &CaptureInstant) -> String {
    let d = instant.local;
    format!(
        "Y{:04}-M{:02}-D{:02}_h{:02}-m{:02}-s{:02}_IMG",
        d.year(),
        d.month(),
        d.day(),
        d.hour(),
        d.minute(),
        d.second()
    )
}

/// Resolve where `file` belongs for `instant` under `root/<device_label>`.
/// The device label is used verbatim as a path segment. Creates the device
/// directory only when a move is needed.
pub fn resolve(
    root: &Path,
    device_label: &str,
    instant: &CaptureInstant,
    file: &MediaFile,
) -> io::Result<Resolution> {
    let base = base_name(instant);
    let dir = root.join(device_label);

    if file.dir == dir && is_placed_name(&file.file_name, &base, &file.extension) {
        return Ok(Resolution::AlreadyInPlace);
    }

    fs::create_dir_all(&dir)?;
    let file_name = unique_file_name(&dir, &base, &file.extension);
    Ok(Resolution::Target(PlacementTarget { dir, file_name }))
}

/// First free `<base><ext>`, `<base>-1<ext>`, `<base>-2<ext>`, ... slot in
/// `dir`. Every probe is a fresh filesystem query, so files placed by prior
/// runs (or earlier in this one) are always seen. A gap left by a deleted
/// file is taken by the next incoming file; placed files are never renamed
/// to close it.
pub fn unique_file_name(dir: &Path, base: &str, ext: &str) -> String {
    let mut name = format!("{base}{ext}");
    let mut counter = 1u32;
    while dir.join(&name).exists() {
        name = format!("{base}-{counter}{ext}");
        counter += 1;
    }
    name
}

/// Whether `name` is `<base><ext>` or `<base>-<n><ext>` - the names this
/// resolver hands out for one instant. A file already wearing one of them is
/// in place; running the collision search on it would only collide the file
/// with itself.
fn is_placed_name(name: &str, base: &str, ext: &str) -> bool {
    let Some(stem) = name.strip_suffix(ext) else {
        return false;
    };
    let Some(rest) = stem.strip_prefix(base) else {
        return false;
    };
    match rest.strip_prefix('-') {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => rest.is_empty(),
    }
}
