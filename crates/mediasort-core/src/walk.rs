use std::path::Path;

use walkdir::WalkDir;

use crate::media::MediaFile;

/// Collect every file under `root`, pruning directories whose name is in
/// `ignore_dirs` before descending into them - their contents are never
/// observed. The list is snapshotted before any file is processed so a run
/// never re-observes files it moved itself. Siblings are visited in file
/// name order for a deterministic run.
pub fn collect_media(root: &Path, ignore_dirs: &[String]) -> Vec<MediaFile> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // The walk root itself is never pruned, whatever it is named
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .map_or(true, |name| !ignore_dirs.iter().any(|d| d == name))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("walk error under {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(m) = MediaFile::from_path(entry.into_path()) {
            files.push(m);
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn ignore(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ignored_directories_are_pruned_before_descent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.jpg"), b"k").unwrap();
        fs::create_dir(dir.path().join("Unknown")).unwrap();
        fs::write(dir.path().join("Unknown").join("hidden.jpg"), b"h").unwrap();
        // Ignored names prune at any depth
        fs::create_dir_all(dir.path().join("trip").join("Unknown")).unwrap();
        fs::write(
            dir.path().join("trip").join("Unknown").join("deep.jpg"),
            b"d",
        )
        .unwrap();
        fs::write(dir.path().join("trip").join("seen.jpg"), b"s").unwrap();

        let files = collect_media(dir.path(), &ignore(&["Unknown"]));
        let mut names: Vec<&str> = files.iter().map(|m| m.file_name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["keep.jpg", "seen.jpg"]);
    }

    #[test]
    fn test_root_named_like_an_ignored_directory_is_walked() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Unknown");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.jpg"), b"a").unwrap();

        let files = collect_media(&root, &ignore(&["Unknown"]));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_siblings_come_back_sorted() {
        let dir = tempdir().unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let files = collect_media(dir.path(), &[]);
        let names: Vec<&str> = files.iter().map(|m| m.file_name.as_str()).collect();
        assert_eq!(names, ["a.jpg", "b.jpg", "c.jpg"]);
    }
}
