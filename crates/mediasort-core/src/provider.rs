use std::io;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Raw metadata fields a provider recovered for one file. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    pub capture_time: Option<String>,
    pub device_model: Option<String>,
}

/// Failure to invoke an external metadata tool. A tool that runs but prints
/// nothing useful is not an error - it yields an empty record instead.
#[derive(Debug, Error)]
#[error("failed to invoke {tool}: {source}")]
pub struct ProviderError {
    pub tool: &'static str,
    #[source]
    pub source: io::Error,
}

/// A metadata source queried via an external command returning raw text.
pub trait MetadataProvider {
    fn name(&self) -> &'static str;
    fn query(&self, path: &Path) -> Result<MetadataRecord, ProviderError>;
}

/// The ordered provider stack. The primary provider's invocation error is
/// fatal for the file being processed; fallback invocation errors are soft
/// and treated as "no data". First capture-time string wins; later
/// providers are not queried.
pub struct ProviderChain {
    pub primary: Box<dyn MetadataProvider>,
    pub fallbacks: Vec<Box<dyn MetadataProvider>>,
}

impl ProviderChain {
    pub fn new(
        primary: Box<dyn MetadataProvider>,
        fallbacks: Vec<Box<dyn MetadataProvider>>,
    ) -> Self {
        Self { primary, fallbacks }
    }

    /// The system stack: exiftool, then mdls, then ffprobe.
    pub fn system() -> Self {
        Self::new(
            Box::new(ExifToolProvider),
            vec![Box::new(FsCreationProvider), Box::new(ContainerProvider)],
        )
    }
}

/// Run a tool against a file, capturing stdout as lossy UTF-8. A non-zero
/// exit status is not an error here: the tools print what they know and the
/// parsers take what they find.
fn run_tool(tool: &'static str, args: &[&str], path: &Path) -> Result<String, ProviderError> {
    let output = Command::new(tool)
        .args(args)
        .arg(path)
        .output()
        .map_err(|source| ProviderError { tool, source })?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

const EXIF_CAPTURE_FIELD: &str = "Date/Time Original";
const EXIF_MODEL_FIELD: &str = "Camera Model Name";

/// Embedded-tag provider: the file's own capture-time and device-model tags.
pub struct ExifToolProvider;

impl MetadataProvider for ExifToolProvider {
    fn name(&self) -> &'static str {
        "exiftool"
    }

    fn query(&self, path: &Path) -> Result<MetadataRecord, ProviderError> {
        let stdout = run_tool("exiftool", &["-DateTimeOriginal", "-Model"], path)?;
        Ok(parse_exiftool_output(&stdout))
    }
}

/// Parse exiftool's human-readable `Field : value` lines. The separator is
/// the first colon; capture-time values keep their own colons intact.
pub fn parse_exiftool_output(stdout: &str) -> MetadataRecord {
    let mut record = MetadataRecord::default();
    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            EXIF_CAPTURE_FIELD => record.capture_time = Some(value.trim().to_string()),
            EXIF_MODEL_FIELD => record.device_model = Some(value.trim().to_string()),
            _ => {}
        }
    }
    record
}

const MDLS_MARKER: &str = "kMDItemFSCreationDate";

/// Filesystem-creation-date provider (Spotlight metadata attribute).
pub struct FsCreationProvider;

impl MetadataProvider for FsCreationProvider {
    fn name(&self) -> &'static str {
        "mdls"
    }

    fn query(&self, path: &Path) -> Result<MetadataRecord, ProviderError> {
        let stdout = run_tool("mdls", &["-name", MDLS_MARKER], path)?;
        Ok(MetadataRecord {
            capture_time: parse_mdls_output(&stdout),
            ..Default::default()
        })
    }
}

/// Extract the value after `=` on the attribute marker line, if present.
pub fn parse_mdls_output(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        if line.contains(MDLS_MARKER) {
            if let Some((_, value)) = line.split_once('=') {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

/// Container-metadata provider: the format-level creation_time tag of
/// video/audio containers.
pub struct ContainerProvider;

impl MetadataProvider for ContainerProvider {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn query(&self, path: &Path) -> Result<MetadataRecord, ProviderError> {
        // Only container formats carry this tag; skip the spawn for
        // anything that is not audio or video.
        let is_av = mime_guess::from_path(path).first().map_or(false, |mime| {
            mime.type_() == mime_guess::mime::VIDEO || mime.type_() == mime_guess::mime::AUDIO
        });
        if !is_av {
            return Ok(MetadataRecord::default());
        }

        let stdout = run_tool(
            "ffprobe",
            &[
                "-v",
                "quiet",
                "-show_entries",
                "format_tags=creation_time",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ],
            path,
        )?;
        let trimmed = stdout.trim();
        Ok(MetadataRecord {
            capture_time: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exiftool_output_both_fields() {
        let out = "Date/Time Original              : 2023:05:01 10:15:22\n\
                   Camera Model Name               : Pixel 7 Pro\n";
        let record = parse_exiftool_output(out);
        assert_eq!(record.capture_time.as_deref(), Some("2023:05:01 10:15:22"));
        assert_eq!(record.device_model.as_deref(), Some("Pixel 7 Pro"));
    }

    #[test]
    fn test_exiftool_output_missing_capture_time() {
        let out = "Camera Model Name               : iPhone 14\n";
        let record = parse_exiftool_output(out);
        assert!(record.capture_time.is_none());
        assert_eq!(record.device_model.as_deref(), Some("iPhone 14"));
    }

    #[test]
    fn test_exiftool_output_ignores_unrelated_lines() {
        let out = "ExifTool Version Number         : 12.50\n\
                   File Name                       : a.jpg\n\
                   no separator on this line\n";
        assert_eq!(parse_exiftool_output(out), MetadataRecord::default());
    }

    #[test]
    fn test_mdls_marker_line() {
        let out = "kMDItemFSCreationDate = 2023-05-01 10:15:22 +0000\n";
        assert_eq!(
            parse_mdls_output(out).as_deref(),
            Some("2023-05-01 10:15:22 +0000")
        );
    }

    #[test]
    fn test_mdls_without_marker() {
        assert!(parse_mdls_output("").is_none());
        assert!(parse_mdls_output("kMDItemContentType = public.jpeg\n").is_none());
    }

    #[test]
    fn test_mdls_null_value_is_passed_through() {
        // The parser does not second-guess the tool; "(null)" reaches the
        // date parser and fails there.
        let out = "kMDItemFSCreationDate = (null)\n";
        assert_eq!(parse_mdls_output(out).as_deref(), Some("(null)"));
    }
}
