//! External tool detection.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check whether `program` runs, reporting the first line of `-version`.
///
/// `program` may be a bare name looked up on `PATH` or an explicit path.
///
/// ```no_run
/// use mediacast_av::check_tool;
///
/// let info = check_tool("ffprobe", "ffprobe");
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, program: impl AsRef<Path>) -> ToolInfo {
    let program = program.as_ref();
    let result = Command::new(program).arg("-version").output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: which::which(program).ok(),
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check ffmpeg and ffprobe at the given locations.
pub fn check_tools(ffmpeg: &Path, ffprobe: &Path) -> Vec<ToolInfo> {
    vec![check_tool("ffmpeg", ffmpeg), check_tool("ffprobe", ffprobe)]
}

/// Resolve a tool, preferring a configured path over `PATH` lookup.
///
/// # Errors
///
/// Returns an error if neither the configured path nor `PATH` has it.
pub fn resolve_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        if let Ok(found) = which::which(path) {
            return Ok(found);
        }
    }

    which::which(name).map_err(|_| Error::tool_not_found(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool("ffmpeg", "nonexistent_tool_12345");
        assert_eq!(info.name, "ffmpeg");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_resolve_tool_not_found() {
        let err = resolve_tool(
            "nonexistent_tool_12345",
            Some(Path::new("/nonexistent/bin/tool")),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[test]
    fn test_resolve_tool_prefers_existing_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("ffprobe");
        std::fs::write(&fake, b"").unwrap();
        assert_eq!(resolve_tool("ffprobe", Some(&fake)).unwrap(), fake);
    }
}
