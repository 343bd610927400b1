use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Archive extension used by the Jenkins update site.
pub const PLUGIN_EXTENSION: &str = "hpi";

/// One validated download, built from CLI input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    plugin_name: String,
    version: Option<String>,
    output_dir: PathBuf,
}

impl DownloadRequest {
    pub fn new(
        plugin_name: &str,
        version: Option<&str>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, FetchError> {
        let plugin_name = plugin_name.trim();
        if plugin_name.is_empty() {
            return Err(FetchError::Argument("plugin name must not be empty".into()));
        }

        // The name doubles as the output filename and a URL path segment.
        if !is_path_segment(plugin_name) {
            return Err(FetchError::Argument(format!(
                "plugin name may only use letters, digits and -_.+~: {plugin_name}"
            )));
        }

        let version = match version.map(str::trim) {
            Some("") => {
                return Err(FetchError::Argument(
                    "version must not be empty when given".into(),
                ));
            }
            Some(version) if !is_path_segment(version) => {
                return Err(FetchError::Argument(format!(
                    "version may only use letters, digits and -_.+~: {version}"
                )));
            }
            other => other.map(str::to_string),
        };

        Ok(Self {
            plugin_name: plugin_name.to_string(),
            version,
            output_dir: output_dir.into(),
        })
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Where a plugin comes from and the file it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub url: String,
    pub filename: String,
}

/// Plugin ids and versions on the update site stick to this set, which needs
/// no percent-encoding and is safe as a filename.
fn is_path_segment(value: &str) -> bool {
    value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+' | '~'))
}

pub fn archive_filename(plugin_name: &str) -> String {
    format!("{plugin_name}.{PLUGIN_EXTENSION}")
}
