use crate::model::config::RepositoryConfig;
use crate::model::request::{DownloadRequest, ResolvedArtifact, archive_filename};

/// A Jenkins update site, addressed by its base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRepository {
    base_url: String,
}

impl PluginRepository {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self::new(config.base_url.as_str())
    }

    /// Download URL for a plugin: the `latest` endpoint without a version,
    /// the versioned download path otherwise.
    pub fn resolve(&self, plugin_name: &str, version: Option<&str>) -> String {
        let file = archive_filename(plugin_name);
        match version {
            None => format!("{}/latest/{file}", self.base_url),
            Some(version) => format!(
                "{}/download/plugins/{plugin_name}/{version}/{file}",
                self.base_url
            ),
        }
    }

    pub fn artifact(&self, request: &DownloadRequest) -> ResolvedArtifact {
        ResolvedArtifact {
            url: self.resolve(request.plugin_name(), request.version()),
            filename: archive_filename(request.plugin_name()),
        }
    }
}
