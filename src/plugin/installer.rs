use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::FetchError;
use crate::model::request::DownloadRequest;
use crate::plugin::fetcher::PluginFetcher;
use crate::plugin::resolver::PluginRepository;

#[cfg(unix)]
const ARCHIVE_MODE: u32 = 0o644;

/// Runs the resolve → fetch → save sequence for one request.
#[derive(Debug, Clone)]
pub struct PluginInstaller {
    repository: PluginRepository,
    fetcher: PluginFetcher,
}

impl PluginInstaller {
    pub fn new(repository: PluginRepository, fetcher: PluginFetcher) -> Self {
        Self {
            repository,
            fetcher,
        }
    }

    /// Download the requested plugin and return the path it was written to.
    ///
    /// Nothing is written unless the whole body arrived.
    pub fn install(&self, request: &DownloadRequest) -> Result<PathBuf, FetchError> {
        let artifact = self.repository.artifact(request);
        tracing::info!(
            plugin = request.plugin_name(),
            version = request.version().unwrap_or("latest"),
            url = %artifact.url,
            "resolved plugin"
        );

        let bytes = self.fetcher.fetch(&artifact.url)?;
        save(&bytes, request.output_dir(), &artifact.filename)
    }
}

/// Write `bytes` to `output_dir/filename`, creating the directory first.
///
/// The data goes to a temporary file in `output_dir` that is renamed over the
/// destination once fully written, so an existing file is either replaced
/// whole or left untouched.
pub fn save(bytes: &[u8], output_dir: &Path, filename: &str) -> Result<PathBuf, FetchError> {
    fs::create_dir_all(output_dir).map_err(|err| FetchError::filesystem(output_dir, err))?;

    let destination = output_dir.join(filename);
    let mut staged =
        NamedTempFile::new_in(output_dir).map_err(|err| FetchError::filesystem(output_dir, err))?;

    let written = staged
        .write_all(bytes)
        .and_then(|()| readable_by_others(staged.as_file()))
        .and_then(|()| staged.as_file().sync_all());
    written.map_err(|err| FetchError::filesystem(staged.path(), err))?;

    staged
        .persist(&destination)
        .map_err(|err| FetchError::filesystem(&destination, err.error))?;

    tracing::info!(path = %destination.display(), bytes = bytes.len(), "saved plugin archive");
    Ok(destination)
}

/// Temp files start out 0600; archives get the mode a plain create would
/// give so a Jenkins service user can read them.
#[cfg(unix)]
fn readable_by_others(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(ARCHIVE_MODE))
}

#[cfg(not(unix))]
fn readable_by_others(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
