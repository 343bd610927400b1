use std::io::{ErrorKind, Read};

use reqwest::blocking::Client;

use crate::error::{FetchError, NetworkError};

const CHUNK_SIZE: usize = 64 * 1024;
const PROGRESS_STEP: u64 = 1024 * 1024;
// Content-Length is untrusted; cap the up-front allocation.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Blocking HTTP downloader. One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct PluginFetcher {
    client: Client,
    show_progress: bool,
}

impl PluginFetcher {
    pub fn new() -> Result<Self, FetchError> {
        // The blocking client defaults to a 30s timeout; downloads wait on the transport instead.
        let client = Client::builder()
            .timeout(None)
            .build()
            .map_err(NetworkError::Client)?;
        Ok(Self {
            client,
            show_progress: false,
        })
    }

    /// Print download milestones to stderr.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Fetch the whole body of `url` into memory.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::info!(%url, "fetching plugin archive");
        if self.show_progress {
            eprintln!("Downloading from {url}...");
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|source| NetworkError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "plugin repository refused download");
            return Err(NetworkError::Status {
                url: url.to_string(),
                status,
            }
            .into());
        }

        let expected = response.content_length();
        let mut progress = DownloadProgress::new(expected);
        let mut body = Vec::with_capacity(expected.unwrap_or(0).min(MAX_PREALLOC) as usize);
        let mut chunk = vec![0u8; CHUNK_SIZE];

        // hyper fails the read when the body ends short of Content-Length.
        loop {
            let read = match response.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    tracing::warn!(%url, received = body.len(), "download interrupted");
                    return Err(NetworkError::Read {
                        url: url.to_string(),
                        source,
                    }
                    .into());
                }
            };
            body.extend_from_slice(&chunk[..read]);

            if let Some(line) = progress.advance(read as u64) {
                tracing::info!(received = progress.received, total = ?expected, "download progress");
                if self.show_progress {
                    eprintln!("  {line}");
                }
            }
        }

        tracing::info!(%url, bytes = body.len(), "download complete");
        if self.show_progress {
            eprintln!("Downloaded {} bytes", body.len());
        }
        Ok(body)
    }
}

/// Byte count for one download, reported in tenths of the expected size
/// or, without a Content-Length, once per MiB.
#[derive(Debug)]
struct DownloadProgress {
    total: Option<u64>,
    received: u64,
    step: u64,
    next_report: u64,
}

impl DownloadProgress {
    fn new(total: Option<u64>) -> Self {
        let step = match total {
            Some(total) => (total / 10).max(1),
            None => PROGRESS_STEP,
        };
        Self {
            total,
            received: 0,
            step,
            next_report: step,
        }
    }

    fn advance(&mut self, read: u64) -> Option<String> {
        self.received += read;
        if self.received < self.next_report {
            return None;
        }
        while self.next_report <= self.received {
            self.next_report += self.step;
        }

        Some(match self.total {
            Some(total) if total > 0 => format!(
                "{}/{total} bytes ({}%)",
                self.received,
                (self.received.min(total) * 100) / total
            ),
            _ => format!("{} bytes", self.received),
        })
    }
}
