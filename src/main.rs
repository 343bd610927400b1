mod error;
mod model;
mod plugin;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use error::FetchError;
use model::config::AppConfig;
use model::request::DownloadRequest;
use plugin::{PluginFetcher, PluginInstaller, PluginRepository};

#[derive(Debug, Parser)]
#[command(
    name = "jenkins-plugin-fetch",
    about = "Download a Jenkins plugin archive (.hpi) from an update site"
)]
struct Cli {
    /// Plugin identifier, e.g. `git` or `workflow-aggregator`.
    plugin_name: String,

    /// Plugin version. The latest release is fetched when omitted.
    #[arg(short = 'v', long)]
    version: Option<String>,

    /// Directory the archive is written to (default: plugins).
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Update site base URL (overrides config value).
    #[arg(long, env = "JENKINS_PLUGIN_REPOSITORY")]
    repository_url: Option<String>,

    /// Config file to use instead of the per-user config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logging = init_logging();

    tracing::info!("jenkins-plugin-fetch starting");

    match run(&cli) {
        Ok(path) => {
            let shown = std::path::absolute(&path).unwrap_or(path);
            println!("downloaded {} to {}", cli.plugin_name.trim(), shown.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            if logging.records_failures() {
                tracing::error!("{err:#}");
            }
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf> {
    let config = AppConfig::load(cli.config.as_deref())?;

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir());
    let request = DownloadRequest::new(&cli.plugin_name, cli.version.as_deref(), output_dir)?;

    let repository = match cli.repository_url.as_deref() {
        Some(url) => PluginRepository::new(url),
        None => PluginRepository::from_config(&config.repository),
    };

    let installer = PluginInstaller::new(repository, PluginFetcher::new()?.with_progress(true));
    Ok(installer.install(&request)?)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<FetchError>()
        .map(FetchError::exit_code)
        .unwrap_or(1)
}

enum Logging {
    File { _guard: WorkerGuard },
    Stderr,
}

impl Logging {
    /// Terminal errors are already printed to stderr; only the log file
    /// needs its own copy.
    fn records_failures(&self) -> bool {
        matches!(self, Logging::File { .. })
    }
}

/// Log to a daily file in the data dir (never stdout). Falls back to
/// warnings on stderr when that directory is unusable.
fn init_logging() -> Logging {
    let log_dir = directories::ProjectDirs::from("", "", "jenkins-plugin-fetch")
        .map(|d| d.data_dir().to_path_buf())
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    let Some(log_dir) = log_dir else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::new("warn"))
            .init();
        return Logging::Stderr;
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jenkins_plugin_fetch=info"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "jenkins-plugin-fetch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    Logging::File { _guard: guard }
}
