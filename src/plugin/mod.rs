pub mod fetcher;
pub mod installer;
pub mod resolver;

pub use fetcher::PluginFetcher;
pub use installer::PluginInstaller;
pub use resolver::PluginRepository;
