#[cfg(feature = "cli")]
pub mod cli;
pub mod run_config;
pub mod storage;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use run_config::RunConfig;
pub use storage::LocalStorage;
