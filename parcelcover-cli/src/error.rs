//! CLI error handling with user-friendly messages.

use std::process;

use parcelcover::config::ConfigError;
use parcelcover::error::EngineError;
use thiserror::Error;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid --filter pattern: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("invalid {flag} value '{value}'")]
    InvalidFlag { flag: &'static str, value: String },

    #[error("{0}")]
    Engine(#[from] EngineError),
}

impl CliError {
    /// Exit the process with an error message and a non-zero code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {self}");
        if let CliError::Engine(EngineError::NotFound { kind, name }) = self {
            if *kind == "layer" && name.contains("no reference layer") {
                eprintln!();
                eprintln!("Set the reference layer with --reference <layer> or in the");
                eprintln!("config file under [run] reference_layer.");
            }
        }
        process::exit(2)
    }
}
