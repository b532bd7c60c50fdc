//! # Error Handling
//!
//! This module defines the centralized error type for `packweave`. It uses the
//! `thiserror` library to create a single `Error` enum that covers every
//! failure mode of the configuration pipeline, from request validation to the
//! external bundler run.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors. Each
//!   variant carries enough context (paths, messages, bundler output) to be
//!   reported to the user without further lookup.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the library.
//!
//! Nothing in this crate retries. Errors are surfaced to the immediate caller,
//! which decides what to do; in watch mode they are delivered as build events
//! instead of ending the session.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for packweave operations
#[derive(Error, Debug)]
pub enum Error {
    /// The build request did not name any entry point.
    #[error("Missing main entry point: at least one entry is required")]
    MissingEntryPoint,

    /// A package manifest could not be read from disk.
    #[error("Failed to read manifest {}: {source}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A package manifest was read but is not usable structured data.
    #[error("Failed to parse manifest {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    /// A value could not be interpreted as a configuration fragment.
    #[error("Invalid configuration fragment: {message}")]
    InvalidFragment { message: String },

    /// The external bundler reported compile errors.
    ///
    /// All messages of one run are aggregated into a single error.
    #[error("Build failed with {} error(s):\n{}", errors.len(), errors.join("\n"))]
    Build { errors: Vec<String> },

    /// The external bundler could not be started or did not behave.
    #[error("Bundler error: {command} - {message}")]
    Bundler { command: String, message: String },

    /// An error occurred while parsing the settings file.
    #[error("Settings parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    SettingsParse {
        message: String,
        /// Optional hint for how to fix the settings file
        hint: Option<String>,
    },

    /// The filesystem watcher failed to start or watch a path.
    #[error("Watch error: {message}")]
    Watch { message: String },

    /// An error indicating that a lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch {
            message: err.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
