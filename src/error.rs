//! Error types for the carousel renderer

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for carousel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Install hint printed alongside dependency and launch failures.
pub const INSTALL_HINT: &str = "Install Google Chrome or Chromium, or point the CHROME environment variable at a Chrome executable.";

/// Errors that can occur while rendering a document
#[derive(Error, Debug)]
pub enum Error {
    /// The Markdown source does not exist
    #[error("Markdown file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// No browser executable could be found by any launch strategy
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// Every launch strategy was attempted and failed
    #[error("Failed to launch a browser ({} strategies tried)", .attempts.len())]
    LaunchFailed { attempts: Vec<String> },

    /// Failed to initialize the engine after launch
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a page
    #[error("Failed to load page: {0}")]
    LoadError(String),

    /// Failed to render or capture content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// In-page script evaluation failed or returned an unexpected value
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// Invalid configuration or preference value
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// File system error
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure.
    ///
    /// Missing input, missing dependencies and launch failures exit with `2`;
    /// everything else exits with `1`.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InputNotFound(_) | Error::MissingDependency(_) | Error::LaunchFailed { .. } => 2,
            _ => 1,
        }
    }
}
