use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Failed to read config file '{path}': {cause}")]
    ConfigRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse config file '{path}': {cause}")]
    ConfigParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Failed to get metadata for '{path}': {cause}")]
    MetadataError { path: PathBuf, cause: io::Error },

    #[error("Failed to read directory '{path}': {cause}")]
    DirectoryRead { path: PathBuf, cause: io::Error },

    #[error("Failed to walk directory '{path}': {cause}")]
    DirectoryWalk {
        path: PathBuf,
        cause: walkdir::Error,
    },

    #[error("Failed to read cloud backup registry '{path}': {cause}")]
    RegistryRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse cloud backup registry '{path}': {cause}")]
    RegistryParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Failed to start command '{command}': {cause}")]
    CommandSpawn { command: String, cause: io::Error },

    #[error("Command '{command}' timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("Command '{command}' exited with code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to parse output of '{command}': {reason}")]
    OutputParse { command: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ExporterError>;
