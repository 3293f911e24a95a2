//! # Autocase Core Plugin System Errors
//!
//! [`PluginSystemError`] covers every reason a plugin module can be rejected
//! while loading or registering. None of these are fatal to the host: the
//! registry logs them and carries on with the remaining candidates.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Failed to open plugin module '{path}': {message}")]
    ModuleOpen { path: PathBuf, message: String },

    #[error("Plugin module '{path}' does not export symbol '{symbol}'")]
    MissingSymbol { path: PathBuf, symbol: String },

    #[error("Plugin factory failed: {message}")]
    InstantiationFailed { message: String },

    #[error("Plugin ABI mismatch: host expects version {expected}, module provides {found}")]
    AbiMismatch { expected: u32, found: u32 },

    #[error("Plugin reported an empty name")]
    EmptyName,

    #[error("A plugin named '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("Plugin '{name}' failed to initialize")]
    InitializationFailed { name: String },

    #[error("Plugin directory '{path}' does not exist")]
    DirectoryNotFound { path: PathBuf },

    #[error("I/O error while scanning '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
