//! # Autocase Core Kernel Errors
//!
//! Defines the umbrella [`Error`] type that every subsystem error converts
//! into, together with the crate-wide [`Result`] alias.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::data::error::DataStoreError;
use crate::engine::error::CaseFormatError;
use crate::plugin_system::error::PluginSystemError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Data set / data item invariant violations and import/export failures
    #[error("Data store error: {0}")]
    DataStore(#[from] DataStoreError),

    /// Test case import/export failures
    #[error("Test case format error: {0}")]
    CaseFormat(#[from] CaseFormatError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;
