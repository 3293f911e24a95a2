//! # Autocase Core Kernel
//!
//! Wires the components of the crate into one [`Application`] and holds the
//! pieces everything else depends on.
//!
//! - **Bootstrapping**: [`Application`](bootstrap::Application) owns the
//!   [`DataStore`](crate::data::DataStore), the
//!   [`PluginRegistry`](crate::plugin_system::PluginRegistry) and the
//!   [`Orchestrator`](crate::engine::Orchestrator), and captures their log
//!   output as the execution log.
//! - **Constants**: names, the plugin ABI version and exported symbol names
//!   in the `constants` submodule.
//! - **Error Handling**: the umbrella [`Error`](error::Error) every subsystem
//!   error converts into, and the crate `Result` alias.
pub mod bootstrap;
pub mod constants;
pub mod error;

pub use bootstrap::Application;
pub use error::{Error, Result};
