//! # Autocase Core Plugin System
//!
//! Loads automation plugins, keeps them registered by name, and tears them
//! down in a fixed order: uninitialize, destroy the instance, release the
//! module.
//!
//! ## Key Submodules
//!
//! - **[`traits`]**: the [`AutomationPlugin`] contract and the step types
//!   ([`StepParam`], [`StepResult`]) that cross it.
//! - **[`ffi`]**: the C ABI a plugin module exports, the host-side
//!   [`FfiPlugin`](ffi::FfiPlugin) wrapper and the
//!   [`declare_plugin!`](crate::declare_plugin) export macro.
//! - **[`loader`]**: the [`ModuleLoader`] abstraction over opening modules
//!   and resolving symbols, with a `libloading` backend and an in-process one.
//! - **[`registry`]**: the [`PluginRegistry`] arena.
//! - **[`error`]**: [`PluginSystemError`], every reason a module is rejected.
pub mod error;
pub mod ffi;
pub mod loader;
pub mod registry;
pub mod traits;

pub use error::PluginSystemError;
pub use loader::{
    CallingConvention, EntryPoints, LibraryLoader, ModuleLoader, NativeModule, StaticModule,
    StaticModuleLoader, SymbolSpec,
};
pub use registry::{PluginHandle, PluginRegistry};
pub use traits::{AutomationPlugin, PluginDescriptor, PluginError, StepParam, StepResult};
