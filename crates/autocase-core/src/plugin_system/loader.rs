//! # Module Loading
//!
//! The registry never touches a platform loading API directly. It asks a
//! [`ModuleLoader`] to open a path, then resolves the symbols named by
//! [`EntryPoints`] through the returned [`NativeModule`]. Closing a module is
//! dropping it.
//!
//! [`LibraryLoader`] uses `libloading` and is what the application runs with.
//! [`StaticModuleLoader`] serves in-process entry points under virtual paths,
//! which lets plugins linked into the host go through the exact same
//! load/unload sequence.
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;

use crate::kernel::constants::{CREATE_PLUGIN_SYMBOL, DESTROY_PLUGIN_SYMBOL};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::ffi::{
    CreatePluginFn, CreatePluginUnwindFn, DestroyPluginFn, DestroyPluginUnwindFn, Destructor, Factory,
};

/// ABI an exported function was compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallingConvention {
    /// `extern "C"`; a panic crossing the boundary aborts
    #[default]
    C,
    /// `extern "C-unwind"`; a panic unwinds into the host and is caught there
    CUnwind,
}

/// Name and ABI of one exported symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSpec {
    pub name: String,
    pub convention: CallingConvention,
}

impl SymbolSpec {
    pub fn new(name: impl Into<String>, convention: CallingConvention) -> Self {
        Self { name: name.into(), convention }
    }
}

/// The two exports every plugin module must provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoints {
    pub factory: SymbolSpec,
    pub destructor: SymbolSpec,
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self {
            factory: SymbolSpec::new(CREATE_PLUGIN_SYMBOL, CallingConvention::C),
            destructor: SymbolSpec::new(DESTROY_PLUGIN_SYMBOL, CallingConvention::C),
        }
    }
}

impl EntryPoints {
    /// Resolve both entry points in `module`. Either symbol missing makes the
    /// module invalid.
    pub fn bind(&self, module: &dyn NativeModule) -> Result<(Factory, Destructor), PluginSystemError> {
        let missing = |spec: &SymbolSpec| PluginSystemError::MissingSymbol {
            path: module.path().to_path_buf(),
            symbol: spec.name.clone(),
        };
        let create = module.resolve(&self.factory).ok_or_else(|| missing(&self.factory))?;
        let destroy = module.resolve(&self.destructor).ok_or_else(|| missing(&self.destructor))?;

        // SAFETY: the symbols are declared with these signatures by the
        // plugin ABI; the convention comes from the entry point description.
        let factory = unsafe {
            match self.factory.convention {
                CallingConvention::C => {
                    Factory::C(std::mem::transmute::<*const c_void, CreatePluginFn>(create.as_ptr()))
                }
                CallingConvention::CUnwind => Factory::CUnwind(std::mem::transmute::<
                    *const c_void,
                    CreatePluginUnwindFn,
                >(create.as_ptr())),
            }
        };
        let destructor = unsafe {
            match self.destructor.convention {
                CallingConvention::C => {
                    Destructor::C(std::mem::transmute::<*const c_void, DestroyPluginFn>(destroy.as_ptr()))
                }
                CallingConvention::CUnwind => Destructor::CUnwind(std::mem::transmute::<
                    *const c_void,
                    DestroyPluginUnwindFn,
                >(destroy.as_ptr())),
            }
        };
        Ok((factory, destructor))
    }
}

/// Address of a resolved, non-null symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolAddress(*const c_void);

// Addresses point into immutable code of a loaded module.
unsafe impl Send for SymbolAddress {}
unsafe impl Sync for SymbolAddress {}

impl SymbolAddress {
    /// Returns `None` for a null pointer.
    pub fn new(ptr: *const c_void) -> Option<Self> {
        if ptr.is_null() { None } else { Some(Self(ptr)) }
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0
    }
}

/// An opened module. Dropping it releases the module.
pub trait NativeModule: Send + Sync {
    fn path(&self) -> &Path;

    fn resolve(&self, symbol: &SymbolSpec) -> Option<SymbolAddress>;
}

/// Opens modules by path.
pub trait ModuleLoader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeModule>, PluginSystemError>;

    /// File extension (without dot) of candidate modules in a plugin directory.
    fn library_extension(&self) -> &str;
}

impl fmt::Debug for dyn ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("library_extension", &self.library_extension())
            .finish()
    }
}

// --- libloading ---

/// Loads shared libraries from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryLoader;

struct LibraryModule {
    path: PathBuf,
    library: Library,
}

impl NativeModule for LibraryModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self, symbol: &SymbolSpec) -> Option<SymbolAddress> {
        let resolved: libloading::Symbol<'_, unsafe extern "C" fn()> =
            unsafe { self.library.get(symbol.name.as_bytes()) }.ok()?;
        SymbolAddress::new(*resolved as *const c_void)
    }
}

impl ModuleLoader for LibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeModule>, PluginSystemError> {
        let library = unsafe { Library::new(path) }.map_err(|e| PluginSystemError::ModuleOpen {
            path: path.to_path_buf(),
            message: format!("libloading error: {}", e),
        })?;
        Ok(Box::new(LibraryModule { path: path.to_path_buf(), library }))
    }

    fn library_extension(&self) -> &str {
        std::env::consts::DLL_EXTENSION
    }
}

// --- in-process modules ---

type ReleaseHook = Arc<dyn Fn(&Path) + Send + Sync>;

/// Symbol table of an in-process module.
#[derive(Debug, Clone, Default)]
pub struct StaticModule {
    symbols: HashMap<String, SymbolAddress>,
}

impl StaticModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// A module exporting `create_plugin` and `destroy_plugin`.
    pub fn with_entry_points(create: CreatePluginFn, destroy: DestroyPluginFn) -> Self {
        Self::new()
            .with_symbol(CREATE_PLUGIN_SYMBOL, create as *const c_void)
            .with_symbol(DESTROY_PLUGIN_SYMBOL, destroy as *const c_void)
    }

    /// Export `address` under `name`. Null addresses are ignored.
    pub fn with_symbol(mut self, name: impl Into<String>, address: *const c_void) -> Self {
        if let Some(address) = SymbolAddress::new(address) {
            self.symbols.insert(name.into(), address);
        }
        self
    }
}

struct OpenedStaticModule {
    path: PathBuf,
    symbols: HashMap<String, SymbolAddress>,
    on_release: Option<ReleaseHook>,
}

impl NativeModule for OpenedStaticModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn resolve(&self, symbol: &SymbolSpec) -> Option<SymbolAddress> {
        self.symbols.get(&symbol.name).copied()
    }
}

impl Drop for OpenedStaticModule {
    fn drop(&mut self) {
        if let Some(hook) = &self.on_release {
            hook(&self.path);
        }
    }
}

/// Serves [`StaticModule`]s registered under virtual paths.
#[derive(Clone)]
pub struct StaticModuleLoader {
    modules: HashMap<PathBuf, StaticModule>,
    extension: String,
    on_release: Option<ReleaseHook>,
}

impl Default for StaticModuleLoader {
    fn default() -> Self {
        Self {
            modules: HashMap::new(),
            extension: std::env::consts::DLL_EXTENSION.to_string(),
            on_release: None,
        }
    }
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: impl Into<PathBuf>, module: StaticModule) -> Self {
        self.modules.insert(path.into(), module);
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Invoke `hook` with the module path whenever an opened module is released.
    pub fn on_release(mut self, hook: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.on_release = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for StaticModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticModuleLoader")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("extension", &self.extension)
            .finish()
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn NativeModule>, PluginSystemError> {
        let module = self.modules.get(path).ok_or_else(|| PluginSystemError::ModuleOpen {
            path: path.to_path_buf(),
            message: "no in-process module registered under this path".to_string(),
        })?;
        Ok(Box::new(OpenedStaticModule {
            path: path.to_path_buf(),
            symbols: module.symbols.clone(),
            on_release: self.on_release.clone(),
        }))
    }

    fn library_extension(&self) -> &str {
        &self.extension
    }
}
