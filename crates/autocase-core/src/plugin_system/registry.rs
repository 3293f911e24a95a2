use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;

use crate::logging::{LogSink, default_sink, emit};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::ffi::FfiPlugin;
use crate::plugin_system::loader::{EntryPoints, LibraryLoader, ModuleLoader, NativeModule};
use crate::plugin_system::traits::{AutomationPlugin, PluginDescriptor};

/// Stable reference to a registry slot.
///
/// Handles are generational: once the plugin in a slot is unloaded, handles
/// issued for it no longer resolve, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginHandle {
    index: usize,
    generation: u32,
}

/// A registered plugin and the module that owns its code.
///
/// Field order matters: the instance is dropped (destroyed) before the
/// module is released.
struct LoadedPlugin {
    plugin: Box<dyn AutomationPlugin>,
    module: Option<Box<dyn NativeModule>>,
    descriptor: PluginDescriptor,
    source: Option<PathBuf>,
}

impl LoadedPlugin {
    /// Uninitialize, destroy the instance, then release the module.
    fn shut_down(self) {
        let LoadedPlugin { plugin, module, .. } = self;
        plugin.uninitialize();
        drop(plugin);
        drop(module);
    }
}

#[derive(Default)]
struct Slot {
    generation: u32,
    entry: Option<LoadedPlugin>,
}

/// Owns every loaded plugin together with its module.
///
/// The registry is not internally synchronized; callers serialize mutation.
pub struct PluginRegistry {
    slots: Vec<Slot>,
    by_name: BTreeMap<String, PluginHandle>,
    loader: Box<dyn ModuleLoader>,
    entry_points: EntryPoints,
    sink: Arc<dyn LogSink>,
}

impl PluginRegistry {
    /// Registry loading shared libraries from disk, logging through the `log` facade.
    pub fn new() -> Self {
        Self::with_loader(Box::new(LibraryLoader), default_sink())
    }

    pub fn with_loader(loader: Box<dyn ModuleLoader>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            slots: Vec::new(),
            by_name: BTreeMap::new(),
            loader,
            entry_points: EntryPoints::default(),
            sink,
        }
    }

    /// Override the exported symbol names/conventions looked up in modules.
    pub fn with_entry_points(mut self, entry_points: EntryPoints) -> Self {
        self.entry_points = entry_points;
        self
    }

    pub fn entry_points(&self) -> &EntryPoints {
        &self.entry_points
    }

    /// Load every module with the loader's library extension found directly
    /// in `dir`, in file name order. Returns the number of accepted plugins.
    ///
    /// A missing directory is reported and yields 0.
    pub fn load_from_directory(&mut self, dir: impl AsRef<Path>) -> usize {
        let dir = dir.as_ref();
        let candidates = match self.scan_directory(dir) {
            Ok(candidates) => candidates,
            Err(e) => {
                emit!(self.sink, Warn, "{}", e);
                return 0;
            }
        };

        emit!(
            self.sink,
            Debug,
            "Found {} candidate plugin module(s) in {}",
            candidates.len(),
            dir.display()
        );
        let loaded = candidates.iter().filter(|path| self.load(path)).count();
        emit!(self.sink, Info, "Loaded {} plugin(s) from {}", loaded, dir.display());
        loaded
    }

    fn scan_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, PluginSystemError> {
        if !dir.is_dir() {
            return Err(PluginSystemError::DirectoryNotFound { path: dir.to_path_buf() });
        }
        let io_err = |source| PluginSystemError::Io { path: dir.to_path_buf(), source };
        let extension = self.loader.library_extension();

        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if matches && path.is_file() {
                candidates.push(path);
            }
        }
        candidates.sort();
        Ok(candidates)
    }

    /// Load one module. Rejections are logged; see [`try_load`](Self::try_load)
    /// for the reason.
    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_load(path) {
            Ok(_) => true,
            Err(e) => {
                emit!(self.sink, Warn, "Rejected plugin module {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Open `path`, bind its entry points, instantiate and initialize the
    /// plugin. On any failure nothing stays registered and the module is
    /// released after the instance (if any) is destroyed.
    pub fn try_load(&mut self, path: impl AsRef<Path>) -> Result<PluginHandle, PluginSystemError> {
        let path = path.as_ref();
        let module = self.loader.open(path)?;
        let (factory, destructor) = self.entry_points.bind(module.as_ref())?;

        let raw = unsafe { factory.call() }
            .map_err(|message| PluginSystemError::InstantiationFailed { message })?;
        // On error from_raw has already destroyed the instance; `module` is
        // released when it goes out of scope.
        let plugin = unsafe { FfiPlugin::from_raw(raw, destructor) }?;

        self.admit(Box::new(plugin), Some(module), Some(path.to_path_buf()))
    }

    /// Register a plugin compiled into the host. Same validation and
    /// initialization rules as [`try_load`](Self::try_load).
    pub fn register(&mut self, plugin: Box<dyn AutomationPlugin>) -> Result<PluginHandle, PluginSystemError> {
        self.admit(plugin, None, None)
    }

    fn admit(
        &mut self,
        plugin: Box<dyn AutomationPlugin>,
        module: Option<Box<dyn NativeModule>>,
        source: Option<PathBuf>,
    ) -> Result<PluginHandle, PluginSystemError> {
        let name = plugin.name();
        if name.is_empty() {
            return Err(discard(plugin, module, PluginSystemError::EmptyName));
        }
        if self.by_name.contains_key(&name) {
            return Err(discard(plugin, module, PluginSystemError::DuplicateName { name }));
        }

        let version = plugin.version();
        if version.is_empty() {
            emit!(self.sink, Warn, "Plugin '{}' reports an empty version", name);
        } else if let Err(e) = Version::parse(&version) {
            emit!(self.sink, Warn, "Plugin '{}' version '{}' is not semver: {}", name, version, e);
        }

        if !plugin.initialize() {
            return Err(discard(plugin, module, PluginSystemError::InitializationFailed { name }));
        }

        let descriptor = PluginDescriptor {
            name: name.clone(),
            version,
            supported_actions: plugin.supported_actions(),
        };
        emit!(
            self.sink,
            Info,
            "Registered plugin '{}' v{} ({} action(s))",
            descriptor.name,
            descriptor.version,
            descriptor.supported_actions.len()
        );

        let entry = LoadedPlugin { plugin, module, descriptor, source };
        let handle = match self.slots.iter().position(|slot| slot.entry.is_none()) {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.entry = Some(entry);
                PluginHandle { index, generation: slot.generation }
            }
            None => {
                self.slots.push(Slot { generation: 0, entry: Some(entry) });
                PluginHandle { index: self.slots.len() - 1, generation: 0 }
            }
        };
        self.by_name.insert(name, handle);
        Ok(handle)
    }

    /// Uninitialize, destroy and release the named plugin.
    /// Returns false if no such plugin is registered.
    pub fn unload(&mut self, name: &str) -> bool {
        let Some(handle) = self.by_name.remove(name) else {
            return false;
        };
        let Some(slot) = self.slots.get_mut(handle.index) else {
            return false;
        };
        let Some(entry) = slot.entry.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);

        entry.shut_down();
        emit!(self.sink, Info, "Unloaded plugin '{}'", name);
        true
    }

    pub fn unload_all(&mut self) {
        let names: Vec<String> = self.by_name.keys().cloned().collect();
        for name in names {
            self.unload(&name);
        }
    }

    pub fn get_plugin(&self, name: &str) -> Option<PluginHandle> {
        self.by_name.get(name).copied()
    }

    /// Registered plugin names in sorted order
    pub fn list_plugins(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn entry(&self, handle: PluginHandle) -> Option<&LoadedPlugin> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn plugin(&self, handle: PluginHandle) -> Option<&dyn AutomationPlugin> {
        self.entry(handle).map(|entry| entry.plugin.as_ref())
    }

    pub fn descriptor(&self, handle: PluginHandle) -> Option<&PluginDescriptor> {
        self.entry(handle).map(|entry| &entry.descriptor)
    }

    /// Path the plugin was loaded from; `None` for registered in-process plugins.
    pub fn source(&self, handle: PluginHandle) -> Option<&Path> {
        self.entry(handle).and_then(|entry| entry.source.as_deref())
    }

    pub fn plugin_by_name(&self, name: &str) -> Option<&dyn AutomationPlugin> {
        self.get_plugin(name).and_then(|handle| self.plugin(handle))
    }

    /// Name to version for every registered plugin
    pub fn plugin_infos(&self) -> BTreeMap<String, String> {
        self.by_name
            .iter()
            .filter_map(|(name, handle)| {
                self.descriptor(*handle).map(|d| (name.clone(), d.version.clone()))
            })
            .collect()
    }

    /// Actions captured when the plugin was registered.
    pub fn supported_actions(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.get_plugin(name)
            .and_then(|handle| self.descriptor(handle))
            .map(|d| &d.supported_actions)
    }
}

/// Destroy a rejected instance, then release its module.
fn discard(
    plugin: Box<dyn AutomationPlugin>,
    module: Option<Box<dyn NativeModule>>,
    error: PluginSystemError,
) -> PluginSystemError {
    drop(plugin);
    drop(module);
    error
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        self.unload_all();
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.list_plugins())
            .field("loader", &self.loader)
            .field("entry_points", &self.entry_points)
            .finish()
    }
}
