//! # Plugin ABI
//!
//! A plugin module exports two unmangled C functions:
//!
//! - `create_plugin() -> *mut PluginVTable` builds a new instance
//! - `destroy_plugin(*mut PluginVTable)` destroys it
//!
//! Everything else crosses the boundary through the [`PluginVTable`]
//! function table. Structured data (step parameters, results, the action
//! list) travels as JSON strings allocated by the plugin and released with
//! the table's `free_string`.
//!
//! Host side, [`FfiPlugin`] wraps a table and implements
//! [`AutomationPlugin`]. Plugin side, [`into_vtable`] and [`destroy_vtable`]
//! (usually through [`declare_plugin!`](crate::declare_plugin)) turn any
//! `AutomationPlugin` into a table.
use std::collections::BTreeSet;
use std::ffi::{CStr, CString, c_void};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};

use serde::{Deserialize, Serialize};

use crate::kernel::constants::PLUGIN_ABI_VERSION;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::traits::{AutomationPlugin, PluginError, StepParam, StepResult};

/// Factory exported as `create_plugin`
pub type CreatePluginFn = unsafe extern "C" fn() -> *mut PluginVTable;
/// Destructor exported as `destroy_plugin`
pub type DestroyPluginFn = unsafe extern "C" fn(*mut PluginVTable);
pub type CreatePluginUnwindFn = unsafe extern "C-unwind" fn() -> *mut PluginVTable;
pub type DestroyPluginUnwindFn = unsafe extern "C-unwind" fn(*mut PluginVTable);

/// A module factory bound with its calling convention.
#[derive(Debug, Clone, Copy)]
pub enum Factory {
    C(CreatePluginFn),
    CUnwind(CreatePluginUnwindFn),
}

impl Factory {
    /// Ask the module for a new instance. A panic that unwinds out of a
    /// `C-unwind` factory is reported as an error.
    ///
    /// # Safety
    /// The function pointer must still be backed by a loaded module.
    pub unsafe fn call(self) -> Result<*mut PluginVTable, String> {
        match self {
            Factory::C(f) => Ok(unsafe { f() }),
            Factory::CUnwind(f) => panic::catch_unwind(|| unsafe { f() })
                .map_err(|payload| format!("panic: {}", panic_message(payload.as_ref()))),
        }
    }
}

/// A module destructor bound with its calling convention.
#[derive(Debug, Clone, Copy)]
pub enum Destructor {
    C(DestroyPluginFn),
    CUnwind(DestroyPluginUnwindFn),
}

impl Destructor {
    /// # Safety
    /// `vtable` must come from the paired [`Factory`] and the module must
    /// still be loaded.
    pub unsafe fn call(self, vtable: *mut PluginVTable) {
        match self {
            Destructor::C(f) => unsafe { f(vtable) },
            Destructor::CUnwind(f) => {
                let _ = panic::catch_unwind(AssertUnwindSafe(|| unsafe { f(vtable) }));
            }
        }
    }
}

/// Function table describing one plugin instance.
#[repr(C)]
pub struct PluginVTable {
    pub abi_version: u32,
    /// Opaque instance pointer owned by the plugin module
    pub instance: *mut c_void,
    pub name: extern "C" fn(instance: *const c_void) -> *mut c_char,
    pub version: extern "C" fn(instance: *const c_void) -> *mut c_char,
    /// JSON array of action names
    pub supported_actions: extern "C" fn(instance: *const c_void) -> *mut c_char,
    pub initialize: extern "C" fn(instance: *const c_void) -> bool,
    pub uninitialize: extern "C" fn(instance: *const c_void),
    /// JSON [`StepParam`] in, JSON [`StepOutcome`] out
    pub execute_step: extern "C" fn(instance: *const c_void, request: *const c_char) -> *mut c_char,
    pub free_string: extern "C" fn(s: *mut c_char),
}

/// Wire form of a step execution answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Completed(StepResult),
    Failed { message: String },
    Panicked { message: String },
}

impl From<Result<StepResult, PluginError>> for StepOutcome {
    fn from(result: Result<StepResult, PluginError>) -> Self {
        match result {
            Ok(r) => StepOutcome::Completed(r),
            Err(PluginError::Panicked(message)) => StepOutcome::Panicked { message },
            Err(e) => StepOutcome::Failed { message: e.to_string() },
        }
    }
}

impl From<StepOutcome> for Result<StepResult, PluginError> {
    fn from(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::Completed(r) => Ok(r),
            StepOutcome::Failed { message } => Err(PluginError::Raised(message)),
            StepOutcome::Panicked { message } => Err(PluginError::Panicked(message)),
        }
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic reason".to_string()
    }
}

// --- Host side ---

/// Host-side view of a plugin instance living behind a [`PluginVTable`].
///
/// Dropping the wrapper calls the module's destructor. The module itself must
/// outlive the wrapper; the registry guarantees that ordering.
pub struct FfiPlugin {
    vtable: NonNull<PluginVTable>,
    destroy: Destructor,
}

// The vtable is only reached through &self methods and the plugin contract
// requires Send + Sync implementations on the module side.
unsafe impl Send for FfiPlugin {}
unsafe impl Sync for FfiPlugin {}

impl FfiPlugin {
    /// Take ownership of a table returned by a module factory.
    ///
    /// On ABI mismatch the instance is destroyed before the error is returned.
    ///
    /// # Safety
    /// `vtable` must come from the factory paired with `destroy`, and both
    /// must stay callable (module still loaded) for the life of the wrapper.
    pub unsafe fn from_raw(
        vtable: *mut PluginVTable,
        destroy: Destructor,
    ) -> Result<Self, PluginSystemError> {
        let vtable = NonNull::new(vtable).ok_or_else(|| PluginSystemError::InstantiationFailed {
            message: "factory returned a null plugin table".to_string(),
        })?;
        let plugin = Self { vtable, destroy };
        let abi = plugin.table().abi_version;
        if abi != PLUGIN_ABI_VERSION {
            // `plugin` drops here and destroys the instance.
            return Err(PluginSystemError::AbiMismatch {
                expected: PLUGIN_ABI_VERSION,
                found: abi,
            });
        }
        Ok(plugin)
    }

    fn table(&self) -> &PluginVTable {
        unsafe { self.vtable.as_ref() }
    }

    fn instance(&self) -> *const c_void {
        self.table().instance as *const c_void
    }

    /// Copy a plugin-allocated string and hand it back to the plugin for release.
    fn take_string(&self, ptr: *mut c_char) -> Option<String> {
        if ptr.is_null() {
            return None;
        }
        let value = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        (self.table().free_string)(ptr);
        Some(value)
    }
}

impl AutomationPlugin for FfiPlugin {
    fn name(&self) -> String {
        self.take_string((self.table().name)(self.instance()))
            .unwrap_or_default()
    }

    fn version(&self) -> String {
        self.take_string((self.table().version)(self.instance()))
            .unwrap_or_default()
    }

    fn initialize(&self) -> bool {
        (self.table().initialize)(self.instance())
    }

    fn uninitialize(&self) {
        (self.table().uninitialize)(self.instance())
    }

    fn execute_step(&self, param: &StepParam) -> Result<StepResult, PluginError> {
        let request = serde_json::to_string(param)
            .map_err(|e| PluginError::InvalidResponse(format!("failed to encode step: {}", e)))?;
        let request = CString::new(request)
            .map_err(|e| PluginError::InvalidResponse(format!("step contains a NUL byte: {}", e)))?;
        let raw = (self.table().execute_step)(self.instance(), request.as_ptr());
        let response = self
            .take_string(raw)
            .ok_or_else(|| PluginError::InvalidResponse("null response".to_string()))?;
        let outcome: StepOutcome = serde_json::from_str(&response)
            .map_err(|e| PluginError::InvalidResponse(format!("{}: {}", e, response)))?;
        outcome.into()
    }

    fn supported_actions(&self) -> BTreeSet<String> {
        self.take_string((self.table().supported_actions)(self.instance()))
            .and_then(|json| serde_json::from_str::<Vec<String>>(&json).ok())
            .map(|actions| actions.into_iter().collect())
            .unwrap_or_default()
    }
}

impl Drop for FfiPlugin {
    fn drop(&mut self) {
        unsafe { self.destroy.call(self.vtable.as_ptr()) };
    }
}

// --- Plugin side ---

fn plugin_ref<'a, P>(instance: *const c_void) -> &'a P {
    unsafe { &*(instance as *const P) }
}

fn into_c_string(value: String) -> *mut c_char {
    match CString::new(value) {
        Ok(s) => s.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

extern "C" fn ffi_name<P: AutomationPlugin>(instance: *const c_void) -> *mut c_char {
    panic::catch_unwind(AssertUnwindSafe(|| plugin_ref::<P>(instance).name()))
        .map(into_c_string)
        .unwrap_or(ptr::null_mut())
}

extern "C" fn ffi_version<P: AutomationPlugin>(instance: *const c_void) -> *mut c_char {
    panic::catch_unwind(AssertUnwindSafe(|| plugin_ref::<P>(instance).version()))
        .map(into_c_string)
        .unwrap_or(ptr::null_mut())
}

extern "C" fn ffi_supported_actions<P: AutomationPlugin>(instance: *const c_void) -> *mut c_char {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let actions: Vec<String> = plugin_ref::<P>(instance).supported_actions().into_iter().collect();
        serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
    }))
    .map(into_c_string)
    .unwrap_or(ptr::null_mut())
}

extern "C" fn ffi_initialize<P: AutomationPlugin>(instance: *const c_void) -> bool {
    panic::catch_unwind(AssertUnwindSafe(|| plugin_ref::<P>(instance).initialize())).unwrap_or(false)
}

extern "C" fn ffi_uninitialize<P: AutomationPlugin>(instance: *const c_void) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| plugin_ref::<P>(instance).uninitialize()));
}

extern "C" fn ffi_execute_step<P: AutomationPlugin>(
    instance: *const c_void,
    request: *const c_char,
) -> *mut c_char {
    let outcome = if request.is_null() {
        StepOutcome::Failed { message: "null step request".to_string() }
    } else {
        let text = unsafe { CStr::from_ptr(request) }.to_string_lossy();
        match serde_json::from_str::<StepParam>(&text) {
            Ok(param) => {
                match panic::catch_unwind(AssertUnwindSafe(|| plugin_ref::<P>(instance).execute_step(&param))) {
                    Ok(result) => StepOutcome::from(result),
                    Err(payload) => StepOutcome::Panicked { message: panic_message(payload.as_ref()) },
                }
            }
            Err(e) => StepOutcome::Failed { message: format!("malformed step request: {}", e) },
        }
    };
    let json = serde_json::to_string(&outcome).unwrap_or_else(|_| {
        r#"{"Failed":{"message":"failed to encode step outcome"}}"#.to_string()
    });
    into_c_string(json)
}

extern "C" fn ffi_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = unsafe { CString::from_raw(s) };
    }
}

/// Box `plugin` and describe it with a freshly allocated [`PluginVTable`].
pub fn into_vtable<P: AutomationPlugin + 'static>(plugin: P) -> *mut PluginVTable {
    let instance = Box::into_raw(Box::new(plugin)) as *mut c_void;
    Box::into_raw(Box::new(PluginVTable {
        abi_version: PLUGIN_ABI_VERSION,
        instance,
        name: ffi_name::<P>,
        version: ffi_version::<P>,
        supported_actions: ffi_supported_actions::<P>,
        initialize: ffi_initialize::<P>,
        uninitialize: ffi_uninitialize::<P>,
        execute_step: ffi_execute_step::<P>,
        free_string: ffi_free_string,
    }))
}

/// Release a table produced by [`into_vtable::<P>`] together with its instance.
///
/// # Safety
/// `vtable` must have been returned by `into_vtable::<P>` with the same `P`
/// and must not be used afterwards.
pub unsafe fn destroy_vtable<P: AutomationPlugin + 'static>(vtable: *mut PluginVTable) {
    if vtable.is_null() {
        return;
    }
    let table = unsafe { Box::from_raw(vtable) };
    if !table.instance.is_null() {
        drop(unsafe { Box::from_raw(table.instance as *mut P) });
    }
}

/// Export `create_plugin` / `destroy_plugin` for a plugin type.
///
/// ```ignore
/// autocase_core::declare_plugin!(EchoPlugin, EchoPlugin::new);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($plugin:ty, $constructor:path) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn create_plugin() -> *mut $crate::plugin_system::ffi::PluginVTable {
            match ::std::panic::catch_unwind(|| $constructor()) {
                Ok(plugin) => $crate::plugin_system::ffi::into_vtable::<$plugin>(plugin),
                Err(_) => ::std::ptr::null_mut(),
            }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn destroy_plugin(vtable: *mut $crate::plugin_system::ffi::PluginVTable) {
            unsafe { $crate::plugin_system::ffi::destroy_vtable::<$plugin>(vtable) }
        }
    };
}
