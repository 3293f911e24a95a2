//! Minimal well-behaved plugin exporting both entry points.
use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::ptr;

#[repr(C)]
pub struct PluginVTable {
    pub abi_version: u32,
    pub instance: *mut c_void,
    pub name: extern "C" fn(*const c_void) -> *mut c_char,
    pub version: extern "C" fn(*const c_void) -> *mut c_char,
    pub supported_actions: extern "C" fn(*const c_void) -> *mut c_char,
    pub initialize: extern "C" fn(*const c_void) -> bool,
    pub uninitialize: extern "C" fn(*const c_void),
    pub execute_step: extern "C" fn(*const c_void, *const c_char) -> *mut c_char,
    pub free_string: extern "C" fn(*mut c_char),
}

fn owned(s: &str) -> *mut c_char {
    CString::new(s).map(CString::into_raw).unwrap_or(ptr::null_mut())
}

extern "C" fn name(_: *const c_void) -> *mut c_char {
    owned("probe")
}

extern "C" fn version(_: *const c_void) -> *mut c_char {
    owned("0.3.0")
}

extern "C" fn supported_actions(_: *const c_void) -> *mut c_char {
    owned(r#"["ping"]"#)
}

extern "C" fn initialize(_: *const c_void) -> bool {
    true
}

extern "C" fn uninitialize(_: *const c_void) {}

extern "C" fn execute_step(_: *const c_void, _request: *const c_char) -> *mut c_char {
    owned(r#"{"Completed":{"success":true,"message":"pong","error_code":0,"extra_data":"probe","duration_ms":0}}"#)
}

extern "C" fn free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe { drop(CString::from_raw(s)) };
    }
}

#[no_mangle]
pub extern "C" fn create_plugin() -> *mut PluginVTable {
    Box::into_raw(Box::new(PluginVTable {
        abi_version: 1,
        instance: ptr::null_mut(),
        name,
        version,
        supported_actions,
        initialize,
        uninitialize,
        execute_step,
        free_string,
    }))
}

#[no_mangle]
pub unsafe extern "C" fn destroy_plugin(vtable: *mut PluginVTable) {
    if !vtable.is_null() {
        drop(Box::from_raw(vtable));
    }
}
