//! Reference plugin for autocase.
//!
//! Built as a `cdylib`, it can be dropped into a plugin directory. Actions:
//!
//! | action      | result                                          |
//! |-------------|-------------------------------------------------|
//! | `echo`      | `value` returned as extra data                  |
//! | `uppercase` | `value` upper-cased                             |
//! | `reverse`   | `value` reversed                                |
//! | `wait`      | sleeps `value` milliseconds, bounded by timeout |
//! | `fail`      | raises an error carrying `value`                |
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use autocase_core::plugin_system::traits::{AutomationPlugin, PluginError, StepParam, StepResult};
use log::debug;

const ACTIONS: [&str; 5] = ["echo", "uppercase", "reverse", "wait", "fail"];

/// Error code for a `wait` longer than the step timeout
pub const ERR_TIMEOUT: i32 = 1;
/// Error code for a `wait` whose value is not a number
pub const ERR_BAD_VALUE: i32 = 2;

#[derive(Debug, Default)]
pub struct EchoPlugin {
    ready: AtomicBool,
}

impl EchoPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn wait(&self, param: &StepParam) -> StepResult {
        let Ok(ms) = param.value.trim().parse::<u64>() else {
            return StepResult::failure(ERR_BAD_VALUE, format!("Not a duration: '{}'", param.value));
        };
        if ms > param.timeout_ms {
            return StepResult::failure(
                ERR_TIMEOUT,
                format!("Wait of {}ms exceeds timeout of {}ms", ms, param.timeout_ms),
            );
        }
        thread::sleep(Duration::from_millis(ms));
        let mut result = StepResult::success(format!("Waited {}ms", ms));
        result.duration_ms = ms;
        result
    }
}

impl AutomationPlugin for EchoPlugin {
    fn name(&self) -> String {
        "EchoPlugin".to_string()
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> bool {
        self.ready.store(true, Ordering::SeqCst);
        true
    }

    fn uninitialize(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    fn execute_step(&self, param: &StepParam) -> Result<StepResult, PluginError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(PluginError::Raised("EchoPlugin is not initialized".to_string()));
        }
        debug!("EchoPlugin: {} on '{}'", param.action, param.target);
        let result = match param.action.as_str() {
            "echo" => StepResult::success(format!("Echoed to {}", param.target)).with_extra_data(&param.value),
            "uppercase" => StepResult::success("Upper-cased").with_extra_data(param.value.to_uppercase()),
            "reverse" => StepResult::success("Reversed").with_extra_data(param.value.chars().rev().collect::<String>()),
            "wait" => self.wait(param),
            "fail" => return Err(PluginError::Raised(param.value.clone())),
            other => return Err(PluginError::Raised(format!("Unknown action '{}'", other))),
        };
        Ok(result)
    }

    fn supported_actions(&self) -> BTreeSet<String> {
        ACTIONS.iter().map(|a| a.to_string()).collect()
    }
}

autocase_core::declare_plugin!(EchoPlugin, EchoPlugin::new);
