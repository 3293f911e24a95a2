use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::engine::hooks::{LoggingHooks, ScriptHooks};
use crate::engine::model::{
    DispatchKey, ERR_ACTION_NOT_SUPPORTED, ERR_PLUGIN_NOT_FOUND, ERR_PLUGIN_RAISED, ERR_UNKNOWN_FAILURE,
    ExecutionResult, RunPhase, StepRecord, TestCase, TestStep,
};
use crate::logging::{LogSink, emit};
use crate::plugin_system::ffi::panic_message;
use crate::plugin_system::registry::PluginRegistry;
use crate::plugin_system::traits::{AutomationPlugin, PluginError, StepResult};

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Runs test cases step by step against a [`PluginRegistry`].
///
/// Execution is synchronous: each plugin call blocks until it returns.
/// Failures inside a step never escape it; they become a failed
/// [`StepResult`] with one of the `ERR_*` codes.
pub struct Orchestrator {
    dispatch_key: DispatchKey,
    verbose: bool,
    hooks: Box<dyn ScriptHooks>,
    sink: Arc<dyn LogSink>,
}

impl Orchestrator {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            dispatch_key: DispatchKey::default(),
            verbose: false,
            hooks: Box::new(LoggingHooks::new(sink.clone())),
            sink,
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn ScriptHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_dispatch_key(mut self, dispatch_key: DispatchKey) -> Self {
        self.dispatch_key = dispatch_key;
        self
    }

    pub fn dispatch_key(&self) -> DispatchKey {
        self.dispatch_key
    }

    pub fn set_dispatch_key(&mut self, dispatch_key: DispatchKey) {
        self.dispatch_key = dispatch_key;
    }

    /// Verbose runs also log step return data and per-step durations.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn enter(&self, case: &TestCase, from: RunPhase, to: RunPhase) -> RunPhase {
        emit!(self.sink, Trace, "Case '{}': {} -> {}", case.name, from, to);
        to
    }

    /// Run one case. The case is only read.
    pub fn execute_test_case(&self, registry: &PluginRegistry, case: &TestCase) -> ExecutionResult {
        let clock = Instant::now();
        let mut result = ExecutionResult {
            case_id: case.id,
            case_name: case.name.clone(),
            overall_success: false,
            step_results: Vec::with_capacity(case.steps.len()),
            total_duration_ms: 0,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            aborted: false,
            error_message: None,
        };
        emit!(self.sink, Info, "Starting execution of test case: {}", case.name);
        let mut phase = RunPhase::Created;

        if !case.setup_script.is_empty() {
            phase = self.enter(case, phase, RunPhase::SetupRunning);
            emit!(self.sink, Info, "Executing setup script");
            if let Err(e) = self.hooks.setup(&case.setup_script) {
                emit!(self.sink, Error, "Setup script failed: {}", e);
                result.error_message = Some(format!("Setup script failed: {}", e));
                result.aborted = true;
                self.enter(case, phase, RunPhase::Aborted);
                return finish(result, clock);
            }
        }

        phase = self.enter(case, phase, RunPhase::StepsRunning);
        for step in &case.steps {
            let record = self.execute_test_step(registry, step);
            let failed = !record.result.success;
            result.step_results.push(record);
            // A failed optional step never stops the run.
            if failed && step.stop_on_failure && !step.is_optional {
                emit!(self.sink, Warn, "Step {} failed. Stopping test case execution.", step.id);
                result.aborted = true;
                phase = self.enter(case, phase, RunPhase::Aborted);
                break;
            }
        }

        if !case.teardown_script.is_empty() {
            phase = self.enter(case, phase, RunPhase::TeardownRunning);
            emit!(self.sink, Info, "Executing teardown script");
            if let Err(e) = self.hooks.teardown(&case.teardown_script) {
                emit!(self.sink, Error, "Teardown script failed: {}", e);
            }
        }

        // Records line up with the first N authored steps.
        result.overall_success = !result.step_results.is_empty()
            && result
                .step_results
                .iter()
                .zip(&case.steps)
                .all(|(record, step)| step.is_optional || record.result.success);
        emit!(
            self.sink,
            Info,
            "Test case {} execution completed. {}",
            case.name,
            if result.overall_success { "Success" } else { "Failed" }
        );
        self.enter(case, phase, RunPhase::Completed);
        finish(result, clock)
    }

    /// Run cases one after another.
    pub fn execute_test_cases(&self, registry: &PluginRegistry, cases: &[TestCase]) -> Vec<ExecutionResult> {
        cases.iter().map(|case| self.execute_test_case(registry, case)).collect()
    }

    /// Resolve the step's plugin, check support and dispatch.
    pub fn execute_test_step(&self, registry: &PluginRegistry, step: &TestStep) -> StepRecord {
        let started_at = Utc::now();
        let clock = Instant::now();
        emit!(
            self.sink,
            Info,
            "Executing step {}: {} on {}",
            step.id,
            step.param.action,
            step.param.target
        );

        let mut result = match registry.plugin_by_name(&step.plugin_name) {
            None => StepResult::failure(ERR_PLUGIN_NOT_FOUND, format!("Plugin not found: {}", step.plugin_name)),
            Some(plugin) => self.dispatch(plugin, step),
        };

        let duration_ms = elapsed_ms(clock);
        if result.duration_ms == 0 {
            result.duration_ms = duration_ms;
        }
        if result.success {
            emit!(self.sink, Info, "Step {} completed successfully", step.id);
            if self.verbose && !result.extra_data.is_empty() {
                emit!(self.sink, Info, "Step {} returned data: {}", step.id, result.extra_data);
            }
        } else {
            emit!(self.sink, Error, "Step {} failed: {}", step.id, result.message);
        }
        if self.verbose {
            emit!(self.sink, Info, "Step {} execution time: {}ms", step.id, duration_ms);
        }

        StepRecord { step_id: step.id, result, started_at, duration_ms }
    }

    fn dispatch(&self, plugin: &dyn AutomationPlugin, step: &TestStep) -> StepResult {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            let actions = plugin.supported_actions();
            if !self.dispatch_key.accepts(&step.param, |key| actions.contains(key)) {
                return Ok(StepResult::failure(
                    ERR_ACTION_NOT_SUPPORTED,
                    format!(
                        "Plugin {} does not support action: {}",
                        step.plugin_name,
                        self.dispatch_key.key_of(&step.param)
                    ),
                ));
            }
            plugin.execute_step(&step.param)
        }));

        match attempt {
            Ok(Ok(result)) => result,
            Ok(Err(PluginError::Panicked(message))) => {
                StepResult::failure(ERR_UNKNOWN_FAILURE, format!("Unknown failure in plugin: {}", message))
            }
            Ok(Err(e)) => StepResult::failure(ERR_PLUGIN_RAISED, format!("Exception occurred: {}", e)),
            Err(payload) => StepResult::failure(
                ERR_UNKNOWN_FAILURE,
                format!("Unknown failure in plugin: {}", panic_message(payload.as_ref())),
            ),
        }
    }
}

fn finish(mut result: ExecutionResult, clock: Instant) -> ExecutionResult {
    result.finished_at = Utc::now();
    result.total_duration_ms = elapsed_ms(clock);
    result
}
