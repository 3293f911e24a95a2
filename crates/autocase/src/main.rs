mod cli;

use std::process::ExitCode;

use autocase_core::kernel::error::Result;
use autocase_core::{AppConfig, Application, ExecutionResult, KernelError};
use clap::Parser;
use log::LevelFilter;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Commands, PluginCommand, RunArgs};

/// Route `log` records into `tracing` and print them on stderr.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(level: LevelFilter) {
    if LogTracer::init_with_filter(LevelFilter::Trace).is_err() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    let outcome = match args.command {
        Some(Commands::Plugins { command: PluginCommand::List { dir } }) => {
            init_logging(LevelFilter::Warn);
            list_plugins(AppConfig { plugin_dir: dir, ..AppConfig::default() })
        }
        Some(Commands::Run(run_args)) => run_cases(run_args),
        Some(Commands::Resolve { data, text }) => {
            init_logging(LevelFilter::Warn);
            resolve(AppConfig { data_files: data, ..AppConfig::default() }, &text)
        }
        None => {
            println!("No command given. Try `autocase --help`.");
            Ok(ExitCode::SUCCESS)
        }
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn list_plugins(config: AppConfig) -> Result<ExitCode> {
    let mut app = Application::with_config(config)?;
    app.initialize_from_config()?;

    let infos = app.plugin_infos();
    if infos.is_empty() {
        println!("No plugins loaded.");
        return Ok(ExitCode::SUCCESS);
    }
    for (name, version) in &infos {
        let version = if version.is_empty() { "unversioned" } else { version.as_str() };
        println!("{} {}", name, version);
        println!("  actions: {}", app.plugin_actions(name).join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

fn resolve(config: AppConfig, text: &str) -> Result<ExitCode> {
    let mut app = Application::with_config(config)?;
    // No plugins are needed; only the data files are imported.
    let files = app.config().data_files.clone();
    for file in &files {
        app.import_data(file)?;
    }

    let resolution = app.resolve_data_references(text);
    println!("{}", resolution.output);
    for unresolved in &resolution.unresolved {
        eprintln!("Unresolved reference: {}", unresolved);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_cases(args: RunArgs) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = args.plugins {
        config.plugin_dir = dir;
    }
    if let Some(key) = args.dispatch_key {
        config.dispatch_key = key;
    }
    config.data_files.extend(args.data);
    config.verbose |= args.verbose;

    init_logging(config.level_filter()?);

    let mut app = Application::with_config(config)?;
    app.initialize_from_config()?;
    let cases = app.load_test_cases(&args.cases)?;
    let results = app.execute_test_cases(&cases);

    if args.json {
        let json = serde_json::to_string_pretty(&results).map_err(|e| KernelError::Other(e.to_string()))?;
        println!("{}", json);
    } else {
        print_summary(&results);
    }

    app.uninitialize();
    if results.iter().all(|r| r.overall_success) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_summary(results: &[ExecutionResult]) {
    for result in results {
        let status = if result.overall_success { "PASS" } else { "FAIL" };
        println!(
            "[{}] {} ({} steps, {}ms)",
            status,
            result.case_name,
            result.step_results.len(),
            result.total_duration_ms
        );
        if let Some(message) = &result.error_message {
            println!("    {}", message);
        }
        for record in result.step_results.iter().filter(|r| !r.result.success) {
            println!(
                "    step {} failed ({}): {}",
                record.step_id, record.result.error_code, record.result.message
            );
        }
    }
    let passed = results.iter().filter(|r| r.overall_success).count();
    println!("{} passed, {} failed", passed, results.len() - passed);
}
