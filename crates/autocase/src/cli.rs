use std::path::PathBuf;

use autocase_core::DispatchKey;
use clap::{Parser, Subcommand};

/// Autocase: plugin-driven UI test automation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Print "pong" and exit
    #[arg(long)]
    pub ping: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect plugin modules
    Plugins {
        #[command(subcommand)]
        command: PluginCommand,
    },
    /// Execute the test cases in a case file
    Run(RunArgs),
    /// Substitute ${set.item} references in a string
    Resolve {
        /// Data set files to import
        #[arg(long = "data", value_name = "FILE")]
        data: Vec<PathBuf>,
        /// Text containing references
        text: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// Load every plugin in a directory and list it
    List {
        /// Plugin directory
        #[arg(long, value_name = "DIR", default_value = autocase_core::kernel::constants::DEFAULT_PLUGINS_DIR)]
        dir: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Case file (a JSON array of cases or a single case)
    #[arg(long, value_name = "FILE")]
    pub cases: PathBuf,
    /// Plugin directory, overrides the configuration file
    #[arg(long, value_name = "DIR")]
    pub plugins: Option<PathBuf>,
    /// Data set files imported before the run, added to the configured ones
    #[arg(long = "data", value_name = "FILE")]
    pub data: Vec<PathBuf>,
    /// Configuration file (.json, .yaml, .toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Which step field plugins must support: action, target or either
    #[arg(long, value_name = "KEY")]
    pub dispatch_key: Option<DispatchKey>,
    /// Log step data and durations
    #[arg(long)]
    pub verbose: bool,
    /// Print results as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}
