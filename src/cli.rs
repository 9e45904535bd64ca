//! CLI definitions for stepwright.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Stepwright CLI.
#[derive(Parser)]
#[command(name = "stepwright")]
#[command(about = "Declarative web-UI test runner driving Chrome over CDP")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/stepwright.json", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run a test case file
    Run {
        /// Path to the test case JSON file
        test_case: PathBuf,

        /// Runtime variables as KEY=VALUE pairs
        #[arg(short, long, value_name = "KEY=VALUE")]
        var: Vec<String>,

        /// Keep the browser session open after the run
        #[arg(long)]
        keep_open: bool,

        /// Merge generated lead data into the variable map
        #[arg(long)]
        generate_lead: bool,
    },

    /// Autonomously explore a site, interacting with relevant elements
    Explore {
        /// The URL to start exploration from
        #[arg(long)]
        url: String,

        /// Maximum depth for page exploration
        #[arg(long)]
        max_depth: Option<usize>,

        /// Run the browser in headless mode
        #[arg(long)]
        headless: bool,
    },
}
