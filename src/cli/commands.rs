//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: fire the probes and print the report (default)
//! - token: analyze the Vertex access token and probe Vertex AI only
//! - list: show the declared probes

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::probe::ProbeName;

/// apicheck - verify the Gemini, Gemini Live and Vertex AI integrations
#[derive(Parser, Debug)]
#[command(name = "apicheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (per-probe detail lines)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the probes and print the report
    Run {
        /// Only run these probes (gemini-rest, gemini-live, vertex-ai, multimodal)
        #[arg(short, long, value_delimiter = ',')]
        only: Vec<ProbeName>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the Vertex access token format and probe Vertex AI with it
    Token,

    /// List the declared probes and the credentials they need
    List,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run {
            only: Vec::new(),
            json: false,
        }
    }
}
