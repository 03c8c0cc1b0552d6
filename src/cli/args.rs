//! Command-line argument parsing for talentlens
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};

/// talentlens - Evidence-backed Q&A over workforce facts and documents
#[derive(Parser, Debug)]
#[command(name = "talentlens")]
#[command(version)]
#[command(about = "Ask natural-language questions about your workforce", long_about = None)]
pub struct Args {
    /// Question to answer against the demo dataset
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Wire a language-model delegate (Ollama) into the pipeline
    #[arg(long)]
    pub delegate: bool,

    /// Delegate model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Delegate host
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Delegate port
    #[arg(long, default_value_t = 11434)]
    pub port: u16,

    /// Print the full response as JSON instead of formatted text
    #[arg(long)]
    pub json: bool,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except the answer)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a short tour of demo questions
    Demo,

    /// Check delegate reachability and dataset health
    Doctor,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Check that a question or subcommand was provided
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_none() && self.question.is_none() {
            return Err(
                "Question required. Use 'talentlens \"<QUESTION>\"' or run a subcommand."
                    .to_string(),
            );
        }

        if self.command.is_some() && self.question.is_some() {
            return Err("Cannot specify a question with a subcommand.".to_string());
        }

        Ok(())
    }

    /// Get delegate base URL
    pub fn delegate_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Verbosity {
    /// Check if progress output should be shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
