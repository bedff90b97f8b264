//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `build`: Compile scanner records into component descriptors
//! - `init`: Initialize dmdesc configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Build(cmd)) => cmd.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Class record files or directories containing them
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Write descriptor files (default prints them)
    #[arg(long)]
    pub apply: bool,

    /// Descriptor output directory (overrides config file)
    #[arg(long, env = "DMDESC_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Keep compiling after a class fails (overrides config file)
    #[arg(long)]
    pub continue_on_error: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile annotated class records into component descriptors
    Build(BuildCommand),
    /// Initialize a new .dmdescrc.json configuration file
    Init,
}
