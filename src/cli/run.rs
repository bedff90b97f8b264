use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{
    ExitStatus,
    args::{Arguments, BuildCommand, Command},
};
use crate::{
    config::{CONFIG_FILE_NAME, ConfigLoadResult, default_config_json, load_config},
    core::scan::load_records,
    pipeline::{BuildOutput, BuildSettings, ClassDescriptor, compile_all},
};

pub struct BuildSummary {
    pub output: BuildOutput,
    pub records: usize,
    /// Directory the descriptors were written to, when `--apply` was given
    /// and the build was not aborted.
    pub written_to: Option<PathBuf>,
}

pub enum CommandResult {
    Build(BuildSummary),
    Init,
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CommandResult::Build(summary) if !summary.output.is_success() => ExitStatus::Failure,
            _ => ExitStatus::Success,
        }
    }
}

pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Build(cmd)) => build(cmd).map(CommandResult::Build),
        Some(Command::Init) => {
            init()?;
            Ok(CommandResult::Init)
        }
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}

fn build(cmd: BuildCommand) -> Result<BuildSummary> {
    let cwd = env::current_dir().context("Failed to resolve working directory")?;
    let ConfigLoadResult {
        mut config,
        from_file,
    } = load_config(&cwd)?;
    debug!(from_file, "configuration loaded");

    if cmd.continue_on_error {
        config.continue_on_error = true;
    }
    let output_dir = cmd
        .output_dir
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let settings = BuildSettings::from_config(&config)?;

    let records = load_records(&cmd.paths)?;
    let output = compile_all(&records, &settings);

    let written_to = if cmd.apply && !output.aborted {
        write_descriptors(&output_dir, &output.descriptors)?;
        Some(output_dir)
    } else {
        None
    };

    Ok(BuildSummary {
        output,
        records: records.len(),
        written_to,
    })
}

/// One file per class, named after the class.
fn write_descriptors(dir: &Path, descriptors: &[ClassDescriptor]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    for descriptor in descriptors {
        let path = dir.join(&descriptor.class);
        fs::write(&path, &descriptor.text)
            .with_context(|| format!("Failed to write descriptor: {}", path.display()))?;
        info!(path = %path.display(), "wrote descriptor");
    }
    Ok(())
}

fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", CONFIG_FILE_NAME);
    }
    fs::write(config_path, default_config_json()?)?;
    Ok(())
}
