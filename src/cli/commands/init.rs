//! Implementation of the `deepresearch init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::setup::{init_project, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_file: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        format!("{}\nConfig: {}", self.message, self.config_file.display())
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir().context("Failed to get current directory")?.join(&args.path)
    };
    let paths = SetupPaths::in_dir(&target_path);

    if paths.is_initialized() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to rewrite the config.".to_string(),
            config_file: paths.config_file,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    init_project(&paths, args.force)?;

    let output_data = InitOutput {
        success: true,
        message: "Project initialized successfully.".to_string(),
        config_file: paths.config_file,
    };
    output(&output_data, json_mode);
    Ok(())
}
