//! Implementation of the `deepresearch retry` command.

use anyhow::Result;
use clap::Args;

use crate::cli::commands::ask::AnswerOutput;
use crate::cli::output::output;
use crate::domain::models::Config;
use crate::infrastructure::setup::build_stack;

#[derive(Args, Debug)]
pub struct RetryArgs {
    /// Session whose last answer should be regenerated
    #[arg(long, short)]
    pub session: String,
}

pub async fn execute(args: RetryArgs, config: &Config, json_mode: bool) -> Result<()> {
    let stack = build_stack(config).await?;
    let outcome = stack.orchestrator.retry_generation(&args.session).await?;

    output(&AnswerOutput::from(&outcome), json_mode);
    Ok(())
}
