//! deepresearch CLI entry point.

use clap::Parser;

use deepresearch::cli::{handle_error, load_config, Cli, Commands};
use deepresearch::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Init(args) = cli.command {
        if let Err(err) = deepresearch::cli::commands::init::execute(args, cli.json).await {
            handle_error(err, cli.json);
        }
        return;
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Ask(args) => deepresearch::cli::commands::ask::execute(args, &config, cli.json).await,
        Commands::History(args) => deepresearch::cli::commands::history::execute(args, &config, cli.json).await,
        Commands::Retry(args) => deepresearch::cli::commands::retry::execute(args, &config, cli.json).await,
        Commands::Ingest(args) => deepresearch::cli::commands::ingest::execute(args, &config, cli.json).await,
        Commands::Init(_) => Ok(()),
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
