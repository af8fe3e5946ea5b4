//! chronofy CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use chronofy_core::{TracingConfig, init_tracing};

use chronofy_cli::cli::{Cli, Command, ConfigAction};
use chronofy_cli::commands::{self, api};
use chronofy_cli::config::CliConfig;
use chronofy_cli::error::CliResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let config = match cli.config {
        Some(ref path) => CliConfig::load_from(path)?,
        None => CliConfig::load()?,
    };
    let format = cli.output_format();

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Command::Calendars => {
            let client = commands::build_client(cli.token.as_deref(), &config)?;
            api::calendars(&client, format).await
        }
        Command::Calendar { ref id } => {
            let client = commands::build_client(cli.token.as_deref(), &config)?;
            api::calendar(&client, id, format).await
        }
        Command::Events {
            from,
            to,
            ref tz,
            all,
        } => {
            let client = commands::build_client(cli.token.as_deref(), &config)?;
            api::events(&client, from, to, tz.as_deref(), all, format).await
        }
        Command::Authorize => {
            let client = commands::build_client(cli.token.as_deref(), &config)?;
            api::authorize(&client, format).await
        }
    }
}
