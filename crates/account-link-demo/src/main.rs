//! anon-link - walk through anonymous-to-permanent account linking.

mod commands;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use link_config_and_utils::{init_logging, Config, Paths, ProviderKind};
use std::path::PathBuf;
use tracing::{debug, info};

/// anon-link - Sign in anonymously, link a test account, reset, repeat.
#[derive(Parser)]
#[command(name = "anon-link")]
#[command(about = "Demo of linking an anonymous session to an email account")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Authentication backend (defaults to the configured one)
    #[arg(short, long, global = true)]
    provider: Option<ProviderArg>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write JSONL logs here instead of ~/.anon-link/logs
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: type link, anon, signout, reset, clear, status, log, quit
    Run,

    /// Scripted walk-through: initialize, link, show status
    Demo,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderArg {
    /// In-process backend, no network
    Memory,
    /// Identity Toolkit REST API or its emulator
    IdentityToolkit,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Memory => ProviderKind::Memory,
            ProviderArg::IdentityToolkit => ProviderKind::IdentityToolkit,
        }
    }
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli, paths: &Paths) -> anyhow::Result<Config> {
    let mut config = Config::load(paths)
        .with_context(|| format!("loading {}", paths.config_file().display()))?;

    if let Some(provider) = cli.provider {
        config.provider = provider.into();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = load_config(&cli, &paths)?;

    let log_file = match &cli.log_file {
        Some(path) => path.clone(),
        None => {
            paths.ensure_dirs()?;
            paths.log_file()
        }
    };
    init_logging(&config, Some(log_file));
    info!(provider = ?config.provider, "anon-link starting");

    let provider = commands::build_provider(&config)?;
    let controller =
        account_link_engine::AccountSessionController::from_config(provider, &config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::interactive(&controller, &cli.format).await,
        Commands::Demo => commands::demo(&controller, &cli.format).await,
    }?;

    debug!("anon-link finished");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}
