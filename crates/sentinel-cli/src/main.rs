use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;
use sentinel_alert_rules::DynAlertRulesApi;
use sentinel_arm::ArmClient;
use sentinel_cli::cli::{Cli, Commands, ConfigCommands, StateCommands};
use sentinel_cli::config::{AppConfig, loader::load_config};
use sentinel_cli::output::{print_error, print_value};
use sentinel_cli::state::StateFile;
use sentinel_cli::{commands, observability};
use sentinel_resource::{Provider, Timeouts};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    // Load .env file if present; it's optional.
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    let cfg = load_config(cli.config.as_deref()).map_err(|e| anyhow!("Configuration error: {e}"))?;
    observability::init_tracing_with_level(&cfg.logging.level);
    tracing::debug!(
        subscription_id = %cfg.azure.subscription_id,
        endpoint = %cfg.azure.endpoint,
        "configuration loaded"
    );

    let stop = CancellationToken::new();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling in-flight operations");
                stop.cancel();
            }
        }
    });

    match &cli.command {
        Commands::Config(args) => match args.command {
            ConfigCommands::Show => {
                println!("{}: {}", "Config".cyan(), cli.config.as_deref().unwrap_or("sentinel.toml"));
                print_value(&serde_json::to_value(cfg.redacted())?, format);
            }
        },
        Commands::State(args) => match args.command {
            StateCommands::List => {
                let state = StateFile::load(&cfg.state.path)?;
                commands::state::list(&state, format)?;
            }
        },
        Commands::Show(args) => {
            let provider = make_provider(&cfg, stop)?;
            commands::resource::show(&provider, &args.resource_type, &args.id, format).await?;
        }
        Commands::Import(args) => {
            let provider = make_provider(&cfg, stop)?;
            let mut state = StateFile::load(&cfg.state.path)?;
            commands::resource::import(
                &provider,
                &mut state,
                &args.resource_type,
                &args.address,
                &args.id,
                format,
            )
            .await?;
        }
        Commands::Plan(args) => {
            let provider = make_provider(&cfg, stop)?;
            let mut state = StateFile::load(&cfg.state.path)?;
            commands::plan::plan(&provider, &mut state, &args.file, format).await?;
        }
        Commands::Apply(args) => {
            let provider = make_provider(&cfg, stop)?;
            let mut state = StateFile::load(&cfg.state.path)?;
            commands::plan::apply(&provider, &mut state, &args.file, format).await?;
        }
        Commands::Destroy(args) => {
            let provider = make_provider(&cfg, stop)?;
            let mut state = StateFile::load(&cfg.state.path)?;
            commands::plan::destroy(&provider, &mut state, &args.file, format).await?;
        }
    }

    Ok(())
}

fn make_provider(cfg: &AppConfig, stop: CancellationToken) -> Result<Provider> {
    let credential = cfg.azure.credential().map_err(|e| anyhow!(e))?;
    let client = ArmClient::new(&cfg.azure.endpoint, cfg.azure.subscription_id.clone(), credential)?;
    let api: DynAlertRulesApi = Arc::new(client);
    tracing::debug!(backend = api.backend_name(), "alert rule backend ready");
    Ok(Provider::new(api, Timeouts::from(&cfg.timeouts), stop))
}
