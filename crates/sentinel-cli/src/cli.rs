use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Sentinel CLI: manage Microsoft Sentinel alert rules declaratively")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (overrides SENTINEL_CONFIG env var, default sentinel.toml)
    #[arg(short, long, global = true, env = "SENTINEL_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what applying a resource file would change
    Plan(FileArgs),
    /// Apply a resource file
    Apply(FileArgs),
    /// Read a remote alert rule by id
    Show(ShowArgs),
    /// Adopt an existing alert rule into the state
    Import(ImportArgs),
    /// Delete every resource of a resource file
    Destroy(FileArgs),
    /// Inspect the state file
    State(StateArgs),
    /// Inspect CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct FileArgs {
    /// Path to the TOML resource file
    pub file: String,
}

#[derive(clap::Args)]
pub struct ShowArgs {
    /// Resource type (e.g. azurerm_sentinel_alert_rule_fusion)
    pub resource_type: String,
    /// Alert rule resource id
    pub id: String,
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Resource type (e.g. azurerm_sentinel_alert_rule_fusion)
    pub resource_type: String,
    /// State address to import into (e.g. fusion.main)
    pub address: String,
    /// Alert rule resource id
    pub id: String,
}

#[derive(clap::Args)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommands,
}

#[derive(Subcommand)]
pub enum StateCommands {
    /// List managed resources
    List,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective config, secrets redacted
    Show,
}
