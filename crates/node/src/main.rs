// node/src/main.rs
use clap::{Parser, Subcommand};
use node::{BridgeConfig, Devnet, Step};
use query::methods::QueryMethods;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bridge-node")]
#[command(about = "Hub-and-spoke asset bridge devnet", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Configuration file path
        #[arg(short, long, default_value = "./bridge.toml")]
        config: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Build the devnet, link everything and print its state
    Status {
        /// Configuration file path; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Replay a JSON script of operations against a fresh devnet
    Simulate {
        /// Script file (JSON array of steps)
        script: String,

        #[arg(short, long)]
        config: Option<String>,

        /// Do not send the configured links before the script runs
        #[arg(long)]
        no_link: bool,
    },

    /// Answer one query method against a freshly linked devnet
    Query {
        /// Method name, e.g. hub_assetInfo
        method: String,

        /// Positional params as a JSON array
        #[arg(default_value = "[]")]
        params: String,

        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { config, force } => init_config(&config, force)?,
        Commands::Status { config } => show_status(config.as_deref())?,
        Commands::Simulate {
            script,
            config,
            no_link,
        } => simulate(&script, config.as_deref(), !no_link)?,
        Commands::Query {
            method,
            params,
            config,
        } => run_query(&method, &params, config.as_deref())?,
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> anyhow::Result<BridgeConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            BridgeConfig::from_file(path)
        }
        None => Ok(BridgeConfig::default()),
    }
}

fn linked_devnet(config_path: Option<&str>) -> anyhow::Result<Devnet> {
    let mut devnet = Devnet::new(load_config(config_path)?)?;
    let deliveries = devnet.link_all()?;
    tracing::info!("✓ {} link messages delivered", deliveries.len());
    Ok(devnet)
}

fn init_config(path: &str, force: bool) -> anyhow::Result<()> {
    if Path::new(path).exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path);
    }
    BridgeConfig::default().to_file(path)?;
    tracing::info!("Configuration written to {}", path);
    Ok(())
}

fn show_status(config_path: Option<&str>) -> anyhow::Result<()> {
    let devnet = linked_devnet(config_path)?;
    println!("{}", serde_json::to_string_pretty(&devnet.status()?)?);
    Ok(())
}

fn simulate(script_path: &str, config_path: Option<&str>, link_first: bool) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(script_path)?;
    let steps: Vec<Step> = serde_json::from_str(&contents)?;

    let mut devnet = if link_first {
        linked_devnet(config_path)?
    } else {
        Devnet::new(load_config(config_path)?)?
    };
    tracing::info!("Running {} script steps", steps.len());

    let outcomes = devnet.run_script(&steps);
    let failed = outcomes.iter().filter(|outcome| !outcome.ok).count();
    if failed > 0 {
        tracing::warn!("{} of {} steps rejected", failed, outcomes.len());
    }

    let report = serde_json::json!({
        "steps": outcomes,
        "status": devnet.status()?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_query(method: &str, params: &str, config_path: Option<&str>) -> anyhow::Result<()> {
    let params: serde_json::Value = serde_json::from_str(params)?;
    let devnet = linked_devnet(config_path)?;
    let result = QueryMethods::new(devnet.query()).handle(method, params)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
