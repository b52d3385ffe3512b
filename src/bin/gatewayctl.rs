//! Operator CLI for the gateway (spec.md §6 ambient tooling): inspects the
//! declared endpoint set, reads individual config-store leaves, and checks
//! a running instance's health endpoint.

use clap::{Parser, Subcommand};
use dynagate::config::{self, AppConfig};
use dynagate::configstore::{ConfigCache, ConfigStoreClient, StaticConfigStore};
use dynagate::registry::EndpointRegistry;
use std::process;

#[derive(Parser)]
#[command(name = "gatewayctl")]
#[command(about = "Operator CLI for the dynamic data-access gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (same layering rules as the server process).
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Endpoint registry commands
    Endpoints {
        #[command(subcommand)]
        command: EndpointCommands,
    },

    /// Config store leaf commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Check a running gateway's /healthz and /readyz endpoints
    Health {
        /// Base URL of the gateway, e.g. http://127.0.0.1:8080
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        base_url: String,
    },
}

#[derive(Subcommand)]
enum EndpointCommands {
    /// List every endpoint currently declared in the config store
    List,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Read one leaf from the config store
    Get {
        /// Full path under the config root, e.g. endpoints/widgets/path
        path: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "gatewayctl=info");
    }
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let result = match cli.command {
        Commands::Endpoints { command: EndpointCommands::List } => list_endpoints(cli.config).await,
        Commands::Config { command: ConfigCommands::Get { path } } => config_get(cli.config, &path).await,
        Commands::Health { base_url } => check_health(&base_url).await,
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        process::exit(1);
    }
}

fn load_cli_config(config_path: Option<String>) -> anyhow::Result<AppConfig> {
    let loaded = match config_path {
        Some(path) => config::load_config_from_file(path)?,
        None => config::load_config_from_env()?,
    };
    Ok(loaded)
}

async fn load_cache(app_config: &AppConfig) -> anyhow::Result<ConfigCache> {
    let store = StaticConfigStore::new();
    let cache = ConfigCache::new();
    let tree = store.read_tree(&app_config.config_store.root_prefix).await?;
    for (path, value) in tree {
        let relative = path.strip_prefix(&app_config.config_store.root_prefix).unwrap_or(&path);
        cache.put(relative.trim_start_matches('/').to_string(), value);
    }
    Ok(cache)
}

async fn list_endpoints(config_path: Option<String>) -> anyhow::Result<()> {
    let app_config = load_cli_config(config_path)?;
    let cache = load_cache(&app_config).await?;

    let registry = EndpointRegistry::new();
    registry.rebuild(&cache)?;
    let snapshot = registry.current();

    if snapshot.is_empty() {
        println!("no endpoints declared");
        return Ok(());
    }

    println!("{:<24} {:<8} {:<28} {:<16}", "NAME", "METHOD", "PATH", "COLLECTION");
    println!("{}", "-".repeat(80));
    let mut descriptors: Vec<_> = snapshot.all().collect();
    descriptors.sort_by(|a, b| a.name.cmp(&b.name));
    for descriptor in descriptors {
        println!(
            "{:<24} {:<8} {:<28} {:<16}",
            descriptor.name, descriptor.method, descriptor.path, descriptor.collection
        );
    }

    Ok(())
}

async fn config_get(config_path: Option<String>, path: &str) -> anyhow::Result<()> {
    let app_config = load_cli_config(config_path)?;
    let cache = load_cache(&app_config).await?;

    match cache.get_string(path) {
        Some(value) => println!("{value}"),
        None => {
            eprintln!("no value at path '{path}'");
            process::exit(1);
        }
    }

    Ok(())
}

async fn check_health(base_url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    for probe in ["healthz", "readyz"] {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), probe);
        match client.get(&url).send().await {
            Ok(response) => println!("{probe}: {}", response.status()),
            Err(error) => println!("{probe}: unreachable ({error})"),
        }
    }

    Ok(())
}
