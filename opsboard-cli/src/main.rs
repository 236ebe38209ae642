//! Opsboard CLI
//!
//! Command-line interface for the Opsboard dashboard backend: run the API
//! server, or query the directory and infrastructure providers directly.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use opsboard_api::ApiConfig;
use opsboard_core::traits::Provider;
use opsboard_inventory::Aggregator;
use opsboard_providers::{
    AwsProvider, DigitalOceanProvider, GoDaddyProvider, GraphDirectory,
};

/// Opsboard - administrative dashboard backend
#[derive(Parser)]
#[command(name = "opsboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// List directory users
    Users {
        /// Restrict to one mail domain
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// List verified directory domains
    Domains,

    /// List infrastructure inventory across all providers
    Infra,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "opsboard=debug,info"
    } else {
        "opsboard=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { port } => cmd_serve(port).await,
        Commands::Users { domain } => cmd_users(domain.as_deref()).await,
        Commands::Domains => cmd_domains().await,
        Commands::Infra => cmd_infra().await,
    }
}

/// Run the API server
async fn cmd_serve(port: u16) -> Result<()> {
    println!("{}", "🚀 Starting Opsboard API server...".cyan().bold());
    println!("   {} http://0.0.0.0:{}", "Listening on:".green(), port);

    opsboard_api::start_server(port).await?;
    Ok(())
}

/// List directory users
async fn cmd_users(domain: Option<&str>) -> Result<()> {
    let config = ApiConfig::from_env();
    let directory = GraphDirectory::with_config(config.directory);

    match domain {
        Some(domain) => println!("{} {}", "👤 Listing users in:".cyan().bold(), domain),
        None => println!("{}", "👤 Listing all directory users...".cyan().bold()),
    }

    let users = directory.get_users(domain).await?;

    for user in &users {
        let state = if user.account_enabled {
            "enabled ".green()
        } else {
            "disabled".red()
        };
        println!(
            "   [{}] {} - {} ({})",
            state,
            user.email,
            user.display_name,
            user.license_type.as_deref().unwrap_or("unlicensed"),
        );
    }

    let monthly: f64 = users.iter().filter_map(|u| u.monthly_cost()).sum();
    println!("\n{} {} user(s)", "Total:".yellow().bold(), users.len());
    println!("{} ${:.2}/month", "Estimated license spend:".yellow().bold(), monthly);

    Ok(())
}

/// List verified directory domains
async fn cmd_domains() -> Result<()> {
    let config = ApiConfig::from_env();
    let directory = GraphDirectory::with_config(config.directory);

    println!("{}", "🌐 Listing verified domains...".cyan().bold());

    let domains = directory.get_domains().await?;

    for domain in &domains {
        println!("   {} {}", "✓".green(), domain.name);
    }
    println!("\n{} {} domain(s)", "Total:".yellow().bold(), domains.len());

    Ok(())
}

/// List infrastructure inventory across all providers
async fn cmd_infra() -> Result<()> {
    let config = ApiConfig::from_env();

    let providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(DigitalOceanProvider::with_config(config.digitalocean)),
        Arc::new(AwsProvider::with_config(config.aws)),
        Arc::new(GoDaddyProvider::with_config(config.godaddy)),
    ];
    let aggregator = Aggregator::new(providers);

    println!("{}", "🖥️  Collecting infrastructure inventory...".cyan().bold());

    let aggregate = aggregator.collect(None).await;

    for item in &aggregate.items {
        let cost = item
            .monthly_cost
            .map(|c| format!("${c:.2}/mo"))
            .unwrap_or_else(|| "-".into());
        println!("   [{}] {} ({})", item.source.blue(), item.name, cost);
    }

    println!("\n{} {} item(s)", "Total:".yellow().bold(), aggregate.total);
    println!(
        "{} ${:.2}/month",
        "Total monthly cost:".yellow().bold(),
        aggregate.monthly_cost,
    );

    Ok(())
}
