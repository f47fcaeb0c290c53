//! Glimpse CLI
//!
//! Command-line interface for the Glimpse caching profile relay.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glimpse_api::{ApiConfig, ApiServer};
use glimpse_core::constants::{DEFAULT_UPSTREAM_TIMEOUT_SECONDS, DEFAULT_UPSTREAM_URL};
use glimpse_core::types::ProfileRecord;
use glimpse_relay::{Notifier, ProfileRelay, RelayOptions};
use glimpse_upstream::UpstreamConfig;

/// Glimpse - caching relay for public profile lookups
#[derive(Parser)]
#[command(name = "glimpse")]
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
    /// Run the relay API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000", env = "PORT")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Look up a single profile and print it
    Lookup {
        /// Profile handle
        handle: String,
        /// Upstream profile endpoint
        #[arg(long, env = "UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
        upstream_url: String,
        /// Upstream timeout in seconds
        #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECONDS)]
        timeout: u64,
        /// Print raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "glimpse=debug,info"
    } else {
        "glimpse=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
        Commands::Lookup {
            handle,
            upstream_url,
            timeout,
            json,
        } => cmd_lookup(&handle, upstream_url, timeout, json).await,
    }
}

/// Run the API server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    println!("{}", "🚀 Starting Glimpse relay...".cyan().bold());
    println!("   {} http://{}:{}", "Listening on:".green(), bind, port);
    println!("   {} http://{}:{}/health", "Health check:".dimmed(), bind, port);
    println!("\n   Press Ctrl+C to stop.\n");

    let config = ApiConfig::from_env();
    let server = ApiServer::new(config).context("Invalid relay configuration")?;

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .context("Invalid bind address")?;
    tracing::debug!(%addr, "Resolved bind address");
    server.run(addr).await?;

    Ok(())
}

/// Look up one profile, bypassing the server
async fn cmd_lookup(handle: &str, upstream_url: String, timeout: u64, json: bool) -> Result<()> {
    println!("{} {}", "🔍 Looking up:".cyan().bold(), handle);

    tracing::debug!(upstream = %upstream_url, timeout, "One-shot lookup");
    let upstream = UpstreamConfig::new(upstream_url).with_timeout(Duration::from_secs(timeout));
    let relay = ProfileRelay::from_config(upstream, RelayOptions::default(), Notifier::log_only())
        .context("Invalid upstream configuration")?;

    let record = relay
        .lookup(handle)
        .await
        .with_context(|| format!("Lookup of '{}' failed", handle))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }

    Ok(())
}

fn print_record(record: &ProfileRecord) {
    fn show<T: std::fmt::Display>(value: &Option<T>) -> String {
        value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".dimmed().to_string())
    }

    println!("\n{}", "✅ Profile:".green().bold());
    println!("   {} {}", "Username:".dimmed(), show(&record.handle));
    println!("   {} {}", "Name:".dimmed(), show(&record.display_name));
    println!("   {} {}", "Followers:".dimmed(), show(&record.follower_count));
    println!("   {} {}", "Following:".dimmed(), show(&record.following_count));
    println!("   {} {}", "Posts:".dimmed(), show(&record.post_count));
    println!("   {} {}", "Bio:".dimmed(), show(&record.biography));
    println!("   {} {}", "Avatar:".dimmed(), show(&record.avatar_url));
}
