//! prboard CLI - pull request review dashboard
//!
//! Serves a grid of open pull request review status per author and
//! repository, refreshed from GitHub search.

mod commands;
mod server;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use prboard_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{GridArgs, ServeArgs};

/// prboard: pull request review status dashboard
#[derive(Parser, Debug)]
#[command(name = "prboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/prboard/config.toml)
    #[arg(short, long, global = true, env = "PRBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Run the dashboard server
    #[command(visible_alias = "s")]
    Serve(ServeArgs),

    /// Fetch and print the review grid once
    #[command(visible_alias = "g")]
    Grid(GridArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load configuration with file and env overrides; subcommands apply flags
    let config = Config::load_with_overrides(cli.config.as_deref(), None, None)?;

    if cli.verbose {
        tracing::info!(
            repos = config.repos.len(),
            authors = config.authors.len(),
            ttl_secs = config.cache.ttl.as_secs(),
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("prboard {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve(args)) => {
            args.execute(config).await?;
        }
        Some(Commands::Grid(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => print_config(&config, cli.config.as_deref()),
        None => {
            println!("prboard - pull request review dashboard");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config, explicit_path: Option<&std::path::Path>) {
    println!("prboard Configuration");
    println!("=====================");
    println!();
    println!("Repositories:");
    for repo in &config.repos {
        println!("  {}", repo);
    }
    println!("Authors:");
    for author in &config.authors {
        println!("  {} ({})", author.name, author.github_user);
    }
    println!();
    println!("Server:");
    println!("  port: {}", config.server.port);
    println!(
        "  static_dir: {}",
        config
            .server
            .static_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("Cache:");
    println!("  ttl: {}s", config.cache.ttl.as_secs());
    println!("Search:");
    println!("  per_page: {}", config.search.per_page);
    println!("  page_cap: {}", config.search.page_cap);
    println!("  page_delay: {}ms", config.search.page_delay.as_millis());
    println!();

    let path = explicit_path
        .map(|p| p.to_path_buf())
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}
