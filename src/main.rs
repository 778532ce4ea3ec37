// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dcf_comps::config::{config_path, load_config};
use dcf_comps::logging::init_logging;
use dcf_comps::pipeline::{self, RunContext};
use dcf_comps::progress::ConsoleReporter;
use dcf_comps::statements::ScreenerClient;
use dcf_comps::web::{self, AppState};
use dcf_comps::yahoo::YahooClient;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to $DCF_CONFIG, then config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the valuation workbook for a symbol
    Run {
        #[arg(long)]
        symbol: String,
        /// Output directory (defaults to `output_dir` from the config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the peer candidates for a symbol without fetching anything
    Peers {
        #[arg(long)]
        symbol: String,
    },
    /// Start the web server
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging("info");

    let cli = Cli::parse();
    let config = load_config(&config_path(cli.config.as_deref()))?;

    match cli.command {
        Some(Commands::Run { symbol, out_dir }) => {
            let market = YahooClient::new().context("Failed to build market data client")?;
            let statements = ScreenerClient::new(&config.statements_url, config.scrape_timeout())
                .context("Failed to build statements client")?;
            let ctx = RunContext {
                config: &config,
                market: &market,
                statements: &statements,
            };

            let reporter = ConsoleReporter::new();
            let result = pipeline::run(&ctx, &symbol, &reporter).await;
            reporter.finish();
            let output = result?;

            let dir = out_dir.unwrap_or_else(|| config.output_dir.clone());
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let path = dir.join(&output.file_name);
            std::fs::write(&path, &output.workbook)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            println!("✅ Wrote {}", path.display());
            println!("Peers ({}): {}", output.peers.len(), output.peers.join(", "));
            if !output.warnings.is_empty() {
                println!("⚠️  {} warnings", output.warnings.len());
            }
        }
        Some(Commands::Peers { symbol }) => {
            let peers = pipeline::peer_candidates(&config, &symbol)?;
            println!("Peer candidates ({}):", peers.len());
            for peer in peers {
                println!("  {}", peer);
            }
        }
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.port);
            web::start_server(AppState::from_config(config)?, port).await?;
        }
        None => {
            let port = config.port;
            web::start_server(AppState::from_config(config)?, port).await?;
        }
    }

    Ok(())
}
