use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::{path::PathBuf, sync::Arc};

use crate::collaborators::{CoinLedger, LogNotifier};
use crate::config::ScanConfig;
use crate::scanner::classifier::HttpClassifier;
use crate::scanner::frame::{DirFrameSource, FileFrameSource};
use crate::scanner::ScanController;

#[derive(Parser, Debug)]
#[command(name = "greenscan")]
#[command(about = "Scan waste items against a classification endpoint and earn Green Coins")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config JSON. If omitted, uses ./greenscan.json if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the classification endpoint URL.
    #[arg(long)]
    pub endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// One-shot scan of a single image file.
    Scan {
        image: PathBuf,
    },
    /// Live mode: sample frames from a directory on the capture period until
    /// interrupted (or for --duration-secs).
    Live {
        dir: PathBuf,
        #[arg(long)]
        duration_secs: Option<u64>,
    },
}

pub async fn dispatch(args: Args) -> Result<()> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("greenscan.json"));
    let mut config = ScanConfig::load(&config_path)?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let classifier = Arc::new(
        HttpClassifier::new(config.endpoint.clone(), config.classify_timeout())
            .context("failed to build classifier client")?,
    );
    let ledger = Arc::new(CoinLedger::new());
    let controller = ScanController::new(
        classifier,
        ledger.clone(),
        Arc::new(LogNotifier),
        config.clone(),
    );

    match args.cmd {
        Command::Scan { image } => {
            let source = FileFrameSource::new(image);
            let outcome = controller.scan_once(&source).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            info!("balance: {} Green Coins", ledger.balance());
        }
        Command::Live { dir, duration_secs } => {
            let source = Arc::new(DirFrameSource::new(&dir)?);
            let session_id = controller.start_live(source).await?;
            info!("live session {session_id} running, Ctrl-C to stop");

            match duration_secs {
                Some(secs) => {
                    tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
                }
                None => {
                    tokio::signal::ctrl_c()
                        .await
                        .context("failed to wait for Ctrl-C")?;
                }
            }

            controller.stop_live().await?;
            let snapshot = controller.snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            info!("balance: {} Green Coins", ledger.balance());
        }
    }

    Ok(())
}
