use anyhow::Result;
use clap::Parser;
use greenscan::cli;
use log::error;

#[tokio::main]
async fn main() -> Result<()> {
    // Reads RUST_LOG, defaults to info.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = cli::Args::parse();
    if let Err(err) = cli::dispatch(args).await {
        error!("{err:#}");
        std::process::exit(1);
    }
    Ok(())
}
