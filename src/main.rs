use anyhow::Result;
use clap::Parser;
use cov_check::cli;
use tracing::error;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    if let Err(err) = cli::dispatch(args) {
        error!("{:#}", err);
        eprintln!("cov-check: {:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
