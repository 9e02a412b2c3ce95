use anyhow::Result;
use clap::Parser;
use playtrack::cli::{run, Args};
use tracing::error;

fn main() -> Result<()> {
    run(Args::parse()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    })?;
    Ok(())
}
