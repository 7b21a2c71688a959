//! Command-line entry point.
//!
//! ```bash
//! openapi-from-routes routes.yaml --source ./src -f json -o openapi.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_routes::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let args = cli::validate_args(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");
    Ok(())
}
