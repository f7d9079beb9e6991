//! keyledger
//!
//! Issues a time-limited access key, appends it to the gist-backed key list
//! and prints the key. Nothing but the key is ever written to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use keyledger_cli::{exit_code, run, Cli, EXIT_CONFIG};
use keyledger_config::AppConfig;
use keyledger_keys::{init_issuer, KeyIssuer};
use std::process::ExitCode;
use tracing::{error, info};

fn setup(cli: &Cli) -> Result<KeyIssuer> {
    let config = AppConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize logging
    keyledger_logging::init(config.log_format, "keyledger", config.log_level());

    info!(store = ?config.store, "Configuration loaded");

    init_issuer(&config).context("Failed to initialize key store client")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Bad arguments must not be reported as a configuration problem
    let request = match cli.command.validate() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(exit_code(&e));
        }
    };

    let issuer = match setup(&cli) {
        Ok(issuer) => issuer,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(&issuer, &request).await {
        Ok(record) => {
            println!("{}", record.key);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Key issuance failed");
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
