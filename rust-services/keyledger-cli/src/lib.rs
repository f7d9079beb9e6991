//! Command-line surface for keyledger
//!
//! `keyledger create <hours> [note]` issues a key and prints exactly the key
//! on stdout. Every failure exits non-zero with the reason on stderr.
//! Arguments are validated before configuration is read, so a bad duration
//! is reported as invalid input even on a machine with no store settings.

use clap::{Parser, Subcommand};
use keyledger_keys::{
    IssueError, IssueResult, KeyIssuer, KeyRecord, ValidityHours, ValidityPackage,
};
use std::path::PathBuf;

/// Configuration could not be loaded or the store client could not be built
pub const EXIT_CONFIG: u8 = 1;
/// Bad duration, package or other argument
pub const EXIT_INVALID_INPUT: u8 = 2;
/// The record set could not be loaded
pub const EXIT_STORE_UNAVAILABLE: u8 = 3;
/// A key was generated but never confirmed as stored
pub const EXIT_PARTIAL_FAILURE: u8 = 4;

#[derive(Debug, Parser)]
#[command(name = "keyledger", version, about = "Issue time-limited access keys")]
pub struct Cli {
    /// Optional TOML config file, layered under KEYLEDGER_* environment variables
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Issue a key valid for HOURS hours
    Create {
        /// Validity in whole hours
        #[arg(allow_hyphen_values = true)]
        hours: String,
        /// Free-form label stored with the key
        note: Option<String>,
    },
    /// Issue a key for a named package (test, 1day, 7day, 30day)
    CreatePackage {
        package: String,
        note: Option<String>,
    },
}

/// A command whose arguments have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueRequest {
    Hours { hours: ValidityHours, note: String },
    Package { package: ValidityPackage, note: String },
}

impl Command {
    /// Parse the duration or package name; needs neither config nor store
    pub fn validate(&self) -> IssueResult<IssueRequest> {
        match self {
            Command::Create { hours, note } => Ok(IssueRequest::Hours {
                hours: hours.parse()?,
                note: note.clone().unwrap_or_default(),
            }),
            Command::CreatePackage { package, note } => Ok(IssueRequest::Package {
                package: package.parse()?,
                note: note.clone().unwrap_or_default(),
            }),
        }
    }
}

/// Execute a validated request against an issuer
pub async fn run(issuer: &KeyIssuer, request: &IssueRequest) -> IssueResult<KeyRecord> {
    match request {
        IssueRequest::Hours { hours, note } => issuer.create(*hours, note).await,
        IssueRequest::Package { package, note } => issuer.create_for_package(*package, note).await,
    }
}

/// Process exit status for an issuance failure
pub fn exit_code(error: &IssueError) -> u8 {
    match error {
        IssueError::InvalidInput(_) => EXIT_INVALID_INPUT,
        IssueError::StoreUnavailable(_) => EXIT_STORE_UNAVAILABLE,
        IssueError::PartialFailure { .. } => EXIT_PARTIAL_FAILURE,
        IssueError::GenerationExhausted(_) => EXIT_CONFIG,
    }
}
