//! Facebooker CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: command-line flags select the endpoint,
//!    timeout, credentials file, and an optional pre-issued session.
//! 2. **Wire observability**: `tracing-subscriber` with a JSON layer on stderr
//!    and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP
//!    exporter.
//! 3. **Construct infrastructure**: a [`credentials::CredentialResolver`] and a
//!    [`transport::HttpTransport`] injected into a [`facebooker::Session`].
//! 4. **Run one sub-command** and print its result to stdout as JSON.

mod cli;
mod commands;
mod observability;

use clap::Parser;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _telemetry = observability::init()?;

    let run_id = Uuid::new_v4();
    let span = info_span!("facebooker", %run_id, command = cli.command.name());
    let output = commands::run(cli).instrument(span).await.inspect_err(|error| {
        error!(%run_id, error = %error, "command failed");
    })?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
