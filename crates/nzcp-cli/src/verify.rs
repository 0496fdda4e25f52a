//! # Verify Subcommand
//!
//! `nzcp verify <payload>` runs one scanned payload through the pipeline
//! and prints the [`Verification`](nzcp_core::Verification) as JSON.
//!
//! Exit code 0 for a valid pass, 2 for any other outcome.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use nzcp_verifier::{TracingAnalyticsSink, Verifier};

use crate::context::{print_json, Pipeline};

/// Arguments for `nzcp verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// The scanned QR payload, e.g. `NZCP:/1/2KCE...`.
    pub payload: String,

    /// Resolve issuers from the local cache only.
    #[arg(long)]
    pub offline: bool,
}

pub async fn run_verify(args: &VerifyArgs, store_path: &Path) -> Result<u8> {
    let pipeline = Pipeline::open(store_path, args.offline)?;
    let verifier = Verifier::new(&pipeline.config, pipeline.resolver)
        .with_analytics(Arc::new(TracingAnalyticsSink));

    let verification = verifier.verify_payload(args.payload.trim()).await;
    print_json(&verification)?;
    // Give the spawned analytics task a chance to log before the runtime exits.
    tokio::task::yield_now().await;

    Ok(if verification.result.is_valid() { 0 } else { 2 })
}
