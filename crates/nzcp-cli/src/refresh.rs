//! # Refresh Subcommand
//!
//! `nzcp refresh` runs one cache refresh pass over every trusted issuer and
//! records when it completed, so the next invocation within the minimum
//! refresh age is skipped.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use nzcp_issuer::{CacheRefreshScheduler, RefreshOutcome};

use crate::context::{print_json, Pipeline};

/// Arguments for `nzcp refresh`.
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Refresh even if the last pass is younger than the minimum age.
    #[arg(long)]
    pub force: bool,
}

pub async fn run_refresh(args: &RefreshArgs, store_path: &Path) -> Result<u8> {
    let pipeline = Pipeline::open(store_path, false)?;
    let scheduler = CacheRefreshScheduler::new(
        pipeline.resolver.clone(),
        pipeline.config.issuer_cache_refresh_min_age,
    );

    let last_refresh = if args.force {
        None
    } else {
        pipeline.store.last_refresh()
    };
    let outcome = scheduler.refresh(last_refresh).await;

    if let RefreshOutcome::Completed(report) = &outcome {
        pipeline
            .store
            .set_last_refresh(report.refreshed_at)
            .context("recording refresh time")?;
    }
    print_json(&outcome)?;

    Ok(match &outcome {
        RefreshOutcome::Completed(report) if !report.failed.is_empty() => 2,
        _ => 0,
    })
}
