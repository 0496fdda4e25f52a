//! `nzcp cache-status`: how fresh the issuer cache is.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use nzcp_core::{cache_status, CacheStatus, Clock};

use crate::context::{print_json, Pipeline};

#[derive(Args, Debug)]
pub struct CacheStatusArgs {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    cache: CacheStatus,
    cached_issuers: Vec<String>,
    last_refresh: Option<i64>,
}

pub fn run_cache_status(_args: &CacheStatusArgs, store_path: &Path) -> Result<u8> {
    let pipeline = Pipeline::open(store_path, true)?;
    let cache = pipeline.resolver.cache();

    let mut cached_issuers: Vec<String> = pipeline
        .config
        .trusted_issuers
        .iter()
        .filter(|issuer| cache.get(issuer).is_some())
        .cloned()
        .collect();
    cached_issuers.sort();

    let report = StatusReport {
        cache: cache_status(
            cache.last_updated(),
            cache.max_age(),
            cache.clock().now(),
        ),
        cached_issuers,
        last_refresh: pipeline.store.last_refresh(),
    };
    print_json(&report)?;
    Ok(0)
}
