//! # nzcp CLI entry point
//!
//! Parses command-line arguments, initializes logging, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nzcp_cli::refresh::{run_refresh, RefreshArgs};
use nzcp_cli::status::{run_cache_status, CacheStatusArgs};
use nzcp_cli::verify::{run_verify, VerifyArgs};
use nzcp_cli::DEFAULT_STORE_PATH;

/// NZ COVID Pass verifier.
///
/// Verifies scanned NZCP QR payloads against trusted issuers, keeping issuer
/// keys cached for offline use. Trusted issuers and cache timings come from
/// the environment (`TRUSTED_ISSUER_LIST`, `ISSUER_CACHE_MAX_AGE_MS`, ...).
#[derive(Parser, Debug)]
#[command(name = "nzcp", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the persisted issuer cache.
    #[arg(long, global = true, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify a scanned pass payload.
    Verify(VerifyArgs),

    /// Refresh the cached documents of every trusted issuer.
    Refresh(RefreshArgs),

    /// Report how fresh the issuer cache is.
    CacheStatus(CacheStatusArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("nzcp CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Commands::Verify(args) => run_verify(args, &cli.store).await,
        Commands::Refresh(args) => run_refresh(args, &cli.store).await,
        Commands::CacheStatus(args) => run_cache_status(args, &cli.store),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_verify() {
        let cli = Cli::try_parse_from(["nzcp", "verify", "NZCP:/1/ABC"]).unwrap();
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.payload, "NZCP:/1/ABC");
        assert!(!args.offline);
        assert_eq!(cli.store, PathBuf::from(DEFAULT_STORE_PATH));
    }

    #[test]
    fn cli_parse_verify_offline_with_store() {
        let cli = Cli::try_parse_from([
            "nzcp",
            "verify",
            "--offline",
            "--store",
            "/tmp/issuers.json",
            "NZCP:/1/ABC",
        ])
        .unwrap();
        assert_eq!(cli.store, PathBuf::from("/tmp/issuers.json"));
        if let Commands::Verify(args) = cli.command {
            assert!(args.offline);
        }
    }

    #[test]
    fn cli_parse_refresh_force() {
        let cli = Cli::try_parse_from(["nzcp", "refresh", "--force"]).unwrap();
        let Commands::Refresh(args) = cli.command else {
            panic!("expected refresh");
        };
        assert!(args.force);
    }

    #[test]
    fn cli_parse_cache_status() {
        let cli = Cli::try_parse_from(["nzcp", "-vv", "--log-json", "cache-status"]).unwrap();
        assert!(matches!(cli.command, Commands::CacheStatus(_)));
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
    }

    #[test]
    fn cli_verify_requires_payload() {
        assert!(Cli::try_parse_from(["nzcp", "verify"]).is_err());
    }
}
