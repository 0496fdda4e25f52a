//! # nzcp-cli — Command-Line Host for the NZCP Verifier
//!
//! Provides the `nzcp` binary. It plays the role of the scanning app: it
//! owns configuration, the persisted issuer store and connectivity, and
//! hands them to the library crates.
//!
//! ## Subcommands
//!
//! - `nzcp verify <payload> [--offline]` prints the verification outcome.
//! - `nzcp refresh [--force]` refreshes every trusted issuer.
//! - `nzcp cache-status` reports issuer cache freshness.
//!
//! ```bash
//! TRUSTED_ISSUER_LIST=did:web:nzcp.covid19.health.nz nzcp -v verify 'NZCP:/1/2KCEVIQEIVVWK6...'
//! nzcp --store ~/.nzcp/issuers.json refresh
//! ```

pub mod context;
pub mod refresh;
pub mod status;
pub mod verify;

/// Default location of the persisted issuer store.
pub const DEFAULT_STORE_PATH: &str = "nzcp-issuers.json";
