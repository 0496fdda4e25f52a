//! # nzcp-issuer — Issuer Key Resolution and Caching
//!
//! Resolves the public key documents of trusted NZCP issuers and keeps them
//! available offline:
//!
//! - **DID documents** ([`DidDocument`]): the `did:web` document model and
//!   assertion key selection.
//! - **Store** ([`IssuerStore`]): injected persistence for cached issuer
//!   documents. In-memory and JSON-file implementations are provided.
//! - **Cache** ([`IssuerCache`]): TTL-bounded view over a store. Expired
//!   entries are masked on read and swept by the scheduler.
//! - **Fetcher** ([`KeyDocumentFetcher`]): network retrieval of issuer
//!   documents; [`DidWebFetcher`] over HTTPS.
//! - **Resolver** ([`IssuerResolver`]): trust gate, cache read-through,
//!   bounded-time fetch, and write-back.
//! - **Scheduler** ([`CacheRefreshScheduler`]): debounced proactive refresh
//!   of every trusted issuer when connectivity returns.
//!
//! ## Shared State
//!
//! The store is the only mutable state shared between verifications and the
//! scheduler. Writes are atomic per key and last-write-wins; no cross-key
//! transactions exist or are needed.

pub mod cache;
pub mod did;
pub mod error;
pub mod fetch;
pub mod resolver;
pub mod scheduler;
pub mod store;

pub use cache::IssuerCache;
pub use did::{DidDocument, MethodReference, VerificationMethod};
pub use error::{DocumentError, FetchError, ResolveError, StoreError};
pub use fetch::{DidWebFetcher, KeyDocumentFetcher, OfflineFetcher};
pub use resolver::{CacheOptions, IssuerResolver};
pub use scheduler::{CacheRefreshScheduler, Connectivity, RefreshOutcome, RefreshReport};
pub use store::{CachedIssuer, InMemoryIssuerStore, IssuerStore, JsonFileIssuerStore};
