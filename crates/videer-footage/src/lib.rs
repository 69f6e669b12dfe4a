//! Stock footage search and download.
//!
//! [`PexelsClient`] speaks the provider's wire contract; [`FootageResolver`]
//! turns a [`videer_models::FootageQuery`] into locally cached clips,
//! retrying transient network failures and isolating per-candidate download
//! failures so one bad link never sinks the whole query.

pub mod client;
pub mod error;
pub mod resolver;
pub mod retry;

pub use client::PexelsClient;
pub use error::{FootageError, FootageResult};
pub use resolver::{rank_candidates, FootageResolver, ResolveFailure, ResolveOutcome};
pub use retry::RetryPolicy;
