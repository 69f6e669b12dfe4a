//! On-disk fingerprint-addressed artifact cache.
//!
//! Intermediate artifacts (downloaded footage, synthesized narration) are
//! stored under `<root>/<kind>/<fingerprint>.<ext>`. The fingerprint is a
//! pure function of the request parameters, so identical requests across
//! runs hit the same entry and skip the network.
//!
//! Writes are staged to a `.part` path inside the cache root and published
//! with a rename, so a concurrent reader can never observe a half-written
//! artifact. Artifacts consumed by an in-flight job are pinned and survive
//! age-based eviction.

pub mod error;
pub mod fingerprint;
pub mod manager;

pub use error::{CacheError, CacheResult};
pub use fingerprint::Fingerprint;
pub use manager::{CacheKind, CacheManager, CleanupReport, PinGuard, StagedEntry};
