//! Local cache of backend records.
//!
//! Records are stored as they come from the backend, sealed fields
//! included, so a cache-only read goes through the same unsealing path as a
//! remote read.

mod model;
mod repository;

pub use model::{CacheIndex, CacheKind, CacheQuery, Cacheable, timestamp_sort_key};
pub use repository::CacheRepository;
