//! Product Store Adapters - Cached Index Backends

pub mod postgrest;

pub use postgrest::PostgrestStore;
