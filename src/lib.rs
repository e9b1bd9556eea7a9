//! Recview: Lazy Canonical Record Views
//!
//! A lazy, memoizing facade that exposes a persisted record's fields as
//! a uniform, read-only value model. Fields resolve through a
//! prioritized fallback chain (cache, indexed metadata, live accessor,
//! raw attributes) and every raw value normalizes into a closed
//! canonical union. Persistence, catalogs and the adapter registry are
//! consumed through traits; an instrumented in-memory implementation
//! ships in `source::memory`.

pub mod adapter;
pub mod error;
pub mod facade;
pub mod logging;
pub mod normalize;
pub mod serialize;
pub mod source;
pub mod types;
pub mod value;
