//! Client-side synchronization core for chapter records: events, attendance,
//! membership candidates and voting sessions.
//!
//! The crate fetches remote collections through [`fetch::Fetch`], merges them
//! into keyed canonical mappings, recomputes derived views after each merge,
//! and skips refetching anything still within its freshness window. See
//! [`sync::SyncOrchestrator`] for the entry point.

pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use error::{Error, Result};
