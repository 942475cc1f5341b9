//! Per-repository commit style: analysis of history and its on-disk cache.

mod analyze;
mod cache;

pub use analyze::analyze;
pub use cache::{StyleCache, StyleProfile};
