//! Stale-while-revalidate data cache
//!
//! Consumers [`acquire`](Swr::acquire) a [`Binding`] for a key and a fetch
//! function. The binding serves whatever is cached immediately, fetches in the
//! background, and keeps refreshing on focus and timer triggers until it is
//! disposed. Fetches for a key are deduplicated within a configurable window,
//! and a failed fetch never replaces data that was fetched successfully.

mod binding;
mod engine;
mod env;
mod options;
mod store;
mod triggers;

pub use binding::Binding;
pub use engine::{Fetcher, Swr};
pub use env::{Environment, FocusSignal};
pub use options::{SwrOptions, DEFAULT_DEDUPING_INTERVAL};
pub use store::CacheStore;
pub use triggers::TriggerKind;
