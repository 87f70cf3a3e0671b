//! Log output setup

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "swrkit=info";

/// Installs the global fmt subscriber, writing to stderr
///
/// Honours `RUST_LOG`; `verbose` raises the default to debug. Calling it
/// again after a subscriber is installed does nothing.
pub fn init(verbose: bool) {
    let default = if verbose { "swrkit=debug" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
