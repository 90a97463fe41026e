//! Logging and tracing utilities

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for binaries and examples.
///
/// Honors `RUST_LOG` when set; otherwise logs the engine at debug and
/// everything else at info.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vnquery_engine=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
