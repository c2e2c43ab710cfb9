//! Logging initialization.
//!
//! Structured logging via tracing-subscriber. The embedding binary calls
//! `init` once before doing anything else; `RUST_LOG` takes precedence
//! over the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `log_level` applies to this crate's targets; everything else defaults
/// to `info`.
pub fn init(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gauntlet={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
