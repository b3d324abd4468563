//! Logging facade. Call sites use `logger::info!` and friends; binaries call
//! [`setup`] once at startup.

pub use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// The filter honors `RUST_LOG` and falls back to the given default
/// directive. With `json` set, events are emitted as single-line JSON for
/// log shipping; otherwise the compact human format is used.
pub fn setup(default_directive: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}
