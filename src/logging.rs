use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber. `RUST_LOG` wins over the configured
/// level. Calling this twice leaves the first subscriber in place.
pub fn initialize(level: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());

    let result = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
