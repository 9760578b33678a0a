use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logs go to stderr so command output on stdout stays clean.
/// `RUST_LOG` wins; otherwise `DEBUG_LOGGING=1` turns on debug for this crate.
pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_directive(debug_logging)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .try_init();

    tracing::debug!(debug_logging, "logging initialized");
}

fn fallback_directive(debug_logging: bool) -> &'static str {
    if debug_logging {
        "info,risk_dashboard=debug"
    } else {
        "info"
    }
}
