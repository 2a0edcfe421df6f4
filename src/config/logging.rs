use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

/// Initializes structured logging for the service.
///
/// Builds a `tracing_subscriber` registry with two layers:
/// 1. **EnvFilter**: verbosity taken from `RUST_LOG`
/// 2. **fmt**: human-readable lines on stdout
///
/// # Default Filtering Behavior
/// Without `RUST_LOG` the filter is `info`, with `hyper`, `reqwest` and
/// `redis` held at `warn` so upstream connection chatter does not drown out
/// skipped-record and cache messages.
///
/// Per-module control works as usual, e.g.
/// `RUST_LOG=post_pulse::services::normalizer=debug`.
///
/// Call once at the start of `main`; a second call panics because the
/// global subscriber is already set.
pub fn init_logging() {
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn,redis=warn".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
