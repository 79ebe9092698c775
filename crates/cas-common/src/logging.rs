//! Tracing bootstrap for the aggregation service.
//!
//! One builder path, switched on `LOG_FORMAT`: `json` emits flattened
//! single-line events for log aggregation, anything else emits ANSI
//! text for a terminal. Level filtering follows `RUST_LOG` (falling
//! back to `info`), e.g. `RUST_LOG=cas_aggregate=debug,tower_http=warn`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber and announce the service.
///
/// Call once, first thing in `main`; a second call panics because the
/// global subscriber is already set.
pub fn init_logging(service_name: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => EnvFilter::new("info"),
    };

    let wants_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if wants_json {
        builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        builder.with_ansi(true).init();
    }

    tracing::info!(service = %service_name, json = wants_json, "Logging initialised");
}
