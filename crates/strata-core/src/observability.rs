//! Observability infrastructure for Strata.
//!
//! Structured logging with consistent spans. Cascade and reconciler
//! operations log per-level progress so partial failures can be traced
//! back to the exact table and entity.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `strata_catalog=debug`)
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for cascade deletion operations.
#[must_use]
pub fn cascade_span(operation: &str, root_id: &str) -> Span {
    tracing::info_span!("cascade", op = operation, root = root_id)
}

/// Creates a span for reconciler sweeps.
#[must_use]
pub fn reconcile_span(operation: &str) -> Span {
    tracing::info_span!("reconcile", op = operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Pretty);
    }

    #[test]
    fn span_helpers_create_spans() {
        let span = cascade_span("delete_workspace", "ws-123");
        let _guard = span.enter();
        tracing::info!("message in span");
    }
}
