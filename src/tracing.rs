//! Tracing initialization.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Build the filter: `RUST_LOG` first, then `LOG_LEVEL`, then the given default.
fn env_filter(default: tracing::Level) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.trim().to_lowercase().parse::<tracing::Level>().ok())
        .unwrap_or(default);
    EnvFilter::default().add_directive(level.into())
}

/// Initialize tracing. Safe to call multiple times.
///
/// Output goes to stderr: stdout is reserved for the MCP protocol.
pub fn init() {
    INIT.call_once(|| {
        let is_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();
        let filter = env_filter(if is_test {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        });

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
            .compact();

        if is_test {
            // Another test harness may already own the global subscriber.
            let _ = builder.with_test_writer().finish().try_init();
        } else if let Err(e) = builder.with_writer(std::io::stderr).try_init() {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}
