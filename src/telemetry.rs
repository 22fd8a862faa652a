//! Tracing subscriber setup.
//!
//! Settings come from the environment, read once at startup after `.env`:
//! - `RUST_LOG`: full filter directive, takes precedence when set
//! - `SENSORFLOW_LOG_LEVEL`: level for this crate (default `debug`); other
//!   crates stay at `info` and `sqlx::query` at `warn`
//! - `SENSORFLOW_SPAN_EVENTS`: `full`, `enter_exit`, else CLOSE only
//! - `FORCE_COLOR`: `1|true|yes` on, `0|false|no` off, else TTY detection

use std::env;

use anyhow::{anyhow, Result};
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

// ---

pub const LOG_LEVEL_VAR: &str = "SENSORFLOW_LOG_LEVEL";
pub const SPAN_EVENTS_VAR: &str = "SENSORFLOW_SPAN_EVENTS";

const DEFAULT_LEVEL: &str = "debug";

/// Install the global subscriber. Fails if one is already installed.
pub fn init() -> Result<()> {
    // ---
    let span_events = span_events(env::var(SPAN_EVENTS_VAR).ok().as_deref());
    let use_color = use_color(
        env::var("FORCE_COLOR").ok().as_deref(),
        std::io::stdout().is_terminal(),
    );

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(filter_directive(env::var(LOG_LEVEL_VAR).ok().as_deref()))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

pub fn span_events(mode: Option<&str>) -> FmtSpan {
    match mode.map(str::trim) {
        Some("full") => FmtSpan::FULL,
        Some("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    }
}

/// `FORCE_COLOR` wins over the terminal check when it holds a recognised value.
pub fn use_color(force: Option<&str>, is_tty: bool) -> bool {
    match force.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes") => true,
        Some("0" | "false" | "no") => false,
        _ => is_tty,
    }
}

/// Filter used when `RUST_LOG` is absent. Unknown levels fall back to the default.
pub fn filter_directive(level: Option<&str>) -> String {
    // ---
    let level = level
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| matches!(l.as_str(), "trace" | "debug" | "info" | "warn" | "error"))
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

    format!("info,{}={level},sqlx::query=warn", env!("CARGO_CRATE_NAME"))
}
