//! # skein-log
//!
//! Structured logging setup for the Skein workflow engine, following the
//! same builder + config-preset shape used throughout the rest of the
//! workspace: a [`Config`] with `development()`/`production()` presets (each
//! overridable from environment variables) and an [`init`] entry point that
//! installs a `tracing_subscriber` pipeline.

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable, colorized, multi-line — for local development.
    Pretty,
    /// Single-line JSON objects — for production log aggregation.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive string (e.g. `"info"`,
    /// `"skein_workflow=debug,info"`).
    pub level: String,
    /// Output format.
    pub format: Format,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Pretty,
        }
    }
}

impl Config {
    /// Development preset: debug level, pretty/ANSI output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
        }
    }

    /// Production preset: info level, JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
        }
    }

    /// Overlay `SKEIN_LOG`/`RUST_LOG` and `SKEIN_LOG_FORMAT` environment
    /// variables onto this config, in that order of precedence.
    #[must_use]
    pub fn with_env_overlay(mut self) -> Self {
        if let Ok(level) = std::env::var("SKEIN_LOG").or_else(|_| std::env::var("RUST_LOG")) {
            self.level = level;
        }
        if let Ok(format) = std::env::var("SKEIN_LOG_FORMAT") {
            self.format = match format.to_lowercase().as_str() {
                "json" => Format::Json,
                _ => Format::Pretty,
            };
        }
        self
    }
}

/// RAII guard returned by [`init`]. Currently a marker — kept so future
/// non-blocking file writers can attach a `WorkerGuard` without changing
/// the `init` signature.
#[derive(Debug)]
pub struct LoggerGuard {
    _private: (),
}

/// Install a global `tracing` subscriber built from `config`.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed (calling this
/// twice in one process is a programmer error, consistent with
/// `tracing_subscriber`'s own `try_init` contract).
pub fn init(config: &Config) -> LoggerGuard {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.format {
        Format::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer().with_ansi(true).pretty();
            Registry::default().with(filter).with(fmt_layer).init();
        }
        Format::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer().json().with_ansi(false);
            Registry::default().with(filter).with(fmt_layer).init();
        }
    }

    LoggerGuard { _private: () }
}
