//! Logging setup for hosts that do not install their own subscriber.
//!
//! The engine only emits `tracing` events. Hosts embedding it in a larger
//! application keep their subscriber; standalone tools and tests can use
//! [`TelemetryBuilder`].

use anyhow::{Context, Result};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Builder for the engine's log output.
#[derive(Debug, Clone)]
pub struct TelemetryBuilder {
    log_level: String,
    json: bool,
    span_events: bool,
}

impl Default for TelemetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryBuilder {
    /// Plain-text logs at `info`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            span_events: false,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Emit one JSON object per event.
    #[must_use]
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Log when instrumented spans (recompute, copy) close, with timings.
    #[must_use]
    pub fn with_span_events(mut self) -> Self {
        self.span_events = true;
        self
    }

    /// The filter the subscriber will use.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init(self) -> Result<()> {
        let span_events = if self.span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let fmt_layer = if self.json {
            fmt::layer().json().with_span_events(span_events).boxed()
        } else {
            fmt::layer().with_span_events(span_events).boxed()
        };

        Registry::default()
            .with(self.env_filter())
            .with(fmt_layer)
            .try_init()
            .context("Failed to init subscriber")?;

        Ok(())
    }
}
