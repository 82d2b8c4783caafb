// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Subscriber installation for the `switchyard` binary.

use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// HTTP stack crates that are noisy at debug level.
const QUIET_DEPENDENCIES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Line layout for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event, no span context
    Compact,
    /// Span context, source file and line
    Full,
}

/// How the subscriber filters and renders events.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Level for `switchyard` itself when `RUST_LOG` is unset
    pub level: Level,
    pub format: LogFormat,
    /// Log span enter/close (orchestrator request spans)
    pub span_events: bool,
    pub ansi: bool,
    /// Explicit filter directive; bypasses `RUST_LOG`
    pub directive: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            span_events: false,
            ansi: true,
            directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Pick a config from the CLI's `--verbose` / `--debug` flags.
    ///
    /// `--debug` shows per-call provider detail with spans; `--verbose` adds
    /// lifecycle events (orchestrator built, fallbacks, health summaries).
    pub fn for_cli(verbose: bool, debug: bool) -> Self {
        if debug {
            Self {
                level: Level::DEBUG,
                format: LogFormat::Full,
                span_events: true,
                ..Self::default()
            }
        } else if verbose {
            Self::default().with_level(Level::INFO)
        } else {
            Self::default()
        }
    }

    /// Trace everything in this crate, uncolored.
    pub fn testing() -> Self {
        Self {
            level: Level::TRACE,
            format: LogFormat::Full,
            span_events: true,
            ansi: false,
            directive: Some("switchyard=trace".to_string()),
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = Some(directive.into());
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Filter used when neither `RUST_LOG` nor a directive applies.
    ///
    /// Dependencies stay at `warn` unless the crate level is quieter.
    pub fn default_directive(&self) -> String {
        let dependency_level = if self.level < Level::WARN {
            self.level
        } else {
            Level::WARN
        };
        let mut parts = vec![format!("switchyard={}", self.level), self.level.to_string()];
        parts.extend(
            QUIET_DEPENDENCIES
                .iter()
                .map(|krate| format!("{}={}", krate, dependency_level)),
        );
        parts.join(",")
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.default_directive());
        match &self.directive {
            Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Install the global subscriber.
///
/// Events go to stderr so `--format json` output on stdout stays parseable.
/// Fails if a subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<()> {
    let span_events = if config.span_events {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let full = config.format == LogFormat::Full;

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi)
        .with_target(full)
        .with_file(full)
        .with_line_number(full)
        .with_span_events(span_events);

    let registry = tracing_subscriber::registry().with(config.env_filter());
    let installed = match config.format {
        LogFormat::Compact => registry.with(fmt_layer.compact()).try_init(),
        LogFormat::Full => registry.with(fmt_layer).try_init(),
    };
    installed.map_err(|e| io::Error::other(e.to_string()))
}
