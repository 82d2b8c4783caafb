// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tracing infrastructure.
//!
//! Library code only emits `tracing` events; the binary installs a subscriber
//! once at startup:
//!
//! ```rust,ignore
//! use switchyard::telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::for_cli(verbose, debug))?;
//! ```
//!
//! Conventions used across the crate:
//!
//! 1. Per-call provider detail is `debug!`, gated on the `telemetry` feature
//! 2. Fallbacks and failed requests are `warn!`
//! 3. Lifecycle events (orchestrator built, health checks done) are `info!`
//! 4. API keys are never recorded

mod init;

pub use init::{init_telemetry, LogFormat, TelemetryConfig};
