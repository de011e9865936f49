// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_MODULES: &[&str] = &[
    "h2=info",
    "hyper=info",
    "hyper_util=info",
    "reqwest=info",
    "rustls=info",
    "alloy_transport_http=info",
    "alloy_rpc_client=info",
];

/// A bare level ("debug") gets the quiet-module defaults appended; a directive
/// string (with ',' or '=') is taken as-is.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.contains(',') || normalized.contains('=') {
        return normalized.to_string();
    }
    let base = if normalized.is_empty() { "info" } else { normalized };
    let mut spec = String::from(base);
    for module in QUIET_MODULES {
        spec.push(',');
        spec.push_str(module);
    }
    spec
}

pub fn setup_logging(log_level: &str, json_format: bool) -> Result<(), AppError> {
    let spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).try_init()
    };
    installed.map_err(|e| AppError::Initialization(format!("Logger setup failed: {e}")))?;

    tracing::debug!(
        filter = %spec,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
    Ok(())
}
