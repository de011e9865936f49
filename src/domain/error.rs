// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

/// Failures that end a swap attempt and reach the caller.
///
/// Per-attempt problems (no quote, transport faults, declined signatures) never
/// show up here; the resolver absorbs them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Outcome key {0} is outside the configured domain")]
    UnknownKey(u8),

    #[error("Invalid trade request: {0}")]
    InvalidRequest(String),

    #[error("No tradable pair found after {attempts} attempts")]
    Exhausted { attempts: usize },

    #[error("Transaction submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Wallet is not connected")]
    WalletDisconnected,

    #[error("Swap superseded by a newer trigger")]
    Superseded,

    #[error("Invalid lifecycle transition {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Transaction failed: {hash:?}, reason: {reason}")]
    Transaction { hash: String, reason: String },

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Address {0} is invalid or not checksummed")]
    InvalidAddress(String),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
