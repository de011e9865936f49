// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::Parser;
use diceswap::app::config::GlobalSettings;
use diceswap::app::logging::setup_logging;
use diceswap::domain::error::AppError;
use diceswap::infrastructure::network::aggregator::AggregatorClient;
use diceswap::infrastructure::network::provider::ConnectionFactory;
use diceswap::infrastructure::network::wallet::{LocalWallet, WalletHandle};
use diceswap::services::swap::engine::SwapEngine;
use diceswap::services::swap::session::SwapSession;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Roll a die, swap into whatever token it lands on")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,json})
    #[arg(long)]
    config: Option<String>,

    /// Start from this face instead of rolling
    #[arg(long)]
    face: Option<u8>,

    /// Fixed sell amount in whole tokens (e.g. 0.1)
    #[arg(long)]
    amount: Option<String>,

    /// skip | approve | ignore
    #[arg(long)]
    allowance_policy: Option<String>,

    /// Resolve and sign, but do not broadcast
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Emit JSON logs
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    if let Some(policy) = cli.allowance_policy {
        settings.allowance_policy = policy;
    }
    if let Some(amount) = cli.amount {
        settings.sell_amount = Some(amount);
    }
    settings.validate()?;
    setup_logging(
        if settings.debug { "debug" } else { "info" },
        cli.json_logs || settings.log_json,
    )?;

    let registry = Arc::new(settings.token_registry()?);
    let policy = settings.allowance_policy_value()?;
    let signer = settings.wallet_signer()?;
    let rpc_url = settings.rpc_url_value()?;
    let provider = ConnectionFactory::http_for_chain(&rpc_url, settings.chain_id).await?;

    let wallet = LocalWallet::new(
        signer,
        provider,
        settings.chain_id,
        settings.receipt_poll_interval(),
        settings.receipt_confirm_blocks_value(),
    );
    let wallet = WalletHandle::new(Arc::new(wallet));

    let api_key = settings.aggregator_api_key_value();
    if api_key.is_none() {
        tracing::warn!(target: "config", "No aggregator API key configured");
    }
    let aggregator = AggregatorClient::new(
        &settings.aggregator_url,
        api_key,
        &settings.aggregator_version,
        settings.aggregator_endpoints(),
        settings.request_timeout(),
    )?;

    tracing::info!(
        target: "config",
        chain_id = settings.chain_id,
        rpc = %rpc_url,
        account = ?wallet.account(),
        sell = %registry.sell_token().symbol,
        candidates = registry.len(),
        policy = ?policy,
        dry_run = cli.dry_run,
        "Starting diceswap"
    );

    let engine = SwapEngine::new(registry, Arc::new(aggregator), wallet, policy)
        .with_dry_run(cli.dry_run);
    let session = SwapSession::new(
        Arc::new(engine),
        settings.sell_amount_source(),
        settings.roll_duration(),
    );

    let report = match cli.face {
        Some(face) => session.swap_from(face).await?,
        None => session.roll_and_swap().await?,
    };

    println!("{report}");
    if !report.succeeded() {
        return Err(AppError::Transaction {
            hash: report
                .tx_hash
                .map(|h| format!("{h:#x}"))
                .unwrap_or_default(),
            reason: format!("swap ended in state {}", report.final_state.name()),
        });
    }
    Ok(())
}
