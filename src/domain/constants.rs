// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_MONAD_TESTNET: u64 = 10143;
pub const MONAD_TESTNET_RPC: &str = "https://testnet-rpc.monad.xyz";

// Monad testnet assets
pub const WMON_MONAD_TESTNET: Address = address!("760AfE86e5de5fa0Ee542fc7B7B713e1c5425701");
pub const USDT_MONAD_TESTNET: Address = address!("fBC2D240A5eD44231AcA3A9e9066bc4b33f01149");
pub const USDC_MONAD_TESTNET: Address = address!("f817257fed379853cde0fa4f97ab987181b1e5ea");
pub const DAK_MONAD_TESTNET: Address = address!("0f0bdebf0f83cd1ee3974779bcb7315f9808c714");
pub const CHOG_MONAD_TESTNET: Address = address!("e0590015a873bf326bd645c3e1266d4db41c4e6b");
pub const YAKI_MONAD_TESTNET: Address = address!("fe140e1dce99be9f4f15d657cd9b7bf622270c50");
pub const KB_MONAD_TESTNET: Address = address!("34d1ae6076aee4072f54e1156d2e507dd564a355");

// =============================================================================
// AGGREGATOR CONSTANTS
// =============================================================================

pub const DEFAULT_AGGREGATOR_URL: &str = "https://api.0x.org";
pub const DEFAULT_AGGREGATOR_VERSION: &str = "v2";
pub const AGGREGATOR_API_KEY_HEADER: &str = "0x-api-key";
pub const AGGREGATOR_VERSION_HEADER: &str = "0x-version";
pub const AGGREGATOR_API_KEY_ENV: &str = "ZEROX_API_KEY";

pub const PERMIT2_QUOTE_PATH: &str = "/swap/permit2/quote";
pub const ALLOWANCE_HOLDER_PRICE_PATH: &str = "/swap/allowance-holder/price";
pub const ALLOWANCE_HOLDER_QUOTE_PATH: &str = "/swap/allowance-holder/quote";
pub const CLASSIC_QUOTE_PATH: &str = "/swap/quote";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// SWAP CONSTANTS
// =============================================================================

/// Width of the signature length prefix appended to permit calldata.
pub const SIGNATURE_LENGTH_WORD: usize = 32;

pub const DEFAULT_SELL_AMOUNT_MIN: f64 = 0.01;
pub const DEFAULT_SELL_AMOUNT_MAX: f64 = 0.5;
pub const SELL_AMOUNT_DISPLAY_DECIMALS: usize = 4;

pub const DEFAULT_ROLL_DURATION_MS: u64 = 800;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 500;
pub const DEFAULT_RECEIPT_CONFIRM_BLOCKS: u64 = 1;

/// Gas headroom applied to node estimates when the quote carries no gas limit.
pub const GAS_ESTIMATE_HEADROOM_BPS: u64 = 12_000;

pub const LIFECYCLE_EVENT_BUFFER: usize = 64;
