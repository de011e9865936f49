// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::SELL_AMOUNT_DISPLAY_DECIMALS;
use crate::domain::error::SwapError;
use crate::domain::swap::OutcomeKey;
use rand::Rng;

/// Uniform pick from the outcome domain.
pub fn roll_die<R: Rng + ?Sized>(
    rng: &mut R,
    domain: &[OutcomeKey],
) -> Result<OutcomeKey, SwapError> {
    if domain.is_empty() {
        return Err(SwapError::InvalidRequest("outcome domain is empty".into()));
    }
    Ok(domain[rng.gen_range(0..domain.len())])
}

#[derive(Debug, Clone, PartialEq)]
pub enum SellAmount {
    Fixed(String),
    Random { min: f64, max: f64 },
}

impl SellAmount {
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        match self {
            SellAmount::Fixed(amount) => amount.clone(),
            SellAmount::Random { min, max } => random_sell_amount(rng, *min, *max),
        }
    }
}

/// Decimal string in `[min, max]` with four fractional digits.
pub fn random_sell_amount<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> String {
    let scale = 10u64.pow(SELL_AMOUNT_DISPLAY_DECIMALS as u32);
    let lo = ((min * scale as f64).round() as u64).max(1);
    let hi = ((max * scale as f64).round() as u64).max(lo);
    let ticks = rng.gen_range(lo..=hi);
    format!(
        "{}.{:0width$}",
        ticks / scale,
        ticks % scale,
        width = SELL_AMOUNT_DISPLAY_DECIMALS
    )
}
