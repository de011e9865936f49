// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, Bytes, U256};
use serde_json::Value;
use std::str::FromStr;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> Option<Bytes> {
    hex::decode(strip_0x(s.trim())).ok().map(Bytes::from)
}

pub fn parse_address_hex(s: &str) -> Option<Address> {
    Address::from_str(strip_0x(s.trim())).ok()
}

/// Parse an on-the-wire quantity: `0x`-prefixed hex or plain decimal.
pub fn parse_u256_quantity(s: &str) -> Option<U256> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.starts_with("0x") || s.starts_with("0X") {
        U256::from_str_radix(strip_0x(s), 16).ok()
    } else {
        U256::from_str_radix(s, 10).ok()
    }
}

/// Quantities arrive as strings from most providers, numbers from a few.
pub fn quantity_from_json(value: &Value) -> Option<U256> {
    match value {
        Value::String(s) => parse_u256_quantity(s),
        Value::Number(n) => n.as_u64().map(U256::from),
        _ => None,
    }
}

pub fn u64_from_json(value: &Value) -> Option<u64> {
    quantity_from_json(value).and_then(|v| u64::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_parsers_accept_lower_and_upper_prefixes() {
        assert_eq!(parse_u256_quantity("0x2a"), Some(U256::from(42)));
        assert_eq!(parse_u256_quantity("0X2a"), Some(U256::from(42)));
        assert_eq!(parse_u256_quantity("100"), Some(U256::from(100)));
        assert_eq!(
            parse_hex_bytes("0Xabcd"),
            Some(Bytes::from(vec![0xab, 0xcd]))
        );
        assert_eq!(parse_u256_quantity(""), None);
    }

    #[test]
    fn json_quantities_accept_strings_and_numbers() {
        assert_eq!(quantity_from_json(&json!("1000")), Some(U256::from(1000)));
        assert_eq!(quantity_from_json(&json!(250000)), Some(U256::from(250000)));
        assert_eq!(u64_from_json(&json!("0x3d090")), Some(250_000));
        assert_eq!(quantity_from_json(&Value::Null), None);
        assert_eq!(quantity_from_json(&json!("not a number")), None);
    }

    #[test]
    fn address_parser_rejects_short_input() {
        assert!(parse_address_hex("0x1234").is_none());
        assert_eq!(
            parse_address_hex("0x0000000000000000000000000000000000000001"),
            Some(Address::with_last_byte(1))
        );
    }
}
