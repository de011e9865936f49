// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::{
    ALLOWANCE_HOLDER_PRICE_PATH, ALLOWANCE_HOLDER_QUOTE_PATH, AGGREGATOR_API_KEY_HEADER,
    AGGREGATOR_VERSION_HEADER, CLASSIC_QUOTE_PATH, PERMIT2_QUOTE_PATH,
};
use crate::common::error::AppError;
use crate::common::parsing::{parse_address_hex, parse_hex_bytes, quantity_from_json, u64_from_json};
use crate::domain::swap::{
    Acquired, AllowanceIssue, Mechanism, NoQuote, Quote, QuoteTerms, TradeRequest,
    TransactionSkeleton,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// One round trip to the aggregator for a single mechanism.
///
/// Implementations never fail: transport problems and malformed bodies come
/// back as `Acquired::NoQuote` so the caller can try the next mechanism.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn acquire(&self, mechanism: Mechanism, request: &TradeRequest) -> Acquired;
}

#[derive(Debug, Clone)]
pub struct AggregatorEndpoints {
    pub permit2_quote: String,
    pub allowance_holder_price: String,
    pub allowance_holder_quote: String,
    pub classic_quote: String,
}

impl Default for AggregatorEndpoints {
    fn default() -> Self {
        Self {
            permit2_quote: PERMIT2_QUOTE_PATH.to_string(),
            allowance_holder_price: ALLOWANCE_HOLDER_PRICE_PATH.to_string(),
            allowance_holder_quote: ALLOWANCE_HOLDER_QUOTE_PATH.to_string(),
            classic_quote: CLASSIC_QUOTE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    transaction: Option<RawTransaction>,
    permit2: Option<RawPermit2>,
    issues: Option<RawIssues>,
    buy_amount: Option<Value>,
    liquidity_available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTransaction {
    to: Option<String>,
    data: Option<String>,
    value: Option<Value>,
    gas: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawPermit2 {
    eip712: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawIssues {
    allowance: Option<RawAllowance>,
}

#[derive(Debug, Deserialize)]
struct RawAllowance {
    spender: Option<String>,
    actual: Option<Value>,
}

/// Legacy quote shape: transaction fields sit at the top level.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassic {
    to: Option<String>,
    data: Option<String>,
    value: Option<Value>,
    gas: Option<Value>,
    buy_amount: Option<Value>,
    liquidity_available: Option<bool>,
}

pub struct AggregatorClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_version: String,
    endpoints: AggregatorEndpoints,
}

impl AggregatorClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        api_version: &str,
        endpoints: AggregatorEndpoints,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_version: api_version.to_string(),
            endpoints,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, NoQuote> {
        let url = self.url(path);
        let mut req = self
            .client
            .get(&url)
            .query(params)
            .header(AGGREGATOR_VERSION_HEADER, &self.api_version);
        if let Some(key) = &self.api_key {
            req = req.header(AGGREGATOR_API_KEY_HEADER, key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| NoQuote::TransportFault(format!("GET {path} failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| NoQuote::TransportFault(format!("GET {path} body read failed: {e}")))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| failure_reason(&v))
                .unwrap_or_else(|| "no reason given".to_string());
            return Err(NoQuote::Unavailable(format!("HTTP {status}: {reason}")));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| NoQuote::TransportFault(format!("GET {path} returned non-JSON: {e}")))?;
        serde_json::from_value(value.clone()).map_err(|e| {
            let reason = failure_reason(&value).unwrap_or_else(|| e.to_string());
            NoQuote::TransportFault(format!("GET {path} decode failed: {reason}"))
        })
    }

    async fn permit2_quote(&self, request: &TradeRequest) -> Result<Quote, NoQuote> {
        let params = query_params(Mechanism::SignedPermit, request);
        let raw: RawEnvelope = self.get_json(&self.endpoints.permit2_quote, &params).await?;
        normalize_permit2(raw)
    }

    async fn allowance_holder_quote(&self, request: &TradeRequest) -> Result<Quote, NoQuote> {
        let params = query_params(Mechanism::AutoAllowance, request);

        // The price probe only contributes allowance information.
        let price_issue = match self
            .get_json::<RawEnvelope>(&self.endpoints.allowance_holder_price, &params)
            .await
        {
            Ok(price) => allowance_issue(price.issues.as_ref()),
            Err(e) => {
                tracing::warn!(
                    target: "aggregator",
                    buy = %request.buy_token.symbol,
                    error = %e,
                    "Allowance-holder price probe failed; continuing to quote"
                );
                None
            }
        };

        let raw: RawEnvelope = self
            .get_json(&self.endpoints.allowance_holder_quote, &params)
            .await?;
        normalize_allowance_holder(raw, price_issue)
    }

    async fn classic_quote(&self, request: &TradeRequest) -> Result<Quote, NoQuote> {
        let params = query_params(Mechanism::Classic, request);
        let raw: RawClassic = self.get_json(&self.endpoints.classic_quote, &params).await?;
        normalize_classic(raw)
    }
}

#[async_trait]
impl QuoteSource for AggregatorClient {
    async fn acquire(&self, mechanism: Mechanism, request: &TradeRequest) -> Acquired {
        if let Err(e) = request.validate() {
            return Acquired::NoQuote(NoQuote::Unavailable(e.to_string()));
        }

        let result = match mechanism {
            Mechanism::SignedPermit => self.permit2_quote(request).await,
            Mechanism::AutoAllowance => self.allowance_holder_quote(request).await,
            Mechanism::Classic => self.classic_quote(request).await,
        };

        match result {
            Ok(quote) => {
                tracing::debug!(
                    target: "aggregator",
                    mechanism = %mechanism,
                    buy = %request.buy_token.symbol,
                    to = %format!("{:#x}", quote.transaction.to),
                    calldata_len = quote.transaction.data.len(),
                    "Quote acquired"
                );
                Acquired::Quote(quote)
            }
            Err(no_quote) => {
                tracing::debug!(
                    target: "aggregator",
                    mechanism = %mechanism,
                    buy = %request.buy_token.symbol,
                    reason = %no_quote,
                    "No quote"
                );
                Acquired::NoQuote(no_quote)
            }
        }
    }
}

/// Query parameters for `mechanism`; the classic endpoint keeps the legacy `takerAddress` name.
pub(crate) fn query_params(
    mechanism: Mechanism,
    request: &TradeRequest,
) -> Vec<(&'static str, String)> {
    let taker_field = match mechanism {
        Mechanism::Classic => "takerAddress",
        Mechanism::SignedPermit | Mechanism::AutoAllowance => "taker",
    };
    vec![
        ("chainId", request.chain_id.to_string()),
        ("sellToken", format!("{:#x}", request.sell_token.address)),
        ("buyToken", format!("{:#x}", request.buy_token.address)),
        ("sellAmount", request.sell_amount_base_units.to_string()),
        (taker_field, format!("{:#x}", request.taker)),
    ]
}

/// Pull a human-readable reason out of an aggregator error or empty-route body.
fn failure_reason(body: &Value) -> Option<String> {
    if let Some(reason) = body
        .get("validationErrors")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("reason"))
        .and_then(Value::as_str)
    {
        return Some(reason.to_string());
    }
    ["reason", "message", "name"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
        .or_else(|| body.get("code").map(|c| format!("code {c}")))
}

fn skeleton(
    to: Option<&str>,
    data: Option<&str>,
    value: Option<&Value>,
    gas: Option<&Value>,
) -> Result<TransactionSkeleton, NoQuote> {
    let to = to
        .and_then(parse_address_hex)
        .ok_or_else(|| NoQuote::Unavailable("response has no transaction target".into()))?;
    let data = data
        .and_then(parse_hex_bytes)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| NoQuote::Unavailable("response has no transaction calldata".into()))?;
    Ok(TransactionSkeleton {
        to,
        data,
        value: value.and_then(quantity_from_json),
        gas: gas.and_then(u64_from_json),
    })
}

fn envelope_skeleton(raw: &RawEnvelope) -> Result<TransactionSkeleton, NoQuote> {
    if raw.liquidity_available == Some(false) {
        return Err(NoQuote::Unavailable("no liquidity available".into()));
    }
    let tx = raw
        .transaction
        .as_ref()
        .ok_or_else(|| NoQuote::Unavailable("response has no transaction".into()))?;
    skeleton(
        tx.to.as_deref(),
        tx.data.as_deref(),
        tx.value.as_ref(),
        tx.gas.as_ref(),
    )
}

fn allowance_issue(issues: Option<&RawIssues>) -> Option<AllowanceIssue> {
    let raw = issues?.allowance.as_ref()?;
    let spender = raw.spender.as_deref().and_then(parse_address_hex)?;
    Some(AllowanceIssue {
        spender,
        actual: raw.actual.as_ref().and_then(quantity_from_json),
    })
}

fn normalize_permit2(raw: RawEnvelope) -> Result<Quote, NoQuote> {
    let transaction = envelope_skeleton(&raw)?;
    let typed_data = raw
        .permit2
        .and_then(|p| p.eip712)
        .filter(|v| v.is_object());
    Ok(Quote {
        transaction,
        terms: QuoteTerms::SignedPermit {
            typed_data,
            signature: None,
        },
        buy_amount: raw.buy_amount.as_ref().and_then(quantity_from_json),
    })
}

fn normalize_allowance_holder(
    raw: RawEnvelope,
    price_issue: Option<AllowanceIssue>,
) -> Result<Quote, NoQuote> {
    let transaction = envelope_skeleton(&raw)?;
    let allowance_issue = allowance_issue(raw.issues.as_ref()).or(price_issue);
    Ok(Quote {
        transaction,
        terms: QuoteTerms::AutoAllowance { allowance_issue },
        buy_amount: raw.buy_amount.as_ref().and_then(quantity_from_json),
    })
}

fn normalize_classic(raw: RawClassic) -> Result<Quote, NoQuote> {
    if raw.liquidity_available == Some(false) {
        return Err(NoQuote::Unavailable("no liquidity available".into()));
    }
    let transaction = skeleton(
        raw.to.as_deref(),
        raw.data.as_deref(),
        raw.value.as_ref(),
        raw.gas.as_ref(),
    )?;
    Ok(Quote {
        transaction,
        terms: QuoteTerms::Classic,
        buy_amount: raw.buy_amount.as_ref().and_then(quantity_from_json),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::swap::TokenDescriptor;
    use alloy::primitives::{Address, Bytes, U256};
    use serde_json::json;

    fn envelope(v: Value) -> RawEnvelope {
        serde_json::from_value(v).expect("envelope")
    }

    fn request() -> TradeRequest {
        TradeRequest {
            sell_token: TokenDescriptor::new(Address::with_last_byte(1), "WMON", 18, ""),
            buy_token: TokenDescriptor::new(Address::with_last_byte(2), "USDC", 6, ""),
            sell_amount_base_units: U256::from(1_000u64),
            taker: Address::with_last_byte(9),
            chain_id: 10143,
        }
    }

    #[test]
    fn permit2_quote_carries_typed_data() {
        let raw = envelope(json!({
            "liquidityAvailable": true,
            "buyAmount": "2500000",
            "transaction": {
                "to": "0x0000000000000000000000000000000000000abc",
                "data": "0xdeadbeef",
                "value": "0",
                "gas": "210000"
            },
            "permit2": {
                "eip712": {"primaryType": "PermitTransferFrom", "types": {}, "domain": {}, "message": {}}
            }
        }));
        let quote = normalize_permit2(raw).unwrap();
        assert_eq!(quote.mechanism(), Mechanism::SignedPermit);
        assert_eq!(quote.transaction.data, Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(quote.transaction.gas, Some(210_000));
        assert_eq!(quote.transaction.value, Some(U256::ZERO));
        assert_eq!(quote.buy_amount, Some(U256::from(2_500_000u64)));
        assert!(quote.requires_signature());
    }

    #[test]
    fn permit2_quote_without_eip712_needs_no_signature() {
        let raw = envelope(json!({
            "transaction": {"to": "0x0000000000000000000000000000000000000abc", "data": "0x01"},
            "permit2": null
        }));
        let quote = normalize_permit2(raw).unwrap();
        assert!(!quote.requires_signature());
        assert_eq!(quote.transaction.gas, None);
    }

    #[test]
    fn missing_target_or_calldata_is_no_quote() {
        let no_data = envelope(json!({"transaction": {"to": "0x0000000000000000000000000000000000000abc"}}));
        assert!(matches!(normalize_permit2(no_data), Err(NoQuote::Unavailable(_))));

        let empty_data = envelope(json!({"transaction": {"to": "0x0000000000000000000000000000000000000abc", "data": "0x"}}));
        assert!(normalize_permit2(empty_data).is_err());

        let no_tx = envelope(json!({"liquidityAvailable": false}));
        assert_eq!(
            normalize_allowance_holder(no_tx, None),
            Err(NoQuote::Unavailable("no liquidity available".into()))
        );
    }

    #[test]
    fn allowance_issue_prefers_quote_over_price_probe() {
        let probe = AllowanceIssue {
            spender: Address::with_last_byte(7),
            actual: None,
        };
        let raw = envelope(json!({
            "transaction": {"to": "0x0000000000000000000000000000000000000abc", "data": "0x01"},
            "issues": {"allowance": {"spender": "0x0000000000000000000000000000000000000008", "actual": "0"}}
        }));
        let quote = normalize_allowance_holder(raw, Some(probe.clone())).unwrap();
        let issue = quote.allowance_issue().unwrap();
        assert_eq!(issue.spender, Address::with_last_byte(8));
        assert_eq!(issue.actual, Some(U256::ZERO));

        let raw = envelope(json!({
            "transaction": {"to": "0x0000000000000000000000000000000000000abc", "data": "0x01"},
            "issues": {"allowance": null}
        }));
        let quote = normalize_allowance_holder(raw, Some(probe.clone())).unwrap();
        assert_eq!(quote.allowance_issue(), Some(&probe));
    }

    #[test]
    fn classic_quote_is_flat() {
        let raw: RawClassic = serde_json::from_value(json!({
            "to": "0x0000000000000000000000000000000000000def",
            "data": "0xabcdef",
            "value": "100",
            "gas": 150000
        }))
        .unwrap();
        let quote = normalize_classic(raw).unwrap();
        assert_eq!(quote.mechanism(), Mechanism::Classic);
        assert_eq!(quote.transaction.value, Some(U256::from(100)));
        assert_eq!(quote.transaction.gas, Some(150_000));

        let nested: RawClassic = serde_json::from_value(json!({
            "transaction": {"to": "0x0000000000000000000000000000000000000def", "data": "0xab"}
        }))
        .unwrap();
        assert!(normalize_classic(nested).is_err());
    }

    #[test]
    fn failure_reason_reads_validation_errors_first() {
        let body = json!({
            "code": 100,
            "reason": "Validation Failed",
            "validationErrors": [{"field": "buyToken", "code": 1001, "reason": "TOKEN_NOT_SUPPORTED"}]
        });
        assert_eq!(failure_reason(&body).as_deref(), Some("TOKEN_NOT_SUPPORTED"));
        assert_eq!(failure_reason(&json!({"name": "INPUT_INVALID"})).as_deref(), Some("INPUT_INVALID"));
        assert_eq!(failure_reason(&json!({"code": 7})).as_deref(), Some("code 7"));
        assert_eq!(failure_reason(&json!({})), None);
    }

    #[test]
    fn query_params_switch_taker_field_for_classic() {
        let req = request();
        let permit = query_params(Mechanism::SignedPermit, &req);
        assert!(permit.iter().any(|(k, _)| *k == "taker"));
        assert!(permit.contains(&("sellAmount", "1000".to_string())));
        assert!(permit.contains(&("chainId", "10143".to_string())));

        let classic = query_params(Mechanism::Classic, &req);
        assert!(classic.iter().any(|(k, v)| *k == "takerAddress"
            && v == "0x0000000000000000000000000000000000000009"));
        assert!(!classic.iter().any(|(k, _)| *k == "taker"));
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_network() {
        // Unroutable base URL: a request would fail with a transport fault, not Unavailable.
        let client = AggregatorClient::new(
            "http://127.0.0.1:9",
            None,
            "v2",
            AggregatorEndpoints::default(),
            Duration::from_millis(200),
        )
        .unwrap();
        let mut req = request();
        req.buy_token = req.sell_token.clone();
        let acquired = client.acquire(Mechanism::Classic, &req).await;
        assert!(matches!(acquired, Acquired::NoQuote(NoQuote::Unavailable(_))));
    }
}
