// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::SIGNATURE_LENGTH_WORD;
use crate::domain::swap::{Quote, QuoteTerms};
use crate::network::wallet::WalletHandle;
use alloy::primitives::{Bytes, U256};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AugmentError {
    #[error("Signature declined: {0}")]
    SignatureDeclined(String),
}

/// `calldata ‖ uint256(len(sig)) ‖ sig`, the layout the permit settler reads.
pub fn augment_calldata(calldata: &[u8], signature: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(calldata.len() + SIGNATURE_LENGTH_WORD + signature.len());
    out.extend_from_slice(calldata);
    out.extend_from_slice(&U256::from(signature.len()).to_be_bytes::<32>());
    out.extend_from_slice(signature);
    Bytes::from(out)
}

/// Sign the quote's permit and append the signature to its calldata.
///
/// Quotes with nothing to sign come back untouched.
pub async fn augment(quote: Quote, wallet: &WalletHandle) -> Result<Quote, AugmentError> {
    let Some(typed_data) = quote.typed_data_to_sign().cloned() else {
        return Ok(quote);
    };

    let signature = wallet
        .sign_typed_data(&typed_data)
        .await
        .map_err(|e| AugmentError::SignatureDeclined(e.to_string()))?;
    if signature.is_empty() {
        return Err(AugmentError::SignatureDeclined(
            "wallet returned an empty signature".into(),
        ));
    }

    let mut quote = quote;
    quote.transaction.data = augment_calldata(&quote.transaction.data, &signature);
    tracing::debug!(
        target: "augment",
        sig_len = signature.len(),
        calldata_len = quote.transaction.data.len(),
        "Permit signature appended"
    );
    quote.terms = QuoteTerms::SignedPermit {
        typed_data: Some(typed_data),
        signature: Some(signature),
    };
    Ok(quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_calldata_length_word_signature() {
        let calldata = vec![0xaa; 100];
        let sig = vec![0x11; 65];
        let out = augment_calldata(&calldata, &sig);

        assert_eq!(out.len(), 100 + 32 + 65);
        assert_eq!(&out[..100], calldata.as_slice());
        let word = &out[100..132];
        assert!(word[..31].iter().all(|b| *b == 0));
        assert_eq!(word[31], 0x41);
        assert_eq!(&out[132..], sig.as_slice());
    }

    #[test]
    fn length_word_is_big_endian_for_long_signatures() {
        let out = augment_calldata(&[], &vec![0u8; 0x0102]);
        assert_eq!(out[30], 0x01);
        assert_eq!(out[31], 0x02);
        assert_eq!(out.len(), 32 + 0x0102);
    }
}
