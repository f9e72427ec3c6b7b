//! 交易签名
//!
//! 按 [`SigningRule`] 分派：
//! - `LegacyUtxo`: BTC / LTC / DOGE 传统 P2PKH 交易
//! - `Eip155`: Ethereum 传统交易
//! - `Ed25519Message`: Solana message
//!
//! payload 编码错误返回 `Validation`，签名库失败返回 `Crypto`。

mod ethereum;
mod solana;
mod utxo;

use serde::Serialize;

use crate::domain::chain_config::{CoinParams, SigningRule};
use crate::domain::derivation::Keypair;
use crate::error::WalletResult;

/// 签名结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayload {
    /// 每个签名的编码（UTXO 为每个输入一个）
    pub signatures: Vec<String>,
    /// 附带签名后的完整交易（币种格式需要时）
    pub signed_transaction: Option<String>,
}

impl SignedPayload {
    /// 对外返回的主值：有完整交易时返回交易，否则返回第一个签名
    pub fn primary(&self) -> Option<&str> {
        self.signed_transaction
            .as_deref()
            .or_else(|| self.signatures.first().map(String::as_str))
    }
}

pub struct TransactionSigner;

impl TransactionSigner {
    pub fn sign(payload: &str, keypair: &Keypair, params: &CoinParams) -> WalletResult<SignedPayload> {
        match params.signing_rule {
            SigningRule::LegacyUtxo(versions) => utxo::sign(payload, keypair, versions),
            SigningRule::Eip155 { chain_id } => ethereum::sign(payload, keypair, chain_id),
            SigningRule::Ed25519Message => solana::sign(payload, keypair),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_prefers_transaction() {
        let payload = SignedPayload {
            signatures: vec!["aa".into(), "bb".into()],
            signed_transaction: Some("cc".into()),
        };
        assert_eq!(payload.primary(), Some("cc"));

        let bare = SignedPayload {
            signatures: vec!["aa".into()],
            signed_transaction: None,
        };
        assert_eq!(bare.primary(), Some("aa"));
    }
}
