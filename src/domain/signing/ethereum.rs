//! EIP-155 传统交易签名
//!
//! 摘要 = Keccak-256(RLP([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]))
//! v = recid + 2 * chainId + 35

use k256::ecdsa::SigningKey;
use rlp::RlpStream;
use serde::Deserialize;
use sha3::{Digest, Keccak256};

use super::SignedPayload;
use crate::domain::derivation::Keypair;
use crate::error::{WalletError, WalletResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct EthPayload {
    nonce: Quantity,
    gas_price: Quantity,
    gas_limit: Quantity,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    value: Option<Quantity>,
    #[serde(default)]
    data: Option<String>,
}

/// 数量字段：JSON 数字、十进制字符串或 `0x` 十六进制字符串
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Quantity {
    Number(u64),
    Text(String),
}

impl Quantity {
    fn parse(&self, field: &str) -> WalletResult<u128> {
        match self {
            Quantity::Number(n) => Ok(u128::from(*n)),
            Quantity::Text(text) => {
                let text = text.trim();
                let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    Some("") => Ok(0),
                    Some(hex) => u128::from_str_radix(hex, 16),
                    None => text.parse::<u128>(),
                };
                parsed.map_err(|_| {
                    WalletError::validation(format!("invalid {} quantity '{}'", field, text))
                })
            }
        }
    }
}

/// 解码后的交易字段
#[derive(Debug, Clone, PartialEq, Eq)]
struct LegacyTransaction {
    nonce: u128,
    gas_price: u128,
    gas_limit: u128,
    to: Option<[u8; 20]>,
    value: u128,
    data: Vec<u8>,
}

impl LegacyTransaction {
    fn from_payload(payload: &str) -> WalletResult<Self> {
        let raw: EthPayload = serde_json::from_str(payload)
            .map_err(|e| WalletError::validation(format!("malformed Ethereum payload: {}", e)))?;

        let to = match raw.to.as_deref().map(str::trim) {
            None | Some("") | Some("0x") => None,
            Some(addr) => {
                let bytes = decode_hex(addr, "to")?;
                let bytes: [u8; 20] = bytes.try_into().map_err(|_| {
                    WalletError::validation(format!("'to' address '{}' must be 20 bytes", addr))
                })?;
                Some(bytes)
            }
        };

        let data = match raw.data.as_deref() {
            None => Vec::new(),
            Some(data) => decode_hex(data, "data")?,
        };

        Ok(Self {
            nonce: raw.nonce.parse("nonce")?,
            gas_price: raw.gas_price.parse("gasPrice")?,
            gas_limit: raw.gas_limit.parse("gasLimit")?,
            to,
            value: match &raw.value {
                Some(value) => value.parse("value")?,
                None => 0,
            },
            data,
        })
    }

    fn append_fields(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        match &self.to {
            Some(to) => {
                stream.append(&to.to_vec());
            }
            None => {
                stream.append_empty_data();
            }
        }
        stream.append(&self.value);
        stream.append(&self.data);
    }

    /// EIP-155 签名摘要
    fn signing_digest(&self, chain_id: u64) -> [u8; 32] {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        Keccak256::digest(stream.out()).into()
    }

    fn encode_signed(&self, v: u64, r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&v);
        stream.append(&trim_leading_zeros(r));
        stream.append(&trim_leading_zeros(s));
        stream.out().to_vec()
    }
}

fn decode_hex(value: &str, field: &str) -> WalletResult<Vec<u8>> {
    let stripped = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(stripped)
        .map_err(|e| WalletError::validation(format!("invalid hex in '{}': {}", field, e)))
}

/// RLP 整数为最小大端表示
fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

pub(super) fn sign(payload: &str, keypair: &Keypair, chain_id: u64) -> WalletResult<SignedPayload> {
    let tx = LegacyTransaction::from_payload(payload)?;
    let digest = tx.signing_digest(chain_id);

    let signing_key = SigningKey::from(keypair.private_key.as_secp256k1()?);
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| WalletError::crypto(format!("ECDSA signing failed: {}", e)))?;

    let rs = signature.to_bytes();
    let (r, s) = rs.split_at(32);
    let recid = recovery_id.to_byte();
    let v = u64::from(recid) + chain_id * 2 + 35;

    let mut rsv = Vec::with_capacity(65);
    rsv.extend_from_slice(&rs);
    rsv.push(recid);

    Ok(SignedPayload {
        signatures: vec![format!("0x{}", hex::encode(rsv))],
        signed_transaction: Some(format!("0x{}", hex::encode(tx.encode_signed(v, r, s)))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::derivation::{PrivateKey, PublicKey};
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
    use k256::SecretKey;

    /// EIP-155 规范示例
    fn eip155_keypair() -> Keypair {
        let secret = SecretKey::from_slice(&[0x46; 32]).unwrap();
        let public = secret.public_key();
        Keypair {
            private_key: PrivateKey::Secp256k1(secret),
            public_key: PublicKey::Secp256k1(public),
        }
    }

    const EIP155_PAYLOAD: &str = r#"{
        "nonce": 9,
        "gasPrice": "20000000000",
        "gasLimit": "0x5208",
        "to": "0x3535353535353535353535353535353535353535",
        "value": "1000000000000000000"
    }"#;

    #[test]
    fn test_eip155_signing_digest() {
        let tx = LegacyTransaction::from_payload(EIP155_PAYLOAD).unwrap();
        assert_eq!(
            hex::encode(tx.signing_digest(1)),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_signature_recovers_signer() {
        let keypair = eip155_keypair();
        let signed = sign(EIP155_PAYLOAD, &keypair, 1).unwrap();

        let rsv = hex::decode(signed.signatures[0].trim_start_matches("0x")).unwrap();
        assert_eq!(rsv.len(), 65);
        let signature = Signature::from_slice(&rsv[..64]).unwrap();
        let recovery_id = RecoveryId::from_byte(rsv[64]).unwrap();

        let digest = LegacyTransaction::from_payload(EIP155_PAYLOAD)
            .unwrap()
            .signing_digest(1);
        let recovered = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id).unwrap();

        let PublicKey::Secp256k1(expected) = keypair.public_key else {
            panic!("expected secp256k1 key");
        };
        assert_eq!(recovered, VerifyingKey::from(&expected));
    }

    #[test]
    fn test_signed_transaction_layout() {
        let keypair = eip155_keypair();
        let signed = sign(EIP155_PAYLOAD, &keypair, 1).unwrap();
        let raw = hex::decode(signed.signed_transaction.unwrap().trim_start_matches("0x")).unwrap();

        let rlp = rlp::Rlp::new(&raw);
        assert_eq!(rlp.item_count().unwrap(), 9);
        assert_eq!(rlp.val_at::<u64>(0).unwrap(), 9);
        assert_eq!(rlp.val_at::<u64>(2).unwrap(), 21000);
        let v = rlp.val_at::<u64>(6).unwrap();
        assert!(v == 37 || v == 38);
    }

    #[test]
    fn test_chain_id_changes_digest_and_v() {
        let keypair = eip155_keypair();
        let mainnet = sign(EIP155_PAYLOAD, &keypair, 1).unwrap();
        let sepolia = sign(EIP155_PAYLOAD, &keypair, 11_155_111).unwrap();
        assert_ne!(mainnet.signatures, sepolia.signatures);

        let raw = hex::decode(sepolia.signed_transaction.unwrap().trim_start_matches("0x")).unwrap();
        let v = rlp::Rlp::new(&raw).val_at::<u64>(6).unwrap();
        assert!(v == 11_155_111 * 2 + 35 || v == 11_155_111 * 2 + 36);
    }

    #[test]
    fn test_contract_creation_and_data() {
        let payload = r#"{"nonce":"0x0","gasPrice":1,"gasLimit":100000,"to":"","data":"0x6060"}"#;
        let tx = LegacyTransaction::from_payload(payload).unwrap();
        assert_eq!(tx.to, None);
        assert_eq!(tx.data, vec![0x60, 0x60]);
        assert_eq!(tx.value, 0);
    }

    #[test]
    fn test_rejects_malformed() {
        let keypair = eip155_keypair();
        for bad in [
            "{}",
            r#"{"nonce":"abc","gasPrice":1,"gasLimit":1}"#,
            r#"{"nonce":1,"gasPrice":1,"gasLimit":1,"to":"0x1234"}"#,
            r#"{"nonce":1,"gasPrice":1,"gasLimit":1,"data":"0xzz"}"#,
            r#"{"nonce":1,"gasPrice":1,"gasLimit":1,"chainId":5}"#,
        ] {
            let err = sign(bad, &keypair, 1).unwrap_err();
            assert!(matches!(err, WalletError::Validation(_)), "{}", bad);
        }
    }

    #[test]
    fn test_trim_leading_zeros() {
        assert_eq!(trim_leading_zeros(&[0, 0, 1, 2]), vec![1, 2]);
        assert!(trim_leading_zeros(&[0, 0]).is_empty());
    }
}
