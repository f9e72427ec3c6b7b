//! 地址编码
//!
//! 按 [`AddressRule`] 渲染公钥，调用方不需要知道具体币种。

use bitcoin::hashes::{hash160, Hash};
use sha3::{Digest, Keccak256};

use crate::domain::chain_config::{AddressRule, Base58Versions, CoinParams};
use crate::domain::derivation::PublicKey;
use crate::error::{WalletError, WalletResult};

pub struct AddressEncoder;

impl AddressEncoder {
    pub fn encode(public_key: &PublicKey, params: &CoinParams) -> WalletResult<String> {
        match params.address_rule {
            AddressRule::Base58Check(versions) => {
                Ok(base58check_p2pkh(&public_key.to_bytes(), versions))
            }
            AddressRule::Eip55 => {
                let uncompressed = public_key.to_uncompressed()?;
                Ok(eip55_address(&uncompressed))
            }
            AddressRule::Base58PublicKey => match public_key {
                PublicKey::Ed25519(pk) => Ok(bs58::encode(pk.as_bytes()).into_string()),
                PublicKey::Secp256k1(_) => Err(WalletError::crypto(format!(
                    "{} addresses require an ed25519 key",
                    params.symbol
                ))),
            },
        }
    }
}

/// Base58Check(version || HASH160(compressed pubkey))
fn base58check_p2pkh(compressed: &[u8], versions: Base58Versions) -> String {
    let hash = hash160::Hash::hash(compressed);
    let mut payload = Vec::with_capacity(21);
    payload.push(versions.p2pkh);
    payload.extend_from_slice(hash.as_byte_array());
    bs58::encode(payload).with_check().into_string()
}

/// EIP-55 校验和地址
fn eip55_address(uncompressed: &[u8]) -> String {
    // 去掉 0x04 前缀
    let hash = Keccak256::digest(&uncompressed[1..]);
    to_checksum(&hash[12..])
}

pub(crate) fn to_checksum(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// 解码后的 UTXO 输出脚本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtxoDestination {
    P2pkh([u8; 20]),
    P2sh([u8; 20]),
}

/// 解码 Base58Check 地址，只接受当前网络的 P2PKH / P2SH 版本字节
pub fn decode_utxo_address(address: &str, versions: Base58Versions) -> WalletResult<UtxoDestination> {
    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| WalletError::validation(format!("invalid address '{}': {}", address, e)))?;

    if payload.len() != 21 {
        return Err(WalletError::validation(format!(
            "invalid address '{}': unexpected payload length {}",
            address,
            payload.len()
        )));
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);

    match payload[0] {
        v if v == versions.p2pkh => Ok(UtxoDestination::P2pkh(hash)),
        v if v == versions.p2sh => Ok(UtxoDestination::P2sh(hash)),
        v => Err(WalletError::validation(format!(
            "address '{}' has version byte 0x{:02x}, not valid for this network",
            address, v
        ))),
    }
}
