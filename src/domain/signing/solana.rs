//! Solana message 签名
//!
//! payload 为 base64 编码的序列化 message（legacy 或 versioned）。
//! 只签单签名者 message，且第一个账户（fee payer）必须是派生出的公钥。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::Signer;

use super::SignedPayload;
use crate::domain::derivation::Keypair;
use crate::error::{WalletError, WalletResult};

const VERSION_PREFIX_MASK: u8 = 0x80;
const PUBKEY_LEN: usize = 32;

pub(super) fn sign(payload: &str, keypair: &Keypair) -> WalletResult<SignedPayload> {
    let message = STANDARD
        .decode(payload.trim())
        .map_err(|e| WalletError::validation(format!("payload is not valid base64: {}", e)))?;

    let signing_key = keypair.private_key.as_ed25519()?;
    let fee_payer = first_account_key(&message)?;
    if fee_payer != signing_key.verifying_key().as_bytes() {
        return Err(WalletError::validation(
            "message fee payer does not match the derived key",
        ));
    }

    let signature = signing_key.sign(&message).to_bytes();

    // wire: shortvec(1) || signature || message
    let mut wire = Vec::with_capacity(1 + signature.len() + message.len());
    wire.push(1);
    wire.extend_from_slice(&signature);
    wire.extend_from_slice(&message);

    Ok(SignedPayload {
        signatures: vec![bs58::encode(signature).into_string()],
        signed_transaction: Some(STANDARD.encode(wire)),
    })
}

/// 校验 message 头并返回第一个账户公钥
fn first_account_key(message: &[u8]) -> WalletResult<&[u8]> {
    let mut offset = match message.first() {
        None => return Err(WalletError::validation("message is empty")),
        Some(&prefix) if prefix & VERSION_PREFIX_MASK != 0 => {
            // 目前只有 v0
            let version = prefix & !VERSION_PREFIX_MASK;
            if version != 0 {
                return Err(WalletError::validation(format!(
                    "unsupported message version {}",
                    version
                )));
            }
            1
        }
        Some(_) => 0,
    };

    let header = message
        .get(offset..offset + 3)
        .ok_or_else(|| WalletError::validation("message header is truncated"))?;
    let num_required_signatures = header[0];
    if num_required_signatures != 1 {
        return Err(WalletError::validation(format!(
            "message requires {} signatures, only single-signer messages are supported",
            num_required_signatures
        )));
    }
    offset += 3;

    let (num_keys, consumed) = decode_short_vec_len(&message[offset..])?;
    if num_keys == 0 {
        return Err(WalletError::validation("message has no account keys"));
    }
    offset += consumed;

    message
        .get(offset..offset + PUBKEY_LEN)
        .ok_or_else(|| WalletError::validation("message account keys are truncated"))
}

/// compact-u16 长度前缀，最多 3 字节
fn decode_short_vec_len(bytes: &[u8]) -> WalletResult<(usize, usize)> {
    let mut value: usize = 0;
    for (i, byte) in bytes.iter().take(3).enumerate() {
        value |= usize::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(WalletError::validation("malformed compact-u16 length"))
}
