//! UTXO 传统 P2PKH 交易签名（BTC / LTC / DOGE）
//!
//! payload: `{"inputs":[{"txhash","vout"}],"outputs":[{"address","amount"}]}`
//! 所有输入都视为花费派生密钥自己的 P2PKH 输出。

use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::blockdata::script::Builder;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::{hash160, Hash};
use bitcoin::script::PushBytesBuf;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, OutPoint, PubkeyHash, ScriptBuf, ScriptHash, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
};
use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey};
use serde::Deserialize;

use super::SignedPayload;
use crate::domain::address::{decode_utxo_address, UtxoDestination};
use crate::domain::chain_config::Base58Versions;
use crate::domain::derivation::Keypair;
use crate::error::{WalletError, WalletResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UtxoPayload {
    inputs: Vec<UtxoInput>,
    outputs: Vec<UtxoOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UtxoInput {
    txhash: String,
    vout: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UtxoOutput {
    address: String,
    amount: u64,
}

pub(super) fn sign(
    payload: &str,
    keypair: &Keypair,
    versions: Base58Versions,
) -> WalletResult<SignedPayload> {
    let payload: UtxoPayload = serde_json::from_str(payload)
        .map_err(|e| WalletError::validation(format!("malformed UTXO payload: {}", e)))?;

    if payload.inputs.is_empty() {
        return Err(WalletError::validation("UTXO payload has no inputs"));
    }
    if payload.outputs.is_empty() {
        return Err(WalletError::validation("UTXO payload has no outputs"));
    }

    let input = payload
        .inputs
        .iter()
        .map(|i| {
            let txid = Txid::from_str(&i.txhash).map_err(|e| {
                WalletError::validation(format!("invalid txhash '{}': {}", i.txhash, e))
            })?;
            Ok(TxIn {
                previous_output: OutPoint { txid, vout: i.vout },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
        })
        .collect::<WalletResult<Vec<_>>>()?;

    let output = payload
        .outputs
        .iter()
        .map(|o| {
            let script_pubkey = match decode_utxo_address(&o.address, versions)? {
                UtxoDestination::P2pkh(hash) => {
                    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(hash))
                }
                UtxoDestination::P2sh(hash) => {
                    ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(hash))
                }
            };
            Ok(TxOut {
                value: Amount::from_sat(o.amount),
                script_pubkey,
            })
        })
        .collect::<WalletResult<Vec<_>>>()?;

    let mut tx = Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input,
        output,
    };

    let public_key = keypair.public_key.to_bytes();
    let prevout_script = ScriptBuf::new_p2pkh(&PubkeyHash::from_raw_hash(hash160::Hash::hash(
        &public_key,
    )));
    let signing_key = SigningKey::from(keypair.private_key.as_secp256k1()?);

    // 传统 sighash 会清空其他输入的 scriptSig，先算全部摘要再回填
    let digests = {
        let cache = SighashCache::new(&tx);
        (0..tx.input.len())
            .map(|i| {
                cache
                    .legacy_signature_hash(i, &prevout_script, EcdsaSighashType::All.to_u32())
                    .map(|sighash| *sighash.as_byte_array())
                    .map_err(|e| WalletError::crypto(format!("sighash computation failed: {}", e)))
            })
            .collect::<WalletResult<Vec<[u8; 32]>>>()?
    };

    let mut signatures = Vec::with_capacity(digests.len());
    for (i, digest) in digests.iter().enumerate() {
        let signature: Signature = signing_key
            .sign_prehash(digest)
            .map_err(|e| WalletError::crypto(format!("ECDSA signing failed: {}", e)))?;
        let signature = signature.normalize_s().unwrap_or(signature);

        let mut sig_bytes = signature.to_der().as_bytes().to_vec();
        sig_bytes.push(EcdsaSighashType::All.to_u32() as u8);
        signatures.push(hex::encode(&sig_bytes));

        let sig_push = PushBytesBuf::try_from(sig_bytes)
            .map_err(|e| WalletError::crypto(format!("signature push failed: {:?}", e)))?;
        let pk_push = PushBytesBuf::try_from(public_key.clone())
            .map_err(|e| WalletError::crypto(format!("public key push failed: {:?}", e)))?;

        tx.input[i].script_sig = Builder::new()
            .push_slice(sig_push)
            .push_slice(pk_push)
            .into_script();
    }

    Ok(SignedPayload {
        signatures,
        signed_transaction: Some(serialize_hex(&tx)),
    })
}
