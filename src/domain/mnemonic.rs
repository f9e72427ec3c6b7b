//! BIP39 助记词服务
//!
//! 生成：CSPRNG 熵 + SHA-256 校验位 → 11 bit 分组 → 2048 词表
//! 校验：词表反查 → 重算校验位；畸形输入只返回 `false`，不会报错

use bip39::{Language, Mnemonic};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::secret::SecretString;
use crate::error::{WalletError, WalletResult};

/// 熵长度（bit）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum EntropyBits {
    Bits128,
    Bits160,
    Bits192,
    Bits224,
    Bits256,
}

impl EntropyBits {
    pub const ALL: [EntropyBits; 5] = [
        EntropyBits::Bits128,
        EntropyBits::Bits160,
        EntropyBits::Bits192,
        EntropyBits::Bits224,
        EntropyBits::Bits256,
    ];

    pub const fn bits(self) -> u32 {
        match self {
            EntropyBits::Bits128 => 128,
            EntropyBits::Bits160 => 160,
            EntropyBits::Bits192 => 192,
            EntropyBits::Bits224 => 224,
            EntropyBits::Bits256 => 256,
        }
    }

    pub const fn byte_len(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// 句子单词数 = bits / 32 * 3
    pub const fn word_count(self) -> usize {
        (self.bits() / 32 * 3) as usize
    }
}

impl TryFrom<u32> for EntropyBits {
    type Error = WalletError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            128 => Ok(EntropyBits::Bits128),
            160 => Ok(EntropyBits::Bits160),
            192 => Ok(EntropyBits::Bits192),
            224 => Ok(EntropyBits::Bits224),
            256 => Ok(EntropyBits::Bits256),
            other => Err(WalletError::validation(format!(
                "unsupported entropy length {} (expected 128, 160, 192, 224 or 256)",
                other
            ))),
        }
    }
}

impl From<EntropyBits> for u32 {
    fn from(bits: EntropyBits) -> Self {
        bits.bits()
    }
}

impl Default for EntropyBits {
    fn default() -> Self {
        EntropyBits::Bits256
    }
}

pub struct MnemonicService;

impl MnemonicService {
    /// 生成新助记词
    pub fn generate(entropy_bits: EntropyBits) -> WalletResult<SecretString> {
        let len = entropy_bits.byte_len();
        let mut entropy = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut entropy[..len])
            .map_err(|e| WalletError::crypto(format!("entropy source unavailable: {}", e)))?;

        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..len])
            .map_err(|e| WalletError::crypto(format!("failed to encode mnemonic: {}", e)))?;

        Ok(SecretString::new(mnemonic.to_string()))
    }

    /// 校验并返回规范化句子（单空格分隔）
    ///
    /// 注册流程需要具体原因时使用；纯判断请用 [`MnemonicService::validate`]。
    pub fn normalize(phrase: &str) -> WalletResult<SecretString> {
        let word_count = phrase.split_whitespace().count();
        if !matches!(word_count, 12 | 15 | 18 | 21 | 24) {
            return Err(WalletError::crypto(format!(
                "invalid mnemonic: {} words",
                word_count
            )));
        }

        let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
            .map_err(|e| WalletError::crypto(format!("invalid mnemonic: {}", e)))?;

        Ok(SecretString::new(mnemonic.to_string()))
    }

    pub fn validate(phrase: &str) -> bool {
        Self::normalize(phrase).is_ok()
    }
}
