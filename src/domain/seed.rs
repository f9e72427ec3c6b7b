//! BIP39 种子派生
//!
//! PBKDF2-HMAC-SHA512，2048 轮，salt = "mnemonic" + passphrase，输出 64 字节。

use std::fmt;

use bip39::{Language, Mnemonic};
use zeroize::Zeroizing;

use crate::domain::secret::SecretString;
use crate::error::{WalletError, WalletResult};

pub const SEED_LENGTH: usize = 64;

/// 主种子，drop 时清零
pub struct Seed(Zeroizing<[u8; SEED_LENGTH]>);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; SEED_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed([REDACTED])")
    }
}

/// 从助记词 + passphrase 派生种子
///
/// 句子按空白切分后参与运算；纯函数，同一输入恒得同一种子。
pub fn derive_seed(mnemonic: &SecretString, passphrase: &SecretString) -> WalletResult<Seed> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, mnemonic.expose())
        .map_err(|e| WalletError::crypto(format!("invalid mnemonic: {}", e)))?;
    Ok(Seed(Zeroizing::new(mnemonic.to_seed(passphrase.expose()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_trezor_vector() {
        let seed = derive_seed(&TEST_MNEMONIC.into(), &"TREZOR".into()).unwrap();
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = derive_seed(&TEST_MNEMONIC.into(), &SecretString::default()).unwrap();
        let b = derive_seed(&TEST_MNEMONIC.into(), &SecretString::default()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_passphrase_changes_seed() {
        let a = derive_seed(&TEST_MNEMONIC.into(), &SecretString::default()).unwrap();
        let b = derive_seed(&TEST_MNEMONIC.into(), &"TREZOR".into()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_whitespace_insensitive() {
        let messy = format!("  {}  ", TEST_MNEMONIC.replace(' ', "   "));
        let a = derive_seed(&messy.into(), &"TREZOR".into()).unwrap();
        let b = derive_seed(&TEST_MNEMONIC.into(), &"TREZOR".into()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let phrase = TEST_MNEMONIC.replace("about", "abandon");
        let err = derive_seed(&phrase.into(), &SecretString::default()).unwrap_err();
        assert!(matches!(err, WalletError::Crypto(_)));
    }

    #[test]
    fn test_debug_redacted() {
        let seed = derive_seed(&TEST_MNEMONIC.into(), &SecretString::default()).unwrap();
        assert_eq!(format!("{:?}", seed), "Seed([REDACTED])");
    }
}
