//! 分层确定性密钥派生
//!
//! - secp256k1: BIP32，使用 `coins_bip32::XPriv`
//! - ed25519: SLIP-0010，主密钥 HMAC-SHA512("ed25519 seed", seed)，只允许硬化段
//!
//! 所有中间节点在 drop 时清零。

use std::fmt;

use coins_bip32::xkeys::XPriv;
use ed25519_dalek::{SigningKey, VerifyingKey};
use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::domain::chain_config::CurveType;
use crate::domain::derivation_path::{DerivationPath, Segment};
use crate::error::{WalletError, WalletResult};

type HmacSha512 = Hmac<Sha512>;

const ED25519_MASTER_SECRET: &[u8] = b"ed25519 seed";

/// SLIP-0010 ed25519 扩展私钥
#[derive(Clone)]
struct Slip10Key {
    key: Zeroizing<[u8; 32]>,
    chain_code: Zeroizing<[u8; 32]>,
}

impl Slip10Key {
    /// I = HMAC-SHA512(key, data...)，IL 为私钥，IR 为 chain code
    fn hmac(key: &[u8], data: &[&[u8]]) -> WalletResult<Self> {
        let mut mac = HmacSha512::new_from_slice(key)
            .map_err(|e| WalletError::crypto(format!("HMAC init failed: {}", e)))?;
        for part in data {
            mac.update(part);
        }
        let mut output = mac.finalize().into_bytes();

        let mut node = Self {
            key: Zeroizing::new([0u8; 32]),
            chain_code: Zeroizing::new([0u8; 32]),
        };
        node.key.copy_from_slice(&output[..32]);
        node.chain_code.copy_from_slice(&output[32..]);
        output.as_mut_slice().zeroize();

        Ok(node)
    }

    fn master(seed: &[u8]) -> WalletResult<Self> {
        Self::hmac(ED25519_MASTER_SECRET, &[seed])
    }

    /// CKDpriv（仅硬化）
    fn child(&self, segment: Segment) -> WalletResult<Self> {
        if !segment.hardened {
            return Err(WalletError::crypto(format!(
                "ed25519 derivation requires hardened segments, got {}",
                segment
            )));
        }
        let index = segment.child_number().to_be_bytes();
        let data: [&[u8]; 3] = [&[0x00], &self.key[..], &index];
        Self::hmac(&self.chain_code[..], &data)
    }
}

/// 派生树上的一个节点
#[derive(Clone)]
enum Node {
    Secp256k1(XPriv),
    Ed25519(Slip10Key),
}

impl Node {
    fn master(seed: &[u8], curve: CurveType) -> WalletResult<Self> {
        match curve {
            CurveType::Secp256k1 => XPriv::root_from_seed(seed, None)
                .map(Node::Secp256k1)
                .map_err(|e| WalletError::crypto(format!("BIP32 master key failed: {}", e))),
            CurveType::Ed25519 => Slip10Key::master(seed).map(Node::Ed25519),
        }
    }

    fn child(&self, segment: Segment) -> WalletResult<Self> {
        use coins_bip32::prelude::*;

        match self {
            Node::Secp256k1(xpriv) => xpriv
                .derive_child(segment.child_number())
                .map(Node::Secp256k1)
                .map_err(|e| {
                    WalletError::crypto(format!("invalid child key at index {}: {}", segment, e))
                }),
            Node::Ed25519(node) => node.child(segment).map(Node::Ed25519),
        }
    }

    fn walk(mut self, segments: &[Segment]) -> WalletResult<Self> {
        for segment in segments {
            self = self.child(*segment)?;
        }
        Ok(self)
    }

    fn into_keypair(self) -> Keypair {
        match self {
            Node::Secp256k1(xpriv) => {
                let signing: &k256::ecdsa::SigningKey = xpriv.as_ref();
                let secret = SecretKey::from(signing.as_nonzero_scalar());
                let public = secret.public_key();
                Keypair {
                    private_key: PrivateKey::Secp256k1(secret),
                    public_key: PublicKey::Secp256k1(public),
                }
            }
            Node::Ed25519(node) => {
                let signing = SigningKey::from_bytes(&node.key);
                let verifying = signing.verifying_key();
                Keypair {
                    private_key: PrivateKey::Ed25519(signing),
                    public_key: PublicKey::Ed25519(verifying),
                }
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 派生结果
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 私钥，底层类型 drop 时清零
pub enum PrivateKey {
    Secp256k1(SecretKey),
    Ed25519(SigningKey),
}

impl PrivateKey {
    pub fn curve(&self) -> CurveType {
        match self {
            PrivateKey::Secp256k1(_) => CurveType::Secp256k1,
            PrivateKey::Ed25519(_) => CurveType::Ed25519,
        }
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        match self {
            PrivateKey::Secp256k1(secret) => {
                let mut bytes = secret.to_bytes();
                out.copy_from_slice(&bytes);
                bytes.as_mut_slice().zeroize();
            }
            PrivateKey::Ed25519(signing) => out.copy_from_slice(signing.as_bytes()),
        }
        out
    }

    pub fn as_secp256k1(&self) -> WalletResult<&SecretKey> {
        match self {
            PrivateKey::Secp256k1(secret) => Ok(secret),
            PrivateKey::Ed25519(_) => Err(WalletError::crypto(
                "coin requires a secp256k1 key but an ed25519 key was derived",
            )),
        }
    }

    pub fn as_ed25519(&self) -> WalletResult<&SigningKey> {
        match self {
            PrivateKey::Ed25519(signing) => Ok(signing),
            PrivateKey::Secp256k1(_) => Err(WalletError::crypto(
                "coin requires an ed25519 key but a secp256k1 key was derived",
            )),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({:?}, [REDACTED])", self.curve())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Secp256k1(k256::PublicKey),
    Ed25519(VerifyingKey),
}

impl PublicKey {
    /// secp256k1 为 33 字节压缩格式，ed25519 为 32 字节
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Secp256k1(pk) => pk.to_encoded_point(true).as_bytes().to_vec(),
            PublicKey::Ed25519(pk) => pk.to_bytes().to_vec(),
        }
    }

    /// 65 字节未压缩格式（0x04 前缀），仅 secp256k1
    pub fn to_uncompressed(&self) -> WalletResult<Vec<u8>> {
        match self {
            PublicKey::Secp256k1(pk) => Ok(pk.to_encoded_point(false).as_bytes().to_vec()),
            PublicKey::Ed25519(_) => Err(WalletError::crypto(
                "ed25519 keys have no uncompressed encoding",
            )),
        }
    }
}

/// 派生出的密钥对，仅在单个请求内存活
#[derive(Debug)]
pub struct Keypair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// KeyDeriver
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct KeyDeriver;

impl KeyDeriver {
    /// 沿路径派生单个密钥对
    pub fn derive(seed: &[u8], path: &DerivationPath, curve: CurveType) -> WalletResult<Keypair> {
        Ok(Node::master(seed, curve)?
            .walk(path.segments())?
            .into_keypair())
    }

    /// 批量派生：公共前缀只算一次，再分别派生各自的尾部
    ///
    /// 结果顺序与 `paths` 一致；任一路径失败则整批失败。
    pub fn derive_batch(
        seed: &[u8],
        paths: &[DerivationPath],
        curve: CurveType,
    ) -> WalletResult<Vec<Keypair>> {
        let Some(first) = paths.first() else {
            return Ok(Vec::new());
        };

        let prefix_len = paths
            .iter()
            .map(|p| first.common_prefix_len(p))
            .min()
            .unwrap_or(0);

        let base = Node::master(seed, curve)?.walk(&first.segments()[..prefix_len])?;

        paths
            .iter()
            .map(|path| {
                base.clone()
                    .walk(&path.segments()[prefix_len..])
                    .map(Node::into_keypair)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_seed() -> Vec<u8> {
        hex::decode("000102030405060708090a0b0c0d0e0f").unwrap()
    }

    fn private_hex(seed: &[u8], path: &str, curve: CurveType) -> String {
        let path = if path == "m" {
            DerivationPath::default()
        } else {
            DerivationPath::parse(path).unwrap()
        };
        let keypair = KeyDeriver::derive(seed, &path, curve).unwrap();
        hex::encode(*keypair.private_key.to_bytes())
    }

    #[test]
    fn test_bip32_vector_1() {
        let seed = vector_seed();
        assert_eq!(
            private_hex(&seed, "m", CurveType::Secp256k1),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
        assert_eq!(
            private_hex(&seed, "m/0H", CurveType::Secp256k1),
            "edb2e14f9ee77d26dd93b4ecede8d16ed408ce149b6cd80b0715a2d911a0afea"
        );
        // 非硬化段走压缩公钥分支
        assert_eq!(
            private_hex(&seed, "m/0H/1", CurveType::Secp256k1),
            "3c6cb8d0f6a264c91ea8b5030fadaa8e538b020f0a387421a12de9319dc93368"
        );
    }

    #[test]
    fn test_bip32_vector_1_deep_chain() {
        let seed = vector_seed();
        let path = "m/0H/1/2H/2/1000000000";
        assert_eq!(
            private_hex(&seed, path, CurveType::Secp256k1),
            "471b76e389e528d6de6d816857e012c5455051cad6660850e58372a6c3e6e7c8"
        );

        // 批量派生共享前缀 m/0H/1/2H 后结果一致
        let paths = vec![
            DerivationPath::parse("m/0H/1/2H/2").unwrap(),
            DerivationPath::parse(path).unwrap(),
        ];
        let batch = KeyDeriver::derive_batch(&seed, &paths, CurveType::Secp256k1).unwrap();
        assert_eq!(
            hex::encode(*batch[1].private_key.to_bytes()),
            "471b76e389e528d6de6d816857e012c5455051cad6660850e58372a6c3e6e7c8"
        );
    }

    #[test]
    fn test_bip32_master_public_key() {
        let seed = vector_seed();
        let keypair =
            KeyDeriver::derive(&seed, &DerivationPath::default(), CurveType::Secp256k1).unwrap();
        assert_eq!(
            hex::encode(keypair.public_key.to_bytes()),
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );
    }

    #[test]
    fn test_slip10_ed25519_vector_1() {
        let seed = vector_seed();
        assert_eq!(
            private_hex(&seed, "m", CurveType::Ed25519),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
        assert_eq!(
            private_hex(&seed, "m/0H", CurveType::Ed25519),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );
    }

    #[test]
    fn test_ed25519_rejects_normal_segment() {
        let seed = vector_seed();
        let path = DerivationPath::parse("m/44'/501'/0'/0").unwrap();
        let err = KeyDeriver::derive(&seed, &path, CurveType::Ed25519).unwrap_err();
        assert!(matches!(err, WalletError::Crypto(_)));
    }

    #[test]
    fn test_batch_matches_single() {
        let seed = vector_seed();
        let paths: Vec<DerivationPath> = (0..4)
            .map(|i| DerivationPath::parse(&format!("m/44'/60'/0'/0/{}", i)).unwrap())
            .collect();

        let batch = KeyDeriver::derive_batch(&seed, &paths, CurveType::Secp256k1).unwrap();
        assert_eq!(batch.len(), 4);
        for (path, keypair) in paths.iter().zip(batch.iter()) {
            let single = KeyDeriver::derive(&seed, path, CurveType::Secp256k1).unwrap();
            assert_eq!(single.public_key, keypair.public_key);
        }
    }

    #[test]
    fn test_batch_with_hardened_tail() {
        let seed = vector_seed();
        let paths: Vec<DerivationPath> = (0..3)
            .map(|i| DerivationPath::parse(&format!("m/44'/501'/{}'/0'", i)).unwrap())
            .collect();
        let batch = KeyDeriver::derive_batch(&seed, &paths, CurveType::Ed25519).unwrap();
        let single = KeyDeriver::derive(&seed, &paths[2], CurveType::Ed25519).unwrap();
        assert_eq!(batch[2].public_key, single.public_key);
        assert_ne!(batch[0].public_key, batch[1].public_key);
    }

    #[test]
    fn test_batch_all_or_nothing() {
        let seed = vector_seed();
        let paths = vec![
            DerivationPath::parse("m/44'/501'/0'/0'").unwrap(),
            DerivationPath::parse("m/44'/501'/0'/1").unwrap(),
        ];
        assert!(KeyDeriver::derive_batch(&seed, &paths, CurveType::Ed25519).is_err());
    }

    #[test]
    fn test_curve_accessors() {
        let seed = vector_seed();
        let path = DerivationPath::parse("m/44'/60'/0'/0/0").unwrap();
        let keypair = KeyDeriver::derive(&seed, &path, CurveType::Secp256k1).unwrap();
        assert!(keypair.private_key.as_secp256k1().is_ok());
        assert!(keypair.private_key.as_ed25519().is_err());
        assert_eq!(keypair.public_key.to_uncompressed().unwrap().len(), 65);
        assert!(!format!("{:?}", keypair).contains(&hex::encode(*keypair.private_key.to_bytes())));
    }
}
