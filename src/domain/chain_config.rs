//! 币种注册表
//!
//! 以 (coin_type, NetworkMode) 为键的静态表。每个条目是一个能力包：
//! 曲线 + 地址规则 + 签名规则。网络模式只切换版本字节 / chain id 等常量，
//! 不影响密钥派生；上层代码只匹配规则枚举，不按整数 coin type 分支。

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

/// 加密曲线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// BIP32 (Bitcoin, Litecoin, Dogecoin, Ethereum)
    Secp256k1,
    /// SLIP-0010，仅硬化派生 (Solana)
    Ed25519,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Production,
    Development,
}

impl NetworkMode {
    pub fn from_is_dev(is_dev: bool) -> Self {
        if is_dev {
            NetworkMode::Development
        } else {
            NetworkMode::Production
        }
    }

    pub fn is_dev(self) -> bool {
        matches!(self, NetworkMode::Development)
    }
}

/// Base58Check 版本字节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Base58Versions {
    pub p2pkh: u8,
    pub p2sh: u8,
}

/// 地址编码规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddressRule {
    /// Base58Check(version || HASH160(压缩公钥))
    Base58Check(Base58Versions),
    /// `0x` + Keccak-256(未压缩公钥) 后 20 字节，EIP-55 大小写校验
    Eip55,
    /// Base58(ed25519 公钥)
    Base58PublicKey,
}

/// 交易签名规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SigningRule {
    /// 传统 P2PKH 交易，逐输入 SIGHASH_ALL
    LegacyUtxo(Base58Versions),
    /// EIP-155 传统交易
    Eip155 { chain_id: u64 },
    /// 对序列化 message 直接做 Ed25519 签名
    Ed25519Message,
}

/// 币种参数（静态注册，不按请求构造）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinParams {
    pub coin_type: u32,
    pub symbol: &'static str,
    pub name: &'static str,
    pub curve: CurveType,
    pub network_mode: NetworkMode,
    pub address_rule: AddressRule,
    pub signing_rule: SigningRule,
}

static REGISTRY: Lazy<HashMap<(u32, NetworkMode), CoinParams>> = Lazy::new(|| {
    let mut table = HashMap::new();

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // UTXO 系列 (secp256k1 + Base58Check)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    register_utxo(
        &mut table,
        0,
        "BTC",
        "Bitcoin",
        Base58Versions { p2pkh: 0x00, p2sh: 0x05 },
        Base58Versions { p2pkh: 0x6f, p2sh: 0xc4 },
    );
    register_utxo(
        &mut table,
        2,
        "LTC",
        "Litecoin",
        Base58Versions { p2pkh: 0x30, p2sh: 0x32 },
        Base58Versions { p2pkh: 0x6f, p2sh: 0x3a },
    );
    register_utxo(
        &mut table,
        3,
        "DOGE",
        "Dogecoin",
        Base58Versions { p2pkh: 0x1e, p2sh: 0x16 },
        Base58Versions { p2pkh: 0x71, p2sh: 0xc4 },
    );

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 账户模型
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // Ethereum Mainnet / Sepolia
    for (network_mode, chain_id) in [
        (NetworkMode::Production, 1),
        (NetworkMode::Development, 11_155_111),
    ] {
        insert(
            &mut table,
            CoinParams {
                coin_type: 60,
                symbol: "ETH",
                name: "Ethereum",
                curve: CurveType::Secp256k1,
                network_mode,
                address_rule: AddressRule::Eip55,
                signing_rule: SigningRule::Eip155 { chain_id },
            },
        );
    }

    // Solana 地址与网络无关
    for network_mode in [NetworkMode::Production, NetworkMode::Development] {
        insert(
            &mut table,
            CoinParams {
                coin_type: 501,
                symbol: "SOL",
                name: "Solana",
                curve: CurveType::Ed25519,
                network_mode,
                address_rule: AddressRule::Base58PublicKey,
                signing_rule: SigningRule::Ed25519Message,
            },
        );
    }

    table
});

fn register_utxo(
    table: &mut HashMap<(u32, NetworkMode), CoinParams>,
    coin_type: u32,
    symbol: &'static str,
    name: &'static str,
    production: Base58Versions,
    development: Base58Versions,
) {
    for (network_mode, versions) in [
        (NetworkMode::Production, production),
        (NetworkMode::Development, development),
    ] {
        insert(
            table,
            CoinParams {
                coin_type,
                symbol,
                name,
                curve: CurveType::Secp256k1,
                network_mode,
                address_rule: AddressRule::Base58Check(versions),
                signing_rule: SigningRule::LegacyUtxo(versions),
            },
        );
    }
}

fn insert(table: &mut HashMap<(u32, NetworkMode), CoinParams>, params: CoinParams) {
    table.insert((params.coin_type, params.network_mode), params);
}

/// 币种注册表
pub struct CoinRegistry;

impl CoinRegistry {
    /// 查找币种参数
    pub fn lookup(coin_type: u32, network_mode: NetworkMode) -> WalletResult<&'static CoinParams> {
        REGISTRY
            .get(&(coin_type, network_mode))
            .ok_or_else(|| WalletError::crypto(format!("unsupported coin type {}", coin_type)))
    }

    /// 列出所有条目，按 (coin_type, 网络模式) 排序
    pub fn list() -> Vec<&'static CoinParams> {
        let mut all: Vec<&'static CoinParams> = REGISTRY.values().collect();
        all.sort_by_key(|p| (p.coin_type, p.network_mode.is_dev()));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_coins() {
        let btc = CoinRegistry::lookup(0, NetworkMode::Production).unwrap();
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.curve, CurveType::Secp256k1);
        assert_eq!(
            btc.address_rule,
            AddressRule::Base58Check(Base58Versions { p2pkh: 0x00, p2sh: 0x05 })
        );

        let sol = CoinRegistry::lookup(501, NetworkMode::Development).unwrap();
        assert_eq!(sol.curve, CurveType::Ed25519);
    }

    #[test]
    fn test_network_mode_only_changes_constants() {
        for coin_type in [0, 2, 3, 60, 501] {
            let prod = CoinRegistry::lookup(coin_type, NetworkMode::Production).unwrap();
            let dev = CoinRegistry::lookup(coin_type, NetworkMode::Development).unwrap();
            assert_eq!(prod.curve, dev.curve);
            assert_eq!(prod.symbol, dev.symbol);
        }

        let eth_dev = CoinRegistry::lookup(60, NetworkMode::Development).unwrap();
        assert_eq!(eth_dev.signing_rule, SigningRule::Eip155 { chain_id: 11_155_111 });
    }

    #[test]
    fn test_unsupported_coin_type() {
        let err = CoinRegistry::lookup(9999, NetworkMode::Production).unwrap_err();
        assert!(matches!(err, WalletError::Crypto(_)));
        assert!(err.message().contains("unsupported coin type"));
    }

    #[test]
    fn test_list_sorted_and_complete() {
        let all = CoinRegistry::list();
        assert_eq!(all.len(), 10);
        assert_eq!(all[0].coin_type, 0);
        assert_eq!(all[0].network_mode, NetworkMode::Production);
        assert_eq!(all[9].coin_type, 501);
    }

    #[test]
    fn test_serialize_for_info() {
        let eth = CoinRegistry::lookup(60, NetworkMode::Production).unwrap();
        let json = serde_json::to_value(eth).unwrap();
        assert_eq!(json["coinType"], 60);
        assert_eq!(json["curve"], "secp256k1");
        assert_eq!(json["networkMode"], "production");
        assert_eq!(json["signingRule"]["kind"], "eip155");
        assert_eq!(json["signingRule"]["chain_id"], 1);
    }
}
