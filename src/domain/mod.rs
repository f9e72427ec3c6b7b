//! Domain 模块
//!
//! 确定性密码学引擎：助记词、种子、路径、币种注册表、密钥派生、地址与签名

pub mod address;
pub mod chain_config;
pub mod derivation;
pub mod derivation_path;
pub mod mnemonic;
pub mod secret;
pub mod seed;
pub mod signing;
pub mod user;

// 重新导出常用类型
pub use address::AddressEncoder;
pub use chain_config::{AddressRule, CoinParams, CoinRegistry, CurveType, NetworkMode, SigningRule};
pub use derivation::{KeyDeriver, Keypair};
pub use derivation_path::{expand_template, DerivationPath, Segment};
pub use mnemonic::{EntropyBits, MnemonicService};
pub use secret::SecretString;
pub use seed::{derive_seed, Seed};
pub use signing::{SignedPayload, TransactionSigner};
pub use user::UserRecord;
