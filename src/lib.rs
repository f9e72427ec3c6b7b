//! custody-vault - 托管式确定性多币种 HD 钱包引擎
//!
//! 按用户保存 BIP39 助记词与 passphrase，按需派生 BIP32 / SLIP-0010 密钥，
//! 生成地址（单个或批量）并签名原始交易 payload。

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repository;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode, WalletError, WalletResult};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{CoinRegistry, DerivationPath, KeyDeriver, MnemonicService, NetworkMode},
        error::{AppError, WalletError, WalletResult},
        service::{RequestContext, WalletEngine},
    };
}
