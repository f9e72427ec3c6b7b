//! 测试辅助模块
//! 提供内存存储的引擎、应用状态和注册辅助函数

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use custody_vault::{
    app_state::AppState,
    config::{Config, WalletConfig},
    domain::UserRecord,
    error::{WalletError, WalletResult},
    repository::{MemoryUserStore, UserRecordAdapter},
    service::{RegisterRequest, RequestContext, WalletEngine},
};

/// BIP39 标准 12 词测试向量
pub const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// 创建内存存储的测试引擎
pub fn memory_engine() -> WalletEngine {
    WalletEngine::new(Arc::new(MemoryUserStore::new()), WalletConfig::default())
}

/// 创建内存存储的测试应用状态
pub fn memory_state() -> Arc<AppState> {
    Arc::new(AppState::in_memory(Config::default()))
}

pub fn ctx(operation: &'static str) -> RequestContext {
    RequestContext::new("integration-test", operation)
}

/// 以给定 id / 助记词 / passphrase 注册用户
pub async fn register(engine: &WalletEngine, id: &str, mnemonic: &str, passphrase: &str) -> String {
    engine
        .register(
            &ctx("register"),
            RegisterRequest {
                id: Some(id.to_string()),
                username: None,
                mnemonic: mnemonic.into(),
                passphrase: passphrase.into(),
            },
        )
        .await
        .expect("register failed")
}

/// 所有操作都失败的存储，模拟后端不可用
pub struct FailingStore;

#[async_trait]
impl UserRecordAdapter for FailingStore {
    async fn get(&self, _key: &str) -> WalletResult<Option<UserRecord>> {
        Err(WalletError::storage("backend unavailable"))
    }

    async fn put(&self, _key: &str, _record: &UserRecord) -> WalletResult<()> {
        Err(WalletError::storage("backend unavailable"))
    }

    async fn create_if_absent(&self, _key: &str, _record: &UserRecord) -> WalletResult<bool> {
        Err(WalletError::storage("backend unavailable"))
    }

    async fn list(&self, _prefix: &str) -> WalletResult<Vec<String>> {
        Err(WalletError::storage("backend unavailable"))
    }

    async fn delete(&self, _key: &str) -> WalletResult<bool> {
        Err(WalletError::storage("backend unavailable"))
    }
}

pub fn failing_engine() -> WalletEngine {
    WalletEngine::new(Arc::new(FailingStore), WalletConfig::default())
}

pub fn failing_state() -> Arc<AppState> {
    Arc::new(AppState::with_store(Config::default(), Arc::new(FailingStore), None))
}
