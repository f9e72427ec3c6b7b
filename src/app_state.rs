use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::db::PgPool,
    repository::{MemoryUserStore, PgUserStore, UserRecordAdapter},
    service::WalletEngine,
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WalletEngine>,
    pub config: Arc<Config>,
    /// 内存存储时为 `None`
    pub pool: Option<PgPool>,
}

impl AppState {
    /// 内存存储
    pub fn in_memory(config: Config) -> Self {
        let store: Arc<dyn UserRecordAdapter> = Arc::new(MemoryUserStore::new());
        Self::with_store(config, store, None)
    }

    /// Postgres 存储
    pub fn with_postgres(config: Config, pool: PgPool) -> Self {
        let store: Arc<dyn UserRecordAdapter> = Arc::new(PgUserStore::new(pool.clone()));
        Self::with_store(config, store, Some(pool))
    }

    pub fn with_store(config: Config, store: Arc<dyn UserRecordAdapter>, pool: Option<PgPool>) -> Self {
        let engine = Arc::new(WalletEngine::new(store, config.wallet.clone()));
        Self {
            engine,
            config: Arc::new(config),
            pool,
        }
    }
}
