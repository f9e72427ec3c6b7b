//! 进程内存储，用于开发环境与测试

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::UserRecordAdapter;
use crate::domain::user::UserRecord;
use crate::error::WalletResult;

#[derive(Default)]
pub struct MemoryUserStore {
    records: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl UserRecordAdapter for MemoryUserStore {
    async fn get(&self, key: &str) -> WalletResult<Option<UserRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, record: &UserRecord) -> WalletResult<()> {
        self.records
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn create_if_absent(&self, key: &str, record: &UserRecord) -> WalletResult<bool> {
        // 检查与写入在同一把写锁内完成
        let mut records = self.records.write().await;
        if records.contains_key(key) {
            return Ok(false);
        }
        records.insert(key.to_string(), record.clone());
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> WalletResult<Vec<String>> {
        let records = self.records.read().await;
        let mut ids: Vec<String> = records
            .keys()
            .filter_map(|key| key.strip_prefix(prefix).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, key: &str) -> WalletResult<bool> {
        Ok(self.records.write().await.remove(key).is_some())
    }
}
