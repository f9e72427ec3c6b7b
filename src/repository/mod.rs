//! 用户记录存储适配层
//!
//! 引擎只通过 [`UserRecordAdapter`] 访问宿主存储。键为 `storage_prefix + id`。

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::user::UserRecord;
use crate::error::WalletResult;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

// ============ Adapter Trait ============

#[async_trait]
pub trait UserRecordAdapter: Send + Sync {
    /// 读取记录，不存在返回 `None`
    async fn get(&self, key: &str) -> WalletResult<Option<UserRecord>>;

    /// 无条件写入（覆盖）
    async fn put(&self, key: &str, record: &UserRecord) -> WalletResult<()>;

    /// 原子条件写入：键不存在时写入并返回 `true`，已存在返回 `false` 且不修改原记录
    async fn create_if_absent(&self, key: &str, record: &UserRecord) -> WalletResult<bool>;

    /// 列出以 `prefix` 开头的键，返回去掉前缀后的 id（升序）
    async fn list(&self, prefix: &str) -> WalletResult<Vec<String>>;

    /// 删除记录，返回是否存在
    async fn delete(&self, key: &str) -> WalletResult<bool>;
}
