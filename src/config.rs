//! 配置管理模块
//! 支持从配置文件（TOML）和环境变量加载配置，环境变量优先

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::mnemonic::EntropyBits;

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 钱包引擎配置，构造引擎时注入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// 自动生成助记词的熵长度
    pub entropy_bits: EntropyBits,
    /// 存储键前缀，键 = prefix + id
    pub storage_prefix: String,
    /// 批量地址派生上限
    pub max_batch_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8200".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            entropy_bits: EntropyBits::Bits256,
            storage_prefix: "users/".into(),
            max_batch_count: 100,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 16,
            run_migrations: true,
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 配置文件打底，环境变量覆盖
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.as_ref().exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 按变量名覆盖字段
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.logging.format = v;
        }
        if let Some(v) = lookup("WALLET_ENTROPY_BITS") {
            let bits: u32 = v
                .parse()
                .with_context(|| format!("WALLET_ENTROPY_BITS is not a number: {}", v))?;
            self.wallet.entropy_bits = EntropyBits::try_from(bits)?;
        }
        if let Some(v) = lookup("WALLET_STORAGE_PREFIX") {
            self.wallet.storage_prefix = v;
        }
        if let Some(v) = lookup("WALLET_MAX_BATCH_COUNT") {
            self.wallet.max_batch_count = v
                .parse()
                .with_context(|| format!("WALLET_MAX_BATCH_COUNT is not a number: {}", v))?;
        }
        if let Some(v) = lookup("STORAGE_BACKEND") {
            self.storage.backend = match v.to_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "postgres" => StorageBackend::Postgres,
                other => anyhow::bail!("STORAGE_BACKEND must be 'memory' or 'postgres', got '{}'", other),
            };
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.storage.database_url = Some(v);
        }
        if let Some(v) = lookup("DB_MAX_CONNS") {
            self.storage.max_connections = v
                .parse()
                .with_context(|| format!("DB_MAX_CONNS is not a number: {}", v))?;
        }
        if lookup("SKIP_MIGRATIONS").is_some() {
            self.storage.run_migrations = false;
        }
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if self.wallet.storage_prefix.is_empty() {
            anyhow::bail!("wallet.storage_prefix must not be empty");
        }
        if self.wallet.max_batch_count == 0 {
            anyhow::bail!("wallet.max_batch_count must be at least 1");
        }

        if self.storage.backend == StorageBackend::Postgres {
            match self.storage.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                _ => anyhow::bail!(
                    "DATABASE_URL must start with postgres:// or postgresql:// when storage.backend = postgres"
                ),
            }
            if self.storage.max_connections == 0 {
                anyhow::bail!("storage.max_connections must be at least 1");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wallet.entropy_bits, EntropyBits::Bits256);
        assert_eq!(config.wallet.storage_prefix, "users/");
        assert_eq!(config.wallet.max_batch_count, 100);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_addr = "127.0.0.1:9090"

[logging]
level = "debug"
format = "json"

[wallet]
entropy_bits = 128
storage_prefix = "vault/users/"

[storage]
backend = "postgres"
database_url = "postgres://localhost/vault"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9090");
        assert_eq!(config.wallet.entropy_bits, EntropyBits::Bits128);
        assert_eq!(config.wallet.storage_prefix, "vault/users/");
        assert_eq!(config.wallet.max_batch_count, 100);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.storage.max_connections, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_rejects_bad_entropy() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[wallet]\nentropy_bits = 100").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("LOG_LEVEL", "warn"),
            ("WALLET_ENTROPY_BITS", "160"),
            ("WALLET_MAX_BATCH_COUNT", "20"),
            ("STORAGE_BACKEND", "Postgres"),
            ("DATABASE_URL", "postgresql://db/vault"),
            ("SKIP_MIGRATIONS", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.wallet.entropy_bits, EntropyBits::Bits160);
        assert_eq!(config.wallet.max_batch_count, 20);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(!config.storage.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_override_errors() {
        let mut config = Config::default();
        assert!(config
            .apply_overrides(|key| (key == "WALLET_ENTROPY_BITS").then(|| "129".to_string()))
            .is_err());
        assert!(config
            .apply_overrides(|key| (key == "STORAGE_BACKEND").then(|| "redis".to_string()))
            .is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.backend = StorageBackend::Postgres;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.wallet.max_batch_count = 0;
        assert!(config.validate().is_err());
    }
}
