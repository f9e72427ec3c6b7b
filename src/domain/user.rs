//! 托管用户记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::secret::SecretString;

/// 用户记录：注册时一次性整体写入，此后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// 不透明、唯一、稳定的标识符
    pub id: String,
    /// 仅用于展示
    #[serde(default)]
    pub username: Option<String>,
    pub mnemonic: SecretString,
    #[serde(default)]
    pub passphrase: SecretString,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secrets() {
        let record = UserRecord {
            id: "u-1".into(),
            username: Some("alice".into()),
            mnemonic: "abandon about".into(),
            passphrase: "hunter2".into(),
            created_at: Utc::now(),
        };
        let debug = format!("{:?}", record);
        assert!(!debug.contains("abandon"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("u-1"));
    }

    #[test]
    fn test_json_roundtrip_keeps_fields() {
        let json = r#"{"id":"u-2","mnemonic":"abandon about","created_at":"2024-01-01T00:00:00Z"}"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.username, None);
        assert!(record.passphrase.is_empty());
        assert_eq!(record.mnemonic.expose(), "abandon about");
    }
}
