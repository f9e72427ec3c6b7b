//! 钱包引擎：注册 / 签名 / 地址 / 批量地址 / 信息
//!
//! 引擎本身无状态，全部持久化状态都在 [`UserRecordAdapter`] 后面。
//! 种子和私钥只在单次调用内存在，调用结束即被擦除。

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::WalletConfig;
use crate::domain::{
    derive_seed, expand_template, AddressEncoder, CoinParams, CoinRegistry, DerivationPath,
    KeyDeriver, Keypair, MnemonicService, NetworkMode, SecretString, SignedPayload,
    TransactionSigner, UserRecord,
};
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::log_redact::{redact_address, redact_id};
use crate::repository::UserRecordAdapter;

/// 用户 id 最大长度
const MAX_ID_LEN: usize = 128;

/// 请求上下文，由调用面显式传入
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: String,
    pub operation: &'static str,
}

impl RequestContext {
    pub fn new(trace_id: impl Into<String>, operation: &'static str) -> Self {
        Self {
            trace_id: trace_id.into(),
            operation,
        }
    }

    /// 调用面没有 trace id 时生成一个
    pub fn generated(operation: &'static str) -> Self {
        Self::new(Uuid::new_v4().to_string(), operation)
    }

    fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "wallet_engine",
            trace_id = %self.trace_id,
            operation = self.operation
        )
    }
}

// ============ 请求结构 ============

#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub id: Option<String>,
    pub username: Option<String>,
    /// 为空时自动生成
    pub mnemonic: SecretString,
    pub passphrase: SecretString,
}

#[derive(Debug, Clone)]
pub struct SignRequest {
    pub id: String,
    pub path: String,
    pub coin_type: u32,
    pub payload: String,
    pub is_dev: bool,
}

#[derive(Debug, Clone)]
pub struct AddressRequest {
    pub id: String,
    pub path: String,
    pub coin_type: u32,
    pub is_dev: bool,
}

#[derive(Debug, Clone)]
pub struct AddressBatchRequest {
    pub id: String,
    pub path_template: String,
    pub coin_type: u32,
    pub start_index: u32,
    pub count: u32,
    pub is_dev: bool,
}

/// 服务描述与支持的币种表
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub coins: Vec<&'static CoinParams>,
}

// ============ 引擎 ============

pub struct WalletEngine {
    store: Arc<dyn UserRecordAdapter>,
    config: WalletConfig,
}

impl WalletEngine {
    pub fn new(store: Arc<dyn UserRecordAdapter>, config: WalletConfig) -> Self {
        Self { store, config }
    }

    /// 注册用户
    ///
    /// 助记词为空时按配置的熵长度生成；非空时校验并规范化，无效返回 `Crypto`。
    /// 写入使用 `create_if_absent`，并发注册同一 id 只有一个成功。
    pub async fn register(&self, ctx: &RequestContext, request: RegisterRequest) -> WalletResult<String> {
        self.register_inner(request).instrument(ctx.span()).await
    }

    /// 签名原始交易 payload
    pub async fn sign(&self, ctx: &RequestContext, request: SignRequest) -> WalletResult<SignedPayload> {
        self.sign_inner(request).instrument(ctx.span()).await
    }

    /// 单个地址
    pub async fn address(&self, ctx: &RequestContext, request: AddressRequest) -> WalletResult<String> {
        self.address_inner(request).instrument(ctx.span()).await
    }

    /// 批量地址：模板按 `start_index..start_index + count` 展开，结果保持升序
    ///
    /// 任一索引失败则整个批次失败，不返回部分结果。
    pub async fn address_batch(
        &self,
        ctx: &RequestContext,
        request: AddressBatchRequest,
    ) -> WalletResult<Vec<String>> {
        self.address_batch_inner(request).instrument(ctx.span()).await
    }

    /// 服务信息
    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            coins: CoinRegistry::list(),
        }
    }

    /// 已注册用户 id（升序）
    pub async fn list_users(&self) -> WalletResult<Vec<String>> {
        self.store.list(&self.config.storage_prefix).await
    }

    async fn register_inner(&self, request: RegisterRequest) -> WalletResult<String> {
        let id = match request.id {
            Some(id) => {
                validate_id(&id)?;
                id
            }
            None => Uuid::new_v4().to_string(),
        };

        let mnemonic = if request.mnemonic.is_empty() {
            MnemonicService::generate(self.config.entropy_bits)?
        } else {
            MnemonicService::normalize(request.mnemonic.expose())?
        };

        let record = UserRecord {
            id: id.clone(),
            username: request.username.filter(|name| !name.is_empty()),
            mnemonic,
            passphrase: request.passphrase,
            created_at: Utc::now(),
        };

        let created = self
            .store
            .create_if_absent(&self.storage_key(&id), &record)
            .await?;
        if !created {
            tracing::warn!(user = %redact_id(&id), "register rejected, id already exists");
            return Err(WalletError::Duplicate(format!("user {} already exists", id)));
        }

        tracing::info!(user = %redact_id(&id), "user registered");
        Ok(id)
    }

    async fn sign_inner(&self, request: SignRequest) -> WalletResult<SignedPayload> {
        validate_id(&request.id)?;
        if request.payload.trim().is_empty() {
            return Err(WalletError::validation("payload must not be empty"));
        }
        let params = resolve_coin(request.coin_type, request.is_dev)?;
        let path = DerivationPath::parse(&request.path)?;

        let record = self.load(&request.id).await?;
        let keypair = derive_keypair(&record, &path, params)?;
        let signed = TransactionSigner::sign(&request.payload, &keypair, params)?;

        tracing::info!(
            user = %redact_id(&request.id),
            coin = params.symbol,
            path = %path,
            signatures = signed.signatures.len(),
            "payload signed"
        );
        Ok(signed)
    }

    async fn address_inner(&self, request: AddressRequest) -> WalletResult<String> {
        validate_id(&request.id)?;
        let params = resolve_coin(request.coin_type, request.is_dev)?;
        let path = DerivationPath::parse(&request.path)?;

        let record = self.load(&request.id).await?;
        let keypair = derive_keypair(&record, &path, params)?;
        let address = AddressEncoder::encode(&keypair.public_key, params)?;

        tracing::info!(
            user = %redact_id(&request.id),
            coin = params.symbol,
            path = %path,
            address = %redact_address(&address),
            "address derived"
        );
        Ok(address)
    }

    async fn address_batch_inner(&self, request: AddressBatchRequest) -> WalletResult<Vec<String>> {
        validate_id(&request.id)?;
        let params = resolve_coin(request.coin_type, request.is_dev)?;
        let paths = expand_template(
            &request.path_template,
            request.start_index,
            request.count,
            self.config.max_batch_count,
        )?;

        let record = self.load(&request.id).await?;
        let seed = derive_seed(&record.mnemonic, &record.passphrase)?;
        let keypairs = KeyDeriver::derive_batch(seed.as_bytes(), &paths, params.curve)?;
        drop(seed);

        let addresses = keypairs
            .iter()
            .map(|keypair| AddressEncoder::encode(&keypair.public_key, params))
            .collect::<WalletResult<Vec<_>>>()?;

        tracing::info!(
            user = %redact_id(&request.id),
            coin = params.symbol,
            start = request.start_index,
            count = addresses.len(),
            "address batch derived"
        );
        Ok(addresses)
    }

    fn storage_key(&self, id: &str) -> String {
        format!("{}{}", self.config.storage_prefix, id)
    }

    async fn load(&self, id: &str) -> WalletResult<UserRecord> {
        self.store
            .get(&self.storage_key(id))
            .await?
            .ok_or_else(|| WalletError::NotFound(format!("user {} not found", id)))
    }
}

fn resolve_coin(coin_type: u32, is_dev: bool) -> WalletResult<&'static CoinParams> {
    CoinRegistry::lookup(coin_type, NetworkMode::from_is_dev(is_dev))
}

fn derive_keypair(record: &UserRecord, path: &DerivationPath, params: &CoinParams) -> WalletResult<Keypair> {
    let seed = derive_seed(&record.mnemonic, &record.passphrase)?;
    KeyDeriver::derive(seed.as_bytes(), path, params.curve)
}

/// id 作为存储键后缀，不能为空，不能含 `/` 或空白
fn validate_id(id: &str) -> WalletResult<()> {
    if id.is_empty() {
        return Err(WalletError::validation("uuid must not be empty"));
    }
    if id.len() > MAX_ID_LEN {
        return Err(WalletError::validation(format!(
            "uuid must be at most {} bytes",
            MAX_ID_LEN
        )));
    }
    if id.chars().any(|c| c == '/' || c.is_whitespace() || c.is_control()) {
        return Err(WalletError::validation(
            "uuid must not contain '/' or whitespace",
        ));
    }
    Ok(())
}
