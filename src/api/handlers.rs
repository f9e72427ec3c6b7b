//! HTTP 处理器
//!
//! 字段名为 camelCase（`uuid`、`coinType`、`isDev` ...），
//! 未知字段一律拒绝（422）。

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    api::{
        middleware::{extract_trace_id, TraceId},
        response::{success_response, ApiResponse},
    },
    app_state::AppState,
    domain::SecretString,
    error::AppError,
    service::{
        AddressBatchRequest, AddressRequest, EngineInfo, RegisterRequest, RequestContext,
        SignRequest,
    },
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 请求体提取器
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// JSON 请求体；解析失败（语法、类型、未知字段、Content-Type）统一返回 422
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let trace_id = extract_trace_id(&req);
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let err = AppError::unprocessable(rejection.body_text());
                Err(match trace_id {
                    Some(id) => err.with_trace_id(id),
                    None => err,
                })
            }
        }
    }
}

fn context(trace_id: &TraceId, operation: &'static str) -> RequestContext {
    RequestContext::new(trace_id.0.clone(), operation)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DTO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterReq {
    pub uuid: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub mnemonic: SecretString,
    #[serde(default)]
    pub passphrase: SecretString,
}

#[derive(Debug, Serialize)]
pub struct RegisterResp {
    pub uuid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignReq {
    pub uuid: String,
    pub path: String,
    pub coin_type: u32,
    pub payload: String,
    #[serde(default)]
    pub is_dev: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResp {
    /// 有完整交易时为签名后的交易，否则为第一个签名
    pub signature: String,
    pub signatures: Vec<String>,
    pub signed_transaction: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddressReq {
    pub uuid: String,
    pub path: String,
    pub coin_type: u32,
    #[serde(default)]
    pub is_dev: bool,
}

#[derive(Debug, Serialize)]
pub struct AddressResp {
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddressBatchReq {
    pub uuid: String,
    pub path_template: String,
    pub coin_type: u32,
    #[serde(default)]
    pub start_index: u32,
    pub count: u32,
    #[serde(default)]
    pub is_dev: bool,
}

#[derive(Debug, Serialize)]
pub struct AddressBatchResp {
    pub addresses: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
    pub storage_ok: bool,
    pub version: &'static str,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 处理器
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn register(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    ValidJson(req): ValidJson<RegisterReq>,
) -> ApiResult<RegisterResp> {
    let request = RegisterRequest {
        id: req.uuid,
        username: req.username,
        mnemonic: req.mnemonic,
        passphrase: req.passphrase,
    };
    let uuid = st
        .engine
        .register(&context(&trace_id, "register"), request)
        .await
        .map_err(|e| AppError::from(e).with_trace_id(trace_id.0.clone()))?;
    success_response(RegisterResp { uuid })
}

pub async fn sign(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    ValidJson(req): ValidJson<SignReq>,
) -> ApiResult<SignResp> {
    let request = SignRequest {
        id: req.uuid,
        path: req.path,
        coin_type: req.coin_type,
        payload: req.payload,
        is_dev: req.is_dev,
    };
    let signed = st
        .engine
        .sign(&context(&trace_id, "sign"), request)
        .await
        .map_err(|e| AppError::from(e).with_trace_id(trace_id.0.clone()))?;

    let signature = signed.primary().unwrap_or_default().to_string();
    success_response(SignResp {
        signature,
        signatures: signed.signatures,
        signed_transaction: signed.signed_transaction,
    })
}

pub async fn address(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    ValidJson(req): ValidJson<AddressReq>,
) -> ApiResult<AddressResp> {
    let request = AddressRequest {
        id: req.uuid,
        path: req.path,
        coin_type: req.coin_type,
        is_dev: req.is_dev,
    };
    let address = st
        .engine
        .address(&context(&trace_id, "address"), request)
        .await
        .map_err(|e| AppError::from(e).with_trace_id(trace_id.0.clone()))?;
    success_response(AddressResp { address })
}

pub async fn address_batch(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    ValidJson(req): ValidJson<AddressBatchReq>,
) -> ApiResult<AddressBatchResp> {
    let request = AddressBatchRequest {
        id: req.uuid,
        path_template: req.path_template,
        coin_type: req.coin_type,
        start_index: req.start_index,
        count: req.count,
        is_dev: req.is_dev,
    };
    let addresses = st
        .engine
        .address_batch(&context(&trace_id, "address_batch"), request)
        .await
        .map_err(|e| AppError::from(e).with_trace_id(trace_id.0.clone()))?;
    success_response(AddressBatchResp { addresses })
}

pub async fn info(State(st): State<Arc<AppState>>) -> ApiResult<EngineInfo> {
    success_response(st.engine.info())
}

pub async fn healthz(State(st): State<Arc<AppState>>) -> ApiResult<Healthz> {
    let storage_ok = match &st.pool {
        Some(pool) => crate::infrastructure::db::health_check(pool).await.is_ok(),
        None => true,
    };
    success_response(Healthz {
        status: if storage_ok { "ok" } else { "degraded" },
        storage_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}
