//! Trace ID 中间件
//! 为每个请求生成或沿用 trace_id，用于全链路追踪

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

/// 调用方传入的 trace_id 最大长度，超出则重新生成
const MAX_TRACE_ID_LEN: usize = 128;

/// 请求扩展中的 trace_id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

/// Trace ID 生成器
pub struct TraceIdGenerator;

impl TraceIdGenerator {
    /// 生成新的 trace_id
    pub fn generate() -> String {
        Uuid::new_v4().to_string()
    }

    /// 从请求头中提取 trace_id，如果没有或格式不合法则生成新的
    pub fn get_or_generate(req: &Request) -> String {
        req.headers()
            .get(&TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| is_acceptable(value))
            .map(str::to_string)
            .unwrap_or_else(Self::generate)
    }
}

fn is_acceptable(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_TRACE_ID_LEN
        && value.chars().all(|c| c.is_ascii_graphic())
}

/// 为每个请求生成或提取 trace_id，写入请求扩展并回显到响应头
pub async fn trace_id_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = TraceIdGenerator::get_or_generate(&req);

    req.extensions_mut().insert(TraceId(trace_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, header_value);
    }

    response
}

/// 从请求扩展中提取 trace_id
pub fn extract_trace_id(req: &Request) -> Option<String> {
    req.extensions().get::<TraceId>().map(|id| id.0.clone())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_with(value: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header("X-Trace-Id", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_reuses_header() {
        assert_eq!(
            TraceIdGenerator::get_or_generate(&request_with(Some("abc-123"))),
            "abc-123"
        );
    }

    #[test]
    fn test_generates_when_missing_or_invalid() {
        let generated = TraceIdGenerator::get_or_generate(&request_with(None));
        assert!(Uuid::parse_str(&generated).is_ok());

        let too_long = "a".repeat(MAX_TRACE_ID_LEN + 1);
        let generated = TraceIdGenerator::get_or_generate(&request_with(Some(&too_long)));
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[test]
    fn test_extract_from_extensions() {
        let mut req = request_with(None);
        assert_eq!(extract_trace_id(&req), None);
        req.extensions_mut().insert(TraceId("t-1".to_string()));
        assert_eq!(extract_trace_id(&req).as_deref(), Some("t-1"));
    }
}
