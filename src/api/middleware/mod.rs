pub mod trace_id;

pub use trace_id::{extract_trace_id, trace_id_middleware, TraceId, TraceIdGenerator, TRACE_ID_HEADER};
