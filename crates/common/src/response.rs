//! Response envelopes shared by every handler
//!
//! Success bodies are `{message, data}`; list bodies add `meta.total`;
//! acknowledgements carry only `{message}`.

use serde::Serialize;

/// Single-item success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Paging metadata for list envelopes
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ListMeta {
    pub total: i64,
}

/// Multi-item success envelope
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub message: String,
    pub data: Vec<T>,
    pub meta: ListMeta,
}

impl<T> ListResponse<T> {
    pub fn new(message: impl Into<String>, data: Vec<T>, total: i64) -> Self {
        Self {
            message: message.into(),
            data,
            meta: ListMeta { total },
        }
    }
}

/// Body-less acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
