//! JSON body extractor whose rejections use the RPC error envelope

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` with malformed bodies reported as `invalid_argument`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct RpcJson<T>(pub T);
