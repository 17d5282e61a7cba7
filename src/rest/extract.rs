//! Request extractors.

use axum::extract::FromRequest;

use crate::rest::error::ApiError;

/// `Json` body extractor whose rejections render as [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
