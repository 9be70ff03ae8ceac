//! Request extractors whose rejections surface as `AppError::Validation`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// JSON body. A body that fails to deserialize is a validation error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string, with the same rejection mapping as `ApiJson`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
