use axum::extract::FromRequestParts;

use crate::common::error::ApiError;

#[derive(Debug, Clone, Default, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);
