use axum::extract::{rejection::JsonRejection, FromRequest};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JSON request message. Malformed bodies surface as `INVALID_ARGUMENT`
/// instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct RpcJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

/// Message with no fields.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Empty {}
