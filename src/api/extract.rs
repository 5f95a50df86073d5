//! Request extractors.

use axum::extract::FromRequest;

use crate::error::ServiceError;

/// JSON body whose rejections answer with the service's `{"error"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct JsonBody<T>(pub T);
