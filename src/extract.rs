//! Request extractors that reject with [`AppError`].
//!
//! axum's own `Json`, `Query`, `Path` and `Multipart` answer a bad request with a plain-text
//! body. These wrappers run the same extraction but turn the rejection into
//! `AppError::InvalidInput`, so every client error carries the `{"detail"}` body.

use axum::extract::{
    FromRequest, FromRequestParts, Multipart,
    rejection::{JsonRejection, PathRejection, QueryRejection},
    multipart::MultipartRejection,
};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Path segments, e.g. a malformed UUID in `/jobs/{job_id}`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// `multipart/form-data` body. A missing or wrong content type is rejected here.
#[derive(FromRequest)]
#[from_request(rejection(AppError))]
pub struct FormData(pub Multipart);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::invalid(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::invalid(rejection.body_text())
    }
}
