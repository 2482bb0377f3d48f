//! Extractors whose rejections render as [`AppError`] JSON bodies.
//!
//! Plain `axum::Json` and `axum::extract::Path` answer rejections with a
//! plain-text body. These wrappers keep every error response in the same
//! `{"message": ...}` shape.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON body extractor. Malformed JSON is a 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor. A parameter that does not parse is a 404.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
