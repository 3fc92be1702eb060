//! The success/error wrapper returned by every data-service call.
//!
//! On the wire a call answers either `{"ok": true, "data": ...}` or
//! `{"ok": false, "errorKind": "...", "message": "...", "status": 401}`.
//! In Rust the envelope is converted into `Result<T, ServiceError>` with
//! [`Envelope::into_result`] before anything reads `data`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a data-service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceErrorKind {
    /// The service rejected the input.
    BadRequest,
    /// Wrong credentials or missing token.
    Unauthorized,
    NotFound,
    /// The resource already exists (e.g. duplicate registration).
    Conflict,
    /// The service is down or timed out.
    Unavailable,
    /// The request never produced a response.
    Transport,
    /// The response could not be decoded.
    Decode,
    #[serde(other)]
    Unknown,
}

impl ServiceErrorKind {
    /// Map an HTTP status code to the closest kind.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::BadRequest,
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            409 => Self::Conflict,
            500..=599 => Self::Unavailable,
            _ => Self::Unknown,
        }
    }
}

/// A failed data-service call (`ok: false`).
///
/// `Display` yields the service's message verbatim so it can be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    /// HTTP-like status, when the failure came with one.
    pub status: Option<u16>,
    pub message: String,
}

impl ServiceError {
    #[must_use]
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Wire form of the result envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub ok: bool,
    // `default` would add a `T: Default` bound to `Deserialize`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ServiceErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl<T> Envelope<T> {
    /// `{ok: true, data}`.
    pub const fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error_kind: None,
            message: None,
            status: None,
        }
    }

    /// `{ok: false, errorKind, message, status}`.
    #[must_use]
    pub fn failure(error: ServiceError) -> Self {
        Self {
            ok: false,
            data: None,
            error_kind: Some(error.kind),
            message: Some(error.message),
            status: error.status,
        }
    }

    /// Branch on `ok` before touching `data`.
    ///
    /// # Errors
    ///
    /// Returns the envelope's error when `ok` is false, or a
    /// [`ServiceErrorKind::Decode`] error when `ok` is true but `data` is absent.
    pub fn into_result(self) -> Result<T, ServiceError> {
        self.into_result_or_else(|| None)
    }

    /// Like [`Envelope::into_result`], but substitutes `fallback` when a
    /// successful envelope carries no `data` (acknowledgement-only calls).
    ///
    /// # Errors
    ///
    /// Returns the envelope's error when `ok` is false.
    pub fn into_result_or(self, fallback: impl FnOnce() -> T) -> Result<T, ServiceError> {
        self.into_result_or_else(|| Some(fallback()))
    }

    fn into_result_or_else(
        self,
        fallback: impl FnOnce() -> Option<T>,
    ) -> Result<T, ServiceError> {
        if self.ok {
            return self.data.or_else(fallback).ok_or_else(|| {
                ServiceError::new(ServiceErrorKind::Decode, "Пустой ответ сервиса")
            });
        }

        let mut error = ServiceError::new(
            self.error_kind.unwrap_or(ServiceErrorKind::Unknown),
            self.message
                .unwrap_or_else(|| "Неизвестная ошибка".to_owned()),
        );
        error.status = self.status;
        Err(error)
    }
}

impl<T> From<Result<T, ServiceError>> for Envelope<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(error),
        }
    }
}
