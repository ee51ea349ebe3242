// Centralized error handling for the tracker

use crate::bencode::response::build_error_response;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;

/// Legacy numeric status markers of the tracker protocol.
///
/// These are reused as the HTTP status of error responses and must keep their
/// exact values for client compatibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    InvalidReqType = 100,
    MissingInfoHash = 101,
    MissingPeerId = 102,
    MissingPort = 103,
    InvalidPort = 104,
    InvalidInfoHash = 150,
    InvalidPeerId = 151,
    InvalidNumWant = 152,
    BadClient = 153,
    Ok = 200,
    InfoHashNotFound = 480,
    InvalidAuth = 490,
    ClientRequestTooFast = 500,
    GenericError = 900,
    MalformedRequest = 901,
    QueryParseFail = 902,
}

impl ErrorCode {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn message(self) -> &'static str {
        message_for(self.code())
    }
}

/// Message table lookup; codes without an entry fall back to the generic error
pub fn message_for(code: u16) -> &'static str {
    match code {
        100 => "Invalid request type",
        101 => "info_hash missing from request",
        102 => "peer_id missing from request",
        103 => "port missing from request",
        104 => "Invalid port",
        150 => "Invalid info hash",
        151 => "Peer ID invalid",
        152 => "num_want invalid",
        153 => "Client not whitelisted",
        480 => "Unknown infohash",
        490 => "Invalid passkey",
        500 => "Slow down there jimmy",
        901 => "Malformed request",
        902 => "Could not parse request",
        _ => "Generic error",
    }
}

/// Errors surfaced by every `Store` driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate entry")]
    Duplicate,

    #[error("Entry not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Role is still assigned to {0} user(s)")]
    RoleInUse(usize),

    #[error("Unknown store driver: {0}")]
    UnknownDriver(String),

    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Authentication failures.
///
/// Empty, unknown and invalid passkeys are deliberately indistinguishable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid passkey")]
    InvalidAuth,
}

/// Errors that terminate an announce or scrape request
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("{}", .0.message())]
    Protocol(ErrorCode),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TrackerError {
    /// Code written to the client; store failures never leak their cause
    pub fn code(&self) -> ErrorCode {
        match self {
            TrackerError::Protocol(code) => *code,
            TrackerError::Store(_) => ErrorCode::GenericError,
        }
    }
}

impl From<ErrorCode> for TrackerError {
    fn from(code: ErrorCode) -> Self {
        TrackerError::Protocol(code)
    }
}

impl From<AuthError> for TrackerError {
    fn from(_: AuthError) -> Self {
        TrackerError::Protocol(ErrorCode::InvalidAuth)
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let code = self.code();
        if let TrackerError::Store(e) = &self {
            error!(error = %e, "Store failure while handling tracker request");
        }

        bencoded_failure(code)
    }
}

/// HTTP status carrying a legacy code.
///
/// 1xx statuses cannot terminate an HTTP exchange, so codes below 200 are
/// sent as 400; the body still names the exact failure.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code.code() {
        c if c < 200 => StatusCode::BAD_REQUEST,
        c => StatusCode::from_u16(c).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Render `{"failure reason": <message>}` with the legacy code as status
pub fn bencoded_failure(code: ErrorCode) -> Response {
    let body = build_error_response(code.message());
    let status = status_for(code);

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(body.into())
        .unwrap_or_else(|e| {
            error!(error = %e, code = code.code(), "Failed to build error response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not implemented")]
    Unimplemented,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        use crate::models::admin::ErrorResponse;

        let status = match &self {
            AdminError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AdminError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AdminError::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            AdminError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AdminError::Store(StoreError::Unauthorized) => StatusCode::NOT_FOUND,
            AdminError::Store(StoreError::Duplicate) => StatusCode::CONFLICT,
            AdminError::Store(StoreError::RoleInUse(_)) => StatusCode::CONFLICT,
            AdminError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_message_table() {
        assert_eq!(ErrorCode::InvalidAuth.message(), "Invalid passkey");
        assert_eq!(ErrorCode::MalformedRequest.message(), "Malformed request");
        assert_eq!(ErrorCode::ClientRequestTooFast.message(), "Slow down there jimmy");
        assert_eq!(ErrorCode::InfoHashNotFound.code(), 480);
    }

    #[test]
    fn test_unknown_code_falls_back_to_generic() {
        assert_eq!(message_for(200), "Generic error");
        assert_eq!(message_for(777), "Generic error");
    }

    #[test]
    fn test_store_error_maps_to_generic_code() {
        let err = TrackerError::from(StoreError::Backend("connection reset".into()));
        assert_eq!(err.code(), ErrorCode::GenericError);
    }

    #[tokio::test]
    async fn test_tracker_error_response() {
        let response = TrackerError::Protocol(ErrorCode::InvalidAuth).into_response();
        assert_eq!(response.status().as_u16(), 490);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"d14:failure reason15:Invalid passkeye");
    }

    #[test]
    fn test_status_for_codes() {
        assert_eq!(status_for(ErrorCode::InvalidAuth).as_u16(), 490);
        assert_eq!(status_for(ErrorCode::MalformedRequest).as_u16(), 901);
        assert_eq!(status_for(ErrorCode::InvalidPort), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::BadClient), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_admin_error_status() {
        let resp = AdminError::Store(StoreError::RoleInUse(2)).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AdminError::Unimplemented.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
