// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Formatter;

use code::ErrorCode;
use poem::http::StatusCode;
use poem_openapi::{payload::Json, ApiResponse, Object};
use snafu::{Location, Snafu};

pub mod code;
pub mod handler;

pub const INTERNAL_ERROR_MESSAGE: &str =
    "An internal error occurred while processing the request. Please try again later.";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MailPurgeError {
    #[snafu(display("{message}"))]
    Generic {
        message: String,
        #[snafu(implicit)]
        location: Location,
        code: ErrorCode,
    },
}

pub type MailPurgeResult<T, E = MailPurgeError> = std::result::Result<T, E>;

impl MailPurgeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MailPurgeError::Generic { code, .. } => *code,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct ApiError {
    pub message: String,
    pub code: u32,
    /// Number of messages already moved to trash when a cleanup run failed midway.
    #[oai(rename = "erasedBeforeFailure", skip_serializing_if_is_none)]
    pub erased_before_failure: Option<u64>,
    /// Number of trash chunks that completed before the failing one.
    #[oai(rename = "chunksCompleted", skip_serializing_if_is_none)]
    pub chunks_completed: Option<u64>,
}

impl From<MailPurgeError> for ApiErrorResponse {
    fn from(error: MailPurgeError) -> Self {
        match error {
            MailPurgeError::Generic {
                message,
                location,
                code,
            } => {
                tracing::error!(
                    "API error occurred: [{:#?}] {} at {:?}",
                    code,
                    message,
                    location
                );
                let message = if code.is_internal() {
                    INTERNAL_ERROR_MESSAGE.to_string()
                } else {
                    message
                };
                ApiErrorResponse::Generic(code.status(), Json(ApiError::new(message, code as u32)))
            }
        }
    }
}

impl ApiError {
    pub fn new(message: String, code: u32) -> Self {
        Self {
            message,
            code,
            erased_before_failure: None,
            chunks_completed: None,
        }
    }

    pub fn new_with_error_code<ErrorType: std::fmt::Display>(
        error: ErrorType,
        code: u32,
    ) -> ApiError {
        Self::new(format!("{:#}", error), code)
    }

    pub fn with_erased_before_failure(mut self, erased: u64, chunks_completed: u64) -> Self {
        self.erased_before_failure = Some(erased);
        self.chunks_completed = Some(chunks_completed);
        self
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error({}): {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, ApiResponse)]
pub enum ApiErrorResponse {
    Generic(StatusCode, Json<ApiError>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raise_error;

    #[test]
    fn internal_errors_are_not_echoed_to_clients() {
        let error = raise_error!(
            "upstream said: {\"error\": {\"code\": 500, \"message\": \"backend\"}}".into(),
            ErrorCode::GmailApiCallFailed
        );
        let ApiErrorResponse::Generic(status, Json(body)) = ApiErrorResponse::from(error);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
        assert_eq!(body.code, ErrorCode::GmailApiCallFailed as u32);
    }

    #[test]
    fn client_errors_keep_their_message() {
        let error = raise_error!("Please sign in again.".into(), ErrorCode::AuthRequired);
        let ApiErrorResponse::Generic(status, Json(body)) = ApiErrorResponse::from(error);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "Please sign in again.");
        assert!(body.erased_before_failure.is_none());
        assert!(body.chunks_completed.is_none());
    }
}
