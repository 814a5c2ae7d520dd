// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use super::error::code::ErrorCode;
use super::error::{MailPurgeError, INTERNAL_ERROR_MESSAGE};
use poem::error::ResponseError;
use poem::Body;
use poem::{http::StatusCode, Error, Response};
use tracing::error;

pub mod error;
pub mod http;
pub mod log;
pub mod session;

#[inline]
fn create_mailpurge_error(message: &str, code: ErrorCode) -> MailPurgeError {
    MailPurgeError::Generic {
        message: message.into(),
        location: snafu::Location::default(),
        code,
    }
}

#[inline]
pub fn create_api_error_response(message: &str, code: ErrorCode) -> Error {
    create_mailpurge_error(message, code).into()
}

impl ResponseError for MailPurgeError {
    fn status(&self) -> StatusCode {
        self.code().status()
    }

    fn as_response(&self) -> Response
    where
        Self: std::error::Error + Send + Sync + 'static,
    {
        match self {
            MailPurgeError::Generic {
                message,
                location,
                code,
            } => {
                error!(
                    error_code = *code as u32,
                    error_message = %message,
                    error_location = ?location
                );
                let message = if code.is_internal() {
                    INTERNAL_ERROR_MESSAGE
                } else {
                    message.as_str()
                };
                Response::builder()
                    .status(self.status())
                    .body(Body::from_json(serde_json::json!({
                        "code": *code as u32,
                        "message": message,
                    }))
                    .unwrap_or_default())
            }
        }
    }
}
