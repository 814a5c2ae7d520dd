// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem::http::StatusCode;
use poem_openapi::Enum;

#[derive(Copy, Clone, Debug, Enum, Eq, PartialEq)]
#[repr(u32)]
pub enum ErrorCode {
    // Client-side errors (10000–10999)
    InvalidParameter = 10000,
    MissingConfiguration = 10020,
    MethodNotAllowed = 10090,

    // Authentication and authorization errors (20000–20999)
    AuthRequired = 20000,
    PermissionDenied = 20010,
    MissingRefreshToken = 20060,
    TokenRefreshFailed = 20070,

    // Resource errors (30000–30999)
    ResourceNotFound = 30000,

    // Network connection errors (40000–40999)
    NetworkError = 40000,
    HttpResponseError = 40030,

    // Mail provider errors (50000–50999)
    GmailApiCallFailed = 50070,
    GmailApiUnauthorized = 50090,
    GmailApiForbidden = 50100,

    // Internal system errors (70000–70999)
    InternalError = 70000,
    UnhandledPoemError = 70010,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidParameter | ErrorCode::MissingConfiguration => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::AuthRequired
            | ErrorCode::MissingRefreshToken
            | ErrorCode::TokenRefreshFailed
            | ErrorCode::GmailApiUnauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::PermissionDenied | ErrorCode::GmailApiForbidden => StatusCode::FORBIDDEN,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::NetworkError
            | ErrorCode::HttpResponseError
            | ErrorCode::GmailApiCallFailed
            | ErrorCode::InternalError
            | ErrorCode::UnhandledPoemError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Codes whose message may carry upstream payloads and must not reach the client.
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use poem::http::StatusCode;

    #[test]
    fn auth_codes_map_to_401() {
        for code in [
            ErrorCode::AuthRequired,
            ErrorCode::MissingRefreshToken,
            ErrorCode::TokenRefreshFailed,
            ErrorCode::GmailApiUnauthorized,
        ] {
            assert_eq!(code.status(), StatusCode::UNAUTHORIZED, "{:?}", code);
        }
    }

    #[test]
    fn upstream_forbidden_maps_to_403() {
        assert_eq!(ErrorCode::GmailApiForbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::PermissionDenied.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unclassified_failures_are_internal() {
        assert!(ErrorCode::GmailApiCallFailed.is_internal());
        assert!(ErrorCode::NetworkError.is_internal());
        assert!(!ErrorCode::AuthRequired.is_internal());
        assert!(!ErrorCode::InvalidParameter.is_internal());
    }
}
