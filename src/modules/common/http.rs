// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::{MailPurgeError, MailPurgeResult};
use crate::{mailpurge_version, raise_error};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bearer-authenticated JSON client for Google REST APIs.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> MailPurgeResult<HttpClient> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(format!("mailpurge/{}", mailpurge_version!()))
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                raise_error!(
                    format!("Failed to build HTTP client: {:#?}", e),
                    ErrorCode::InternalError
                )
            })?;
        Ok(Self { client })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> MailPurgeResult<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::NetworkError))?;
        let response = Self::check_status(url, response).await?;
        response.json::<T>().await.map_err(|e| {
            raise_error!(
                format!(
                    "Failed to deserialize response from {}: {:#?}. Possible model mismatch or API change.",
                    url, e
                ),
                ErrorCode::InternalError
            )
        })
    }

    /// POSTs a JSON body and discards the (usually empty) response body.
    pub async fn post_json(
        &self,
        url: &str,
        access_token: &str,
        payload: &serde_json::Value,
    ) -> MailPurgeResult<()> {
        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::NetworkError))?;
        Self::check_status(url, response).await?;
        Ok(())
    }

    async fn check_status(url: &str, response: reqwest::Response) -> MailPurgeResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            url = %url,
            body = %body,
            "upstream request rejected"
        );
        Err(upstream_error(status, &body))
    }
}

/// Maps a non-2xx Google API response onto an error code. The body is kept
/// only for the internal (500-class) codes, which are never echoed to clients.
pub fn upstream_error(status: StatusCode, body: &str) -> MailPurgeError {
    match status {
        StatusCode::UNAUTHORIZED => raise_error!(
            "Gmail API rejected the access token (401).".into(),
            ErrorCode::GmailApiUnauthorized
        ),
        StatusCode::FORBIDDEN => raise_error!(
            "Gmail API denied access to the mailbox (403).".into(),
            ErrorCode::GmailApiForbidden
        ),
        other => raise_error!(
            format!("Gmail API call failed with status {}: {}", other.as_u16(), body),
            ErrorCode::GmailApiCallFailed
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_classification() {
        assert_eq!(
            upstream_error(StatusCode::UNAUTHORIZED, "{}").code(),
            ErrorCode::GmailApiUnauthorized
        );
        assert_eq!(
            upstream_error(StatusCode::FORBIDDEN, "{}").code(),
            ErrorCode::GmailApiForbidden
        );
        let other = upstream_error(StatusCode::TOO_MANY_REQUESTS, "rateLimitExceeded");
        assert_eq!(other.code(), ErrorCode::GmailApiCallFailed);
        assert!(other.to_string().contains("429"));
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .match_header("authorization", "Bearer token-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let value: serde_json::Value = client
            .get_json(&format!("{}/ping", server.url()), "token-123")
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        mock.assert_async().await;
    }
}
