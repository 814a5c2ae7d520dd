// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::future::Future;

use serde_json::json;
use url::Url;

use crate::{
    modules::{
        common::http::HttpClient,
        error::{code::ErrorCode, MailPurgeResult},
        gmail::model::MessageList,
    },
    raise_error,
};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
pub const TRASH_LABEL: &str = "TRASH";

/// The two Gmail calls the cleanup workflow needs, bound to one user's access token.
pub trait MailboxApi: Send + Sync {
    fn list_messages(
        &self,
        page_token: Option<&str>,
        max_results: u32,
    ) -> impl Future<Output = MailPurgeResult<MessageList>> + Send;

    /// Moves every id in `ids` to the trash in a single request.
    fn batch_trash(&self, ids: &[String]) -> impl Future<Output = MailPurgeResult<()>> + Send;
}

/// Builds a per-user [`MailboxApi`] from an access token.
pub trait MailboxConnector: Send + Sync {
    type Api: MailboxApi;

    fn connect(&self, access_token: String) -> Self::Api;
}

#[derive(Clone)]
pub struct GmailConnector {
    http: HttpClient,
    base_url: String,
}

impl GmailConnector {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, GMAIL_API_BASE)
    }

    pub fn with_base_url(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl MailboxConnector for GmailConnector {
    type Api = GmailClient;

    fn connect(&self, access_token: String) -> GmailClient {
        GmailClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            access_token,
        }
    }
}

pub struct GmailClient {
    http: HttpClient,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    fn list_url(&self, page_token: Option<&str>, max_results: u32) -> MailPurgeResult<Url> {
        let mut url = Url::parse(&format!("{}/messages", self.base_url))
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("maxResults", &max_results.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }
}

impl MailboxApi for GmailClient {
    async fn list_messages(
        &self,
        page_token: Option<&str>,
        max_results: u32,
    ) -> MailPurgeResult<MessageList> {
        let url = self.list_url(page_token, max_results)?;
        self.http.get_json(url.as_str(), &self.access_token).await
    }

    async fn batch_trash(&self, ids: &[String]) -> MailPurgeResult<()> {
        let url = format!("{}/messages/batchModify", self.base_url);
        let body = json!({
            "ids": ids,
            "addLabelIds": [TRASH_LABEL],
        });
        self.http.post_json(&url, &self.access_token, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn connector(server: &mockito::Server) -> GmailConnector {
        GmailConnector::with_base_url(HttpClient::new().unwrap(), server.url())
    }

    #[tokio::test]
    async fn list_messages_sends_paging_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/messages")
            .match_header("authorization", "Bearer at-1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("maxResults".into(), "500".into()),
                Matcher::UrlEncoded("pageToken".into(), "next page".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages":[{"id":"m1","threadId":"t1"}],"resultSizeEstimate":1}"#)
            .create_async()
            .await;

        let page = connector(&server)
            .connect("at-1".into())
            .list_messages(Some("next page"), 500)
            .await
            .unwrap();
        assert_eq!(page.ids().collect::<Vec<_>>(), vec!["m1"]);
        assert_eq!(page.continuation(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn batch_trash_posts_ids_with_trash_label() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages/batchModify")
            .match_body(Matcher::Json(json!({
                "ids": ["m1", "m2"],
                "addLabelIds": ["TRASH"],
            })))
            .with_status(204)
            .create_async()
            .await;

        connector(&server)
            .connect("at-1".into())
            .batch_trash(&["m1".to_string(), "m2".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_statuses_map_to_error_codes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/messages")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":{"code":403,"message":"Insufficient Permission"}}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/messages/batchModify")
            .with_status(401)
            .with_body(r#"{"error":{"code":401}}"#)
            .create_async()
            .await;

        let client = connector(&server).connect("at-1".into());
        let err = client.list_messages(None, 10).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::GmailApiForbidden);
        assert!(!err.to_string().contains("Insufficient Permission"));

        let err = client.batch_trash(&["m1".to_string()]).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::GmailApiUnauthorized);
    }
}
