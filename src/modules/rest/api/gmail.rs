// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::modules::cleanup::DeleteSummary;
use crate::modules::common::session::SessionContext;
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::{ApiResult, AppState};
use crate::modules::settings::cli::SETTINGS;
use poem::web::Data;
use poem_openapi::param::Query;
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};

#[derive(Debug, Clone, Object)]
pub struct MessagePreview {
    /// Gmail message ids from the first page of the mailbox.
    pub ids: Vec<String>,
    pub count: u32,
}

pub struct GmailApi;

#[OpenApi(prefix_path = "/api/v2/gmail", tag = "ApiTags::Gmail")]
impl GmailApi {
    /// Moves every message in the signed-in user's mailbox to the trash.
    ///
    /// Messages are trashed in chunks of up to 1000. The run is not atomic: if a
    /// chunk fails, earlier chunks stay trashed and the error body reports
    /// `erasedBeforeFailure` and `chunksCompleted`. Running it on an empty
    /// mailbox succeeds with `deletedCount` 0.
    #[oai(
        method = "post",
        path = "/delete-all-messages",
        operation_id = "delete_all_messages"
    )]
    async fn delete_all_messages(
        &self,
        state: Data<&Arc<AppState>>,
        session: SessionContext,
    ) -> ApiResult<Json<DeleteSummary>> {
        let summary = state.cleanup().run(session.user_id()).await?;
        Ok(Json(summary))
    }

    /// Lists the first page of message ids without modifying anything.
    #[oai(method = "get", path = "/list-messages", operation_id = "list_messages")]
    async fn list_messages(
        &self,
        state: Data<&Arc<AppState>>,
        session: SessionContext,
        /// Page size, clamped to 1..=500. Defaults to the configured preview limit.
        max_results: Query<Option<u32>>,
    ) -> ApiResult<Json<MessagePreview>> {
        let max_results = max_results
            .0
            .unwrap_or(SETTINGS.mailpurge_list_preview_limit);
        let ids = state
            .cleanup()
            .preview(session.user_id(), max_results)
            .await?;
        Ok(Json(MessagePreview {
            count: ids.len() as u32,
            ids,
        }))
    }
}
