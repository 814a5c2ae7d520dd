// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::modules::common::session::SessionContext;
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::{ApiResult, AppState};
use crate::modules::user::entity::CurrentUser;
use crate::modules::user::store::CredentialStore;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};

#[derive(Debug, Clone, Object)]
pub struct LogoutResult {
    pub success: bool,
}

pub struct UserApi;

#[OpenApi(prefix_path = "/api", tag = "ApiTags::User")]
impl UserApi {
    /// Returns the signed-in user, or `null` when the request carries no session.
    ///
    /// Tokens are never part of the response.
    #[oai(method = "get", path = "/current_user", operation_id = "current_user")]
    async fn current_user(
        &self,
        state: Data<&Arc<AppState>>,
        session: SessionContext,
    ) -> ApiResult<Json<Option<CurrentUser>>> {
        let Some(user_id) = session.user_id() else {
            return Ok(Json(None));
        };
        let credential = state.store.get(user_id).await?;
        Ok(Json(credential.map(|c| c.current_user())))
    }

    /// Ends the session.
    #[oai(method = "get", path = "/logout", operation_id = "logout")]
    async fn logout(&self, session: SessionContext) -> Json<LogoutResult> {
        session.purge();
        Json(LogoutResult { success: true })
    }
}
