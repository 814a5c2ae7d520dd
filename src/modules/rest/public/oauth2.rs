// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::modules::common::session::SessionContext;
use crate::modules::error::code::ErrorCode;
use crate::modules::rest::AppState;
use crate::modules::user::store::CredentialStore;
use poem::{
    handler,
    web::{Data, Query, Redirect},
    IntoResponse, Response,
};
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Deserialize, Debug)]
pub struct GoogleCallbackParams {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

/// Reason reported to the dashboard as `?error=<kind>` when sign-in fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallbackError {
    AccessDenied,
    SessionExpired,
    StateMismatch,
    MissingCode,
    TokenExchangeFailed,
    EmailUnavailable,
    ProfileFetchFailed,
    StorageFailed,
}

impl CallbackError {
    fn kind(&self) -> &'static str {
        match self {
            CallbackError::AccessDenied => "access_denied",
            CallbackError::SessionExpired => "session_expired",
            CallbackError::StateMismatch => "state_mismatch",
            CallbackError::MissingCode => "missing_code",
            CallbackError::TokenExchangeFailed => "token_exchange_failed",
            CallbackError::EmailUnavailable => "email_unavailable",
            CallbackError::ProfileFetchFailed => "profile_fetch_failed",
            CallbackError::StorageFailed => "storage_failed",
        }
    }
}

fn dashboard_redirect(dashboard_url: &str, error: Option<CallbackError>) -> Response {
    let target = match error {
        None => dashboard_url.to_string(),
        Some(error) => url::Url::parse(dashboard_url)
            .map(|mut url| {
                url.query_pairs_mut().append_pair("error", error.kind());
                url.to_string()
            })
            .unwrap_or_else(|_| format!("{}?error={}", dashboard_url, error.kind())),
    };
    Redirect::temporary(target).into_response()
}

#[handler]
pub async fn google_login(state: Data<&Arc<AppState>>, session: SessionContext) -> Response {
    let request = state.login.authorize_url();
    session.begin_login(&request.csrf_state, &request.pkce_verifier);
    Redirect::temporary(request.url).into_response()
}

#[handler]
pub async fn google_callback(
    state: Data<&Arc<AppState>>,
    session: SessionContext,
    Query(params): Query<GoogleCallbackParams>,
) -> Response {
    match complete_sign_in(&state, &session, params).await {
        Ok(user_id) => {
            session.sign_in(user_id);
            info!(user_id, "user signed in");
            dashboard_redirect(&state.dashboard_url, None)
        }
        Err(error) => {
            warn!(kind = error.kind(), "sign-in callback rejected");
            dashboard_redirect(&state.dashboard_url, Some(error))
        }
    }
}

async fn complete_sign_in(
    state: &AppState,
    session: &SessionContext,
    params: GoogleCallbackParams,
) -> Result<u64, CallbackError> {
    // The pending login is consumed whatever happens next.
    let pending = session.take_login();

    if let Some(reason) = params.error {
        warn!(reason = %reason, "Google returned an authorization error");
        return Err(CallbackError::AccessDenied);
    }
    let (expected_state, pkce_verifier) = pending.ok_or(CallbackError::SessionExpired)?;
    if params.state.as_deref() != Some(expected_state.as_str()) {
        return Err(CallbackError::StateMismatch);
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(CallbackError::MissingCode)?;

    let tokens = state
        .login
        .exchange_code(&code, &pkce_verifier)
        .await
        .map_err(|_| CallbackError::TokenExchangeFailed)?;

    let profile = state
        .login
        .fetch_profile(&tokens.access_token)
        .await
        .map_err(|e| match e.code() {
            ErrorCode::PermissionDenied => CallbackError::EmailUnavailable,
            _ => {
                error!("Failed to fetch Google profile: {:#?}", e);
                CallbackError::ProfileFetchFailed
            }
        })?;

    if tokens.refresh_token.is_none() {
        let known = state
            .store
            .find_by_google_id(&profile.google_id)
            .await
            .map_err(|e| {
                error!("Failed to look up credential: {:#?}", e);
                CallbackError::StorageFailed
            })?;
        match known {
            Some(existing) if existing.has_refresh_token() => {
                info!(user_id = existing.id, "keeping the stored refresh token")
            }
            _ => warn!(
                google_id = %profile.google_id,
                "Google issued no refresh token and none is stored; cleanup will ask for a new sign-in"
            ),
        }
    }

    let credential = state
        .store
        .upsert_by_google_id(profile, tokens)
        .await
        .map_err(|e| {
            error!("Failed to store credential: {:#?}", e);
            CallbackError::StorageFailed
        })?;
    Ok(credential.id)
}
