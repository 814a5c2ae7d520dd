// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::future::Future;

use oauth2::{RefreshToken, Scope};
use tracing::{debug, info, warn};

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailPurgeResult;
use crate::modules::gmail::client::MailboxConnector;
use crate::modules::oauth2::flow::{
    build_token_http_client, issued_tokens, GoogleOAuthConfig, OAuth2Client, GOOGLE_SCOPES,
};
use crate::modules::user::entity::{IssuedTokens, UserCredential};
use crate::modules::user::store::CredentialStore;
use crate::modules::utils::mask_secret;
use crate::{raise_error, utc_now};

/// Exchanges a refresh token for a new access token.
pub trait TokenEndpoint: Send + Sync {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = MailPurgeResult<IssuedTokens>> + Send;
}

pub struct GoogleTokenEndpoint {
    client: OAuth2Client,
    http: reqwest::Client,
}

impl GoogleTokenEndpoint {
    pub fn new(config: &GoogleOAuthConfig) -> MailPurgeResult<Self> {
        Ok(Self {
            client: config.build_client()?,
            http: build_token_http_client()?,
        })
    }
}

impl TokenEndpoint for GoogleTokenEndpoint {
    async fn refresh(&self, refresh_token: &str) -> MailPurgeResult<IssuedTokens> {
        debug!(
            "Refreshing access token with refresh token {}",
            mask_secret(refresh_token)
        );
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_owned()))
            .add_scopes(GOOGLE_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                warn!("Access token refresh failed: {:#?}", e);
                raise_error!(
                    format!("Failed to retrieve refresh token response: {}", e),
                    ErrorCode::TokenRefreshFailed
                )
            })?;
        Ok(issued_tokens(&response))
    }
}

/// Turns a stored credential into a ready-to-use mailbox handle.
///
/// When no usable access token is cached, one is requested with the refresh
/// token and written to the store before the handle is built. A crash after
/// that point never loses a freshly issued token.
pub struct TokenRefreshAdapter<'a, S, T> {
    store: &'a S,
    endpoint: &'a T,
}

impl<'a, S: CredentialStore, T: TokenEndpoint> TokenRefreshAdapter<'a, S, T> {
    pub fn new(store: &'a S, endpoint: &'a T) -> Self {
        Self { store, endpoint }
    }

    pub async fn authorize<C: MailboxConnector>(
        &self,
        credential: &UserCredential,
        connector: &C,
    ) -> MailPurgeResult<C::Api> {
        let refresh_token = match credential.refresh_token.as_deref() {
            Some(token) if credential.has_refresh_token() => token,
            _ => {
                return Err(raise_error!(
                    "No refresh token is stored for this account; sign in again.".into(),
                    ErrorCode::MissingRefreshToken
                ))
            }
        };

        if let Some(access_token) = credential.usable_access_token(utc_now!()) {
            return Ok(connector.connect(access_token.to_owned()));
        }

        let issued = self.endpoint.refresh(refresh_token).await?;
        let saved = self.store.save_tokens(credential.id, issued).await?;
        let access_token = saved.access_token.ok_or_else(|| {
            raise_error!(
                "Refreshed access token was not persisted.".into(),
                ErrorCode::InternalError
            )
        })?;
        info!(user_id = credential.id, "Access token refreshed and stored");
        Ok(connector.connect(access_token))
    }
}
