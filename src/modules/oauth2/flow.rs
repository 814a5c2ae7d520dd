// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::common::http::HttpClient;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailPurgeResult;
use crate::modules::settings::cli::SETTINGS;
use crate::modules::user::entity::{GoogleProfile, IssuedTokens};
use crate::{raise_error, utc_now};
use oauth2::{
    basic::{BasicClient, BasicTokenResponse},
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Identity scopes plus full Gmail access, which `batchModify` requires.
pub const GOOGLE_SCOPES: [&str; 4] = ["openid", "email", "profile", "https://mail.google.com/"];

pub type OAuth2Client = oauth2::Client<
    oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>,
    oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>,
    oauth2::StandardTokenIntrospectionResponse<
        oauth2::EmptyExtraTokenFields,
        oauth2::basic::BasicTokenType,
    >,
    oauth2::StandardRevocableToken,
    oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>,
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

#[derive(Clone, Debug)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleOAuthConfig {
    pub fn from_settings() -> Self {
        Self {
            client_id: SETTINGS.mailpurge_google_client_id.clone(),
            client_secret: SETTINGS.mailpurge_google_client_secret.clone(),
            redirect_uri: SETTINGS.mailpurge_google_redirect_uri.clone(),
            auth_url: GOOGLE_AUTH_URL.into(),
            token_url: GOOGLE_TOKEN_URL.into(),
            userinfo_url: GOOGLE_USERINFO_URL.into(),
        }
    }

    pub fn build_client(&self) -> MailPurgeResult<OAuth2Client> {
        let auth_url = AuthUrl::new(self.auth_url.clone())
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::MissingConfiguration))?;
        let token_url = TokenUrl::new(self.token_url.clone())
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::MissingConfiguration))?;
        let redirect_uri = RedirectUrl::new(self.redirect_uri.clone())
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::MissingConfiguration))?;

        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_uri);

        Ok(client)
    }
}

/// HTTP client for the token endpoint. Redirects are refused so a token response
/// can never be bounced to another host.
pub fn build_token_http_client() -> MailPurgeResult<reqwest::Client> {
    oauth2::reqwest::ClientBuilder::new()
        .redirect(oauth2::reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}

pub fn issued_tokens(response: &BasicTokenResponse) -> IssuedTokens {
    IssuedTokens {
        access_token: response.access_token().secret().to_owned(),
        expires_at: response
            .expires_in()
            .map(|ttl| utc_now!() + ttl.as_millis() as i64),
        refresh_token: response.refresh_token().map(|r| r.secret().to_owned()),
    }
}

/// What the login endpoint keeps in the session until the callback arrives.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

#[derive(Deserialize)]
struct UserInfo {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

/// Stateless Google sign-in client shared by every request.
pub struct LoginFlow {
    client: OAuth2Client,
    token_http: reqwest::Client,
    api: HttpClient,
    userinfo_url: String,
}

impl LoginFlow {
    pub fn new(config: &GoogleOAuthConfig, api: HttpClient) -> MailPurgeResult<Self> {
        Ok(Self {
            client: config.build_client()?,
            token_http: build_token_http_client()?,
            api,
            userinfo_url: config.userinfo_url.clone(),
        })
    }

    pub fn authorize_url(&self) -> AuthorizationRequest {
        let (pkce_code_challenge, pkce_code_verifier) = PkceCodeChallenge::new_random_sha256();
        let (authorize_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_code_challenge)
            .add_scopes(GOOGLE_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        AuthorizationRequest {
            url: authorize_url.to_string(),
            csrf_state: csrf_state.secret().to_owned(),
            pkce_verifier: pkce_code_verifier.secret().to_owned(),
        }
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> MailPurgeResult<IssuedTokens> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_owned()))
            .request_async(&self.token_http)
            .await
            .map_err(|e| {
                warn!("Authorization code exchange failed: {:#?}", e);
                raise_error!(
                    format!("Authorization code exchange failed: {}", e),
                    ErrorCode::HttpResponseError
                )
            })?;
        Ok(issued_tokens(&token_response))
    }

    pub async fn fetch_profile(&self, access_token: &str) -> MailPurgeResult<GoogleProfile> {
        let info: UserInfo = self.api.get_json(&self.userinfo_url, access_token).await?;
        let email = info.email.filter(|e| !e.is_empty()).ok_or_else(|| {
            raise_error!(
                "Google did not return an email address for this account.".into(),
                ErrorCode::PermissionDenied
            )
        })?;
        Ok(GoogleProfile {
            google_id: info.id,
            email,
            display_name: info.name.filter(|n| !n.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_config(base: &str) -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            redirect_uri: "http://localhost:15630/auth/google/callback".into(),
            auth_url: GOOGLE_AUTH_URL.into(),
            token_url: format!("{base}/token"),
            userinfo_url: format!("{base}/userinfo"),
        }
    }

    #[test]
    fn authorize_url_requests_offline_gmail_access() {
        let flow = LoginFlow::new(&test_config("http://127.0.0.1:1"), HttpClient::new().unwrap())
            .unwrap();
        let request = flow.authorize_url();
        let url = url::Url::parse(&request.url).unwrap();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(query["access_type"], "offline");
        assert_eq!(query["prompt"], "consent");
        assert_eq!(query["state"], request.csrf_state);
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(
            query["scope"],
            "openid email profile https://mail.google.com/"
        );
        assert!(!request.pkce_verifier.is_empty());
    }

    #[tokio::test]
    async fn exchange_code_returns_tokens_with_expiry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"ya29.new","expires_in":3599,"token_type":"Bearer","refresh_token":"1//rt"}"#,
            )
            .create_async()
            .await;

        let flow = LoginFlow::new(&test_config(&server.url()), HttpClient::new().unwrap()).unwrap();
        let before = utc_now!();
        let tokens = flow.exchange_code("auth-code", "verifier").await.unwrap();

        assert_eq!(tokens.access_token, "ya29.new");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//rt"));
        assert!(tokens.expires_at.unwrap() >= before + 3_599_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_profile_reads_userinfo() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer ya29.new")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"1082","email":"alice@example.com","name":"Alice"}"#)
            .create_async()
            .await;

        let flow = LoginFlow::new(&test_config(&server.url()), HttpClient::new().unwrap()).unwrap();
        let profile = flow.fetch_profile("ya29.new").await.unwrap();
        assert_eq!(
            profile,
            GoogleProfile {
                google_id: "1082".into(),
                email: "alice@example.com".into(),
                display_name: Some("Alice".into()),
            }
        );
    }
}
