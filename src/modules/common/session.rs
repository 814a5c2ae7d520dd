// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use poem::{
    session::{CookieConfig, CookieSession, Session},
    web::cookie::{CookieKey, SameSite},
    FromRequest, Request, RequestBody, Result,
};
use ring::digest;

use crate::modules::{error::code::ErrorCode, settings::cli::SETTINGS};

use super::create_api_error_response;

pub const SESSION_COOKIE_NAME: &str = "mailpurge.sid";
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const USER_ID_KEY: &str = "user_id";
const OAUTH_STATE_KEY: &str = "oauth_state";
const OAUTH_PKCE_KEY: &str = "oauth_pkce";

/// Signing key for the session cookie, stretched to the 64 bytes poem requires.
fn cookie_key(secret: &str) -> CookieKey {
    let digest = digest::digest(&digest::SHA512, secret.as_bytes());
    CookieKey::from(digest.as_ref())
}

pub fn cookie_session(secret: &str, secure: bool) -> CookieSession {
    CookieSession::new(
        CookieConfig::signed(cookie_key(secret))
            .name(SESSION_COOKIE_NAME)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(SESSION_TTL),
    )
}

pub fn session_middleware() -> CookieSession {
    cookie_session(
        &SETTINGS.mailpurge_session_secret,
        SETTINGS.mailpurge_secure_cookie,
    )
}

/// Typed view over the cookie session.
#[derive(Clone)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn user_id(&self) -> Option<u64> {
        self.session.get::<u64>(USER_ID_KEY)
    }

    pub fn sign_in(&self, user_id: u64) {
        self.session.remove(OAUTH_STATE_KEY);
        self.session.remove(OAUTH_PKCE_KEY);
        self.session.set(USER_ID_KEY, user_id);
    }

    pub fn begin_login(&self, csrf_state: &str, pkce_verifier: &str) {
        self.session.set(OAUTH_STATE_KEY, csrf_state);
        self.session.set(OAUTH_PKCE_KEY, pkce_verifier);
    }

    /// Takes the pending login out of the session; a state can only be used once.
    pub fn take_login(&self) -> Option<(String, String)> {
        let state = self.session.get::<String>(OAUTH_STATE_KEY);
        let verifier = self.session.get::<String>(OAUTH_PKCE_KEY);
        self.session.remove(OAUTH_STATE_KEY);
        self.session.remove(OAUTH_PKCE_KEY);
        state.zip(verifier)
    }

    pub fn purge(&self) {
        self.session.purge();
    }
}

impl<'a> FromRequest<'a> for SessionContext {
    async fn from_request(req: &'a Request, _body: &mut RequestBody) -> Result<Self> {
        let session = req.extensions().get::<Session>().cloned().ok_or_else(|| {
            create_api_error_response(
                "Session middleware is not installed",
                ErrorCode::InternalError,
            )
        })?;
        Ok(Self { session })
    }
}
