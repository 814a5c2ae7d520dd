// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::{
    decrypt, encrypt,
    modules::{error::MailPurgeResult, utils::generate_id},
    utc_now,
};
use native_db::*;
use native_model::{native_model, Model};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Access tokens are treated as expired this long before Google says they are.
pub const EXPIRY_SKEW_MS: i64 = 60_000;

/// Identity returned by Google's userinfo endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoogleProfile {
    pub google_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Tokens handed out by the Google token endpoint, in plaintext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token: String,
    /// Absolute expiry in epoch millis, when Google reported `expires_in`.
    pub expires_at: Option<i64>,
    /// Only present when Google rotates or first grants a refresh token.
    pub refresh_token: Option<String>,
}

/// A user's OAuth credential with secrets in plaintext. Only lives in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserCredential {
    pub id: u64,
    pub google_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<i64>,
    pub refresh_token: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserCredential {
    /// Record for a first sign-in.
    pub fn create(profile: GoogleProfile, tokens: IssuedTokens) -> Self {
        let now = utc_now!();
        Self {
            id: generate_id(),
            google_id: profile.google_id,
            email: profile.email,
            display_name: profile.display_name,
            access_token: Some(tokens.access_token),
            access_token_expires_at: tokens.expires_at,
            refresh_token: tokens.refresh_token,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a later sign-in. A missing refresh token keeps the stored one.
    pub fn merge_sign_in(&self, profile: GoogleProfile, tokens: IssuedTokens) -> Self {
        let mut next = self.with_tokens(tokens);
        next.email = profile.email;
        next.display_name = profile.display_name;
        next
    }

    /// Applies freshly issued tokens without touching identity fields.
    pub fn with_tokens(&self, tokens: IssuedTokens) -> Self {
        let mut next = self.clone();
        next.access_token = Some(tokens.access_token);
        next.access_token_expires_at = tokens.expires_at;
        if let Some(refresh_token) = tokens.refresh_token.filter(|t| !t.is_empty()) {
            next.refresh_token = Some(refresh_token);
        }
        next.updated_at = utc_now!();
        next
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }

    /// The cached access token, if it exists and has not expired at `now`.
    pub fn usable_access_token(&self, now: i64) -> Option<&str> {
        let token = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        match self.access_token_expires_at {
            Some(expires_at) if expires_at - EXPIRY_SKEW_MS <= now => None,
            _ => Some(token),
        }
    }

    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            google_id: self.google_id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Persisted form of [`UserCredential`]; token fields hold AES-GCM sealed values.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredCredential {
    #[primary_key]
    pub id: u64,
    #[secondary_key(unique)]
    pub google_id: String,
    #[secondary_key(unique)]
    pub email: String,
    pub display_name: Option<String>,
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<i64>,
    pub refresh_token: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StoredCredential {
    pub fn seal(credential: &UserCredential) -> MailPurgeResult<Self> {
        Ok(Self {
            id: credential.id,
            google_id: credential.google_id.clone(),
            email: credential.email.clone(),
            display_name: credential.display_name.clone(),
            access_token: credential
                .access_token
                .as_deref()
                .map(|token| encrypt!(token))
                .transpose()?,
            access_token_expires_at: credential.access_token_expires_at,
            refresh_token: credential
                .refresh_token
                .as_deref()
                .map(|token| encrypt!(token))
                .transpose()?,
            created_at: credential.created_at,
            updated_at: credential.updated_at,
        })
    }

    pub fn open(&self) -> MailPurgeResult<UserCredential> {
        Ok(UserCredential {
            id: self.id,
            google_id: self.google_id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            access_token: self
                .access_token
                .as_deref()
                .map(|token| decrypt!(token))
                .transpose()?,
            access_token_expires_at: self.access_token_expires_at,
            refresh_token: self
                .refresh_token
                .as_deref()
                .map(|token| decrypt!(token))
                .transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// The signed-in user as exposed to the dashboard. Never carries tokens.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct CurrentUser {
    /// Internal user id, also the value kept in the session cookie.
    pub id: u64,
    /// Google account id.
    pub google_id: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}
