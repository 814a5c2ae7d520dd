// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::future::Future;
use std::sync::Arc;

use native_db::Database;

use crate::modules::database::{
    async_find_impl, secondary_find_impl, update_impl, upsert_with_impl,
};
use crate::modules::error::{code::ErrorCode, MailPurgeResult};
use crate::modules::user::entity::{
    GoogleProfile, IssuedTokens, StoredCredential, StoredCredentialKey, UserCredential,
};
use crate::raise_error;

/// Persistence for per-user OAuth credentials. Writes are last-write-wins.
pub trait CredentialStore: Send + Sync {
    fn get(&self, id: u64) -> impl Future<Output = MailPurgeResult<Option<UserCredential>>> + Send;

    fn find_by_google_id(
        &self,
        google_id: &str,
    ) -> impl Future<Output = MailPurgeResult<Option<UserCredential>>> + Send;

    /// Creates the record on first sign-in, otherwise refreshes identity and tokens.
    fn upsert_by_google_id(
        &self,
        profile: GoogleProfile,
        tokens: IssuedTokens,
    ) -> impl Future<Output = MailPurgeResult<UserCredential>> + Send;

    /// Stores tokens obtained from a refresh. Returns the updated record.
    fn save_tokens(
        &self,
        id: u64,
        tokens: IssuedTokens,
    ) -> impl Future<Output = MailPurgeResult<UserCredential>> + Send;
}

/// `native_db` backed store. Token fields are sealed before they reach disk.
#[derive(Clone)]
pub struct NativeCredentialStore {
    database: Arc<Database<'static>>,
}

impl NativeCredentialStore {
    pub fn new(database: Arc<Database<'static>>) -> Self {
        Self { database }
    }
}

impl CredentialStore for NativeCredentialStore {
    async fn get(&self, id: u64) -> MailPurgeResult<Option<UserCredential>> {
        async_find_impl::<StoredCredential>(&self.database, id)
            .await?
            .map(|stored| stored.open())
            .transpose()
    }

    async fn find_by_google_id(&self, google_id: &str) -> MailPurgeResult<Option<UserCredential>> {
        secondary_find_impl::<StoredCredential>(
            &self.database,
            StoredCredentialKey::google_id,
            google_id.to_string(),
        )
        .await?
        .map(|stored| stored.open())
        .transpose()
    }

    async fn upsert_by_google_id(
        &self,
        profile: GoogleProfile,
        tokens: IssuedTokens,
    ) -> MailPurgeResult<UserCredential> {
        let google_id = profile.google_id.clone();
        let stored = upsert_with_impl(
            &self.database,
            move |rw| {
                rw.get()
                    .secondary::<StoredCredential>(StoredCredentialKey::google_id, google_id)
                    .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
            },
            move |current| match current {
                Some(stored) => StoredCredential::seal(&stored.open()?.merge_sign_in(profile, tokens)),
                None => StoredCredential::seal(&UserCredential::create(profile, tokens)),
            },
        )
        .await?;
        stored.open()
    }

    async fn save_tokens(&self, id: u64, tokens: IssuedTokens) -> MailPurgeResult<UserCredential> {
        update_impl(
            &self.database,
            move |rw| {
                rw.get()
                    .primary::<StoredCredential>(id)
                    .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
                    .ok_or_else(|| {
                        raise_error!(
                            format!("The credential with id={id} that you want to update was not found."),
                            ErrorCode::ResourceNotFound
                        )
                    })
            },
            move |current| StoredCredential::seal(&current.open()?.with_tokens(tokens)),
        )
        .await?;

        self.get(id).await?.ok_or_else(|| {
            raise_error!(
                format!("The credential with id={id} disappeared after update."),
                ErrorCode::InternalError
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::database::manager::{DatabaseLocation, DatabaseManager};

    fn memory_store() -> NativeCredentialStore {
        let manager = DatabaseManager::open(&DatabaseLocation::Memory).unwrap();
        NativeCredentialStore::new(manager.meta_db().clone())
    }

    fn profile(google_id: &str, email: &str) -> GoogleProfile {
        GoogleProfile {
            google_id: google_id.into(),
            email: email.into(),
            display_name: None,
        }
    }

    fn tokens(access: &str, refresh: Option<&str>) -> IssuedTokens {
        IssuedTokens {
            access_token: access.into(),
            expires_at: None,
            refresh_token: refresh.map(Into::into),
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_same_record() {
        let store = memory_store();
        let first = store
            .upsert_by_google_id(profile("g-1", "a@example.com"), tokens("at-1", Some("rt-1")))
            .await
            .unwrap();
        let second = store
            .upsert_by_google_id(profile("g-1", "a@example.com"), tokens("at-2", None))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.access_token.as_deref(), Some("at-2"));
        assert_eq!(second.refresh_token.as_deref(), Some("rt-1"));

        let loaded = store.find_by_google_id("g-1").await.unwrap().unwrap();
        assert_eq!(loaded, second);
        assert_eq!(store.get(first.id).await.unwrap().unwrap(), second);
    }

    #[tokio::test]
    async fn save_tokens_persists_refresh_result() {
        let store = memory_store();
        let created = store
            .upsert_by_google_id(profile("g-2", "b@example.com"), tokens("old", Some("rt")))
            .await
            .unwrap();
        let saved = store
            .save_tokens(
                created.id,
                IssuedTokens {
                    access_token: "new".into(),
                    expires_at: Some(42),
                    refresh_token: Some("rt-rotated".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.access_token.as_deref(), Some("new"));
        assert_eq!(saved.access_token_expires_at, Some(42));
        assert_eq!(saved.refresh_token.as_deref(), Some("rt-rotated"));
        assert_eq!(store.get(created.id).await.unwrap().unwrap(), saved);
    }

    #[tokio::test]
    async fn unknown_ids_resolve_to_none_or_not_found() {
        let store = memory_store();
        assert!(store.get(7).await.unwrap().is_none());
        assert!(store.find_by_google_id("nobody").await.unwrap().is_none());
        let err = store.save_tokens(7, tokens("x", None)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn tokens_are_sealed_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            DatabaseManager::open(&DatabaseLocation::File(dir.path().join("credentials.db")))
                .unwrap();
        let store = NativeCredentialStore::new(manager.meta_db().clone());
        let created = store
            .upsert_by_google_id(profile("g-3", "c@example.com"), tokens("plain-at", Some("plain-rt")))
            .await
            .unwrap();

        let raw: StoredCredential = async_find_impl(manager.meta_db(), created.id)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(raw.access_token.as_deref(), Some("plain-at"));
        assert_ne!(raw.refresh_token.as_deref(), Some("plain-rt"));
        assert_eq!(raw.open().unwrap().refresh_token.as_deref(), Some("plain-rt"));
    }
}
