// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem_openapi::{payload::Json, Object};
use tracing::{error, info, warn};

use crate::modules::cleanup::lock::UserLocks;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::{ApiError, ApiErrorResponse, MailPurgeError, INTERNAL_ERROR_MESSAGE};
use crate::modules::gmail::client::MailboxConnector;
use crate::modules::gmail::enumerate::{collect_message_ids, preview_message_ids};
use crate::modules::gmail::erase::trash_all;
use crate::modules::oauth2::refresh::{TokenEndpoint, TokenRefreshAdapter};
use crate::modules::user::entity::UserCredential;
use crate::modules::user::store::CredentialStore;

pub mod lock;

/// How a failed run is reported to the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    AuthRequired,
    PermissionDenied,
    InternalFailure,
}

impl FailureKind {
    pub fn classify(error: &MailPurgeError) -> Self {
        match error.code() {
            ErrorCode::AuthRequired
            | ErrorCode::MissingRefreshToken
            | ErrorCode::TokenRefreshFailed
            | ErrorCode::GmailApiUnauthorized => FailureKind::AuthRequired,
            ErrorCode::GmailApiForbidden | ErrorCode::PermissionDenied => {
                FailureKind::PermissionDenied
            }
            _ => FailureKind::InternalFailure,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            FailureKind::AuthRequired => ErrorCode::AuthRequired,
            FailureKind::PermissionDenied => ErrorCode::PermissionDenied,
            FailureKind::InternalFailure => ErrorCode::InternalError,
        }
    }

    fn safe_message(&self) -> &'static str {
        match self {
            FailureKind::AuthRequired => {
                "Google authorization is missing or has expired. Please sign in again."
            }
            FailureKind::PermissionDenied => {
                "Google denied access to this mailbox. Please grant Gmail access and sign in again."
            }
            FailureKind::InternalFailure => INTERNAL_ERROR_MESSAGE,
        }
    }
}

/// Client-safe description of a failed run. The underlying error is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub kind: FailureKind,
    pub message: String,
    pub erased_before_failure: Option<u64>,
    pub chunks_completed: Option<u64>,
}

/// Messages trashed and chunks completed when a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    erased: u64,
    chunks_completed: u64,
}

impl Progress {
    const NONE_ERASED: Progress = Progress {
        erased: 0,
        chunks_completed: 0,
    };
}

impl CleanupFailure {
    fn from_error(error: MailPurgeError, progress: Option<Progress>) -> Self {
        let kind = FailureKind::classify(&error);
        match kind {
            FailureKind::InternalFailure => error!(?progress, "cleanup failed: {:#?}", error),
            _ => warn!(?kind, ?progress, "cleanup rejected: {}", error),
        }
        Self {
            kind,
            message: kind.safe_message().to_string(),
            erased_before_failure: progress.map(|p| p.erased),
            chunks_completed: progress.map(|p| p.chunks_completed),
        }
    }

    fn unauthenticated() -> Self {
        Self {
            kind: FailureKind::AuthRequired,
            message: "Not signed in. Please sign in with Google first.".into(),
            erased_before_failure: None,
            chunks_completed: None,
        }
    }
}

impl From<CleanupFailure> for ApiErrorResponse {
    fn from(failure: CleanupFailure) -> Self {
        let code = failure.kind.error_code();
        let body = ApiError::new(failure.message, code as u32);
        let body = match (failure.erased_before_failure, failure.chunks_completed) {
            (Some(erased), chunks) => body.with_erased_before_failure(erased, chunks.unwrap_or(0)),
            (None, _) => body,
        };
        ApiErrorResponse::Generic(code.status(), Json(body))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Object)]
pub struct DeleteSummary {
    /// Number of messages moved to the trash by this run.
    #[oai(rename = "deletedCount")]
    pub deleted_count: u64,
    pub message: String,
}

impl DeleteSummary {
    fn new(deleted_count: u64) -> Self {
        let message = match deleted_count {
            0 => "Mailbox is already empty.".to_string(),
            1 => "Moved 1 message to trash.".to_string(),
            n => format!("Moved {n} messages to trash."),
        };
        Self {
            deleted_count,
            message,
        }
    }
}

/// Drives one "trash everything" run for a signed-in user:
/// resolve credential, serialize on the user lock, obtain a token, enumerate
/// every message id, then trash them chunk by chunk.
pub struct MailboxCleanup<'a, S, T, C> {
    store: &'a S,
    endpoint: &'a T,
    connector: &'a C,
    locks: &'a UserLocks,
}

impl<'a, S, T, C> MailboxCleanup<'a, S, T, C>
where
    S: CredentialStore,
    T: TokenEndpoint,
    C: MailboxConnector,
{
    pub fn new(store: &'a S, endpoint: &'a T, connector: &'a C, locks: &'a UserLocks) -> Self {
        Self {
            store,
            endpoint,
            connector,
            locks,
        }
    }

    async fn resolve(&self, user_id: Option<u64>) -> Result<UserCredential, CleanupFailure> {
        let user_id = user_id.ok_or_else(CleanupFailure::unauthenticated)?;
        match self.store.get(user_id).await {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => {
                warn!(user_id, "session refers to an unknown user");
                Err(CleanupFailure::unauthenticated())
            }
            Err(e) => Err(CleanupFailure::from_error(e, None)),
        }
    }

    pub async fn run(&self, user_id: Option<u64>) -> Result<DeleteSummary, CleanupFailure> {
        let user_id = self.resolve(user_id).await?.id;
        let _guard = self.locks.acquire(user_id).await;
        // A run that waited on the lock must see tokens saved by the one before it.
        let credential = self.resolve(Some(user_id)).await?;
        info!(user_id, "cleanup started");

        let api = TokenRefreshAdapter::new(self.store, self.endpoint)
            .authorize(&credential, self.connector)
            .await
            .map_err(|e| CleanupFailure::from_error(e, Some(Progress::NONE_ERASED)))?;

        let ids = collect_message_ids(&api)
            .await
            .map_err(|e| CleanupFailure::from_error(e, Some(Progress::NONE_ERASED)))?;
        info!(user_id = credential.id, total = ids.len(), "mailbox enumerated");

        if ids.is_empty() {
            return Ok(DeleteSummary::new(0));
        }

        let erased = trash_all(&api, &ids).await.map_err(|failure| {
            warn!(
                user_id = credential.id,
                chunks_completed = failure.chunks_completed,
                "cleanup stopped partway"
            );
            let progress = Progress {
                erased: failure.erased,
                chunks_completed: failure.chunks_completed as u64,
            };
            CleanupFailure::from_error(failure.error, Some(progress))
        })?;
        info!(user_id = credential.id, erased, "cleanup completed");
        Ok(DeleteSummary::new(erased))
    }

    /// First page of message ids, without touching the mailbox.
    pub async fn preview(
        &self,
        user_id: Option<u64>,
        max_results: u32,
    ) -> Result<Vec<String>, CleanupFailure> {
        let credential = self.resolve(user_id).await?;
        let api = TokenRefreshAdapter::new(self.store, self.endpoint)
            .authorize(&credential, self.connector)
            .await
            .map_err(|e| CleanupFailure::from_error(e, None))?;
        preview_message_ids(&api, max_results)
            .await
            .map_err(|e| CleanupFailure::from_error(e, None))
    }
}
