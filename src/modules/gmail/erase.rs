// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::{debug, warn};

use crate::modules::error::MailPurgeError;
use crate::modules::gmail::client::MailboxApi;

/// Upper bound on ids accepted by one `batchModify` request.
pub const BATCH_SIZE: usize = 1000;

/// A chunk failed; everything before it stays trashed.
#[derive(Debug)]
pub struct EraseFailure {
    pub erased: u64,
    pub chunks_completed: usize,
    pub error: MailPurgeError,
}

/// Trashes `ids` in consecutive chunks of at most [`BATCH_SIZE`], one request at a
/// time, and stops at the first failing chunk. There is no rollback.
pub async fn trash_all<A: MailboxApi>(api: &A, ids: &[String]) -> Result<u64, EraseFailure> {
    let total_chunks = ids.len().div_ceil(BATCH_SIZE);
    let mut erased = 0u64;

    for (index, chunk) in ids.chunks(BATCH_SIZE).enumerate() {
        if let Err(error) = api.batch_trash(chunk).await {
            warn!(
                chunk = index + 1,
                total_chunks,
                erased,
                "batch trash failed, stopping"
            );
            return Err(EraseFailure {
                erased,
                chunks_completed: index,
                error,
            });
        }
        erased += chunk.len() as u64;
        debug!(chunk = index + 1, total_chunks, erased, "batch trashed");
    }

    Ok(erased)
}
