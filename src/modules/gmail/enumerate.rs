// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::debug;

use crate::modules::error::MailPurgeResult;
use crate::modules::gmail::client::MailboxApi;

/// Largest page `users.messages.list` will return.
pub const PAGE_SIZE: u32 = 500;

/// Follows continuation tokens until the provider stops returning one and
/// yields every message id in provider order. A failing page aborts the whole
/// enumeration; pages fetched before it are dropped.
pub async fn collect_message_ids<A: MailboxApi>(api: &A) -> MailPurgeResult<Vec<String>> {
    let mut ids = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = api.list_messages(page_token.as_deref(), PAGE_SIZE).await?;
        pages += 1;
        ids.extend(page.ids().map(str::to_string));
        match page.continuation() {
            Some(token) => page_token = Some(token.to_string()),
            None => break,
        }
    }

    debug!(pages, total = ids.len(), "mailbox enumeration finished");
    Ok(ids)
}

/// Single page used by the dashboard preview.
pub async fn preview_message_ids<A: MailboxApi>(
    api: &A,
    max_results: u32,
) -> MailPurgeResult<Vec<String>> {
    let page = api
        .list_messages(None, max_results.clamp(1, PAGE_SIZE))
        .await?;
    Ok(page.ids().map(str::to_string).collect())
}
