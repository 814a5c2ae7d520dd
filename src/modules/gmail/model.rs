// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MessageIndex {
    pub id: String,
    #[serde(rename = "threadId")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// One page of `users.messages.list`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MessageList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<MessageIndex>>,
    #[serde(rename = "nextPageToken")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(rename = "resultSizeEstimate")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_size_estimate: Option<i64>,
}

impl MessageList {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().flatten().map(|m| m.id.as_str())
    }

    /// Continuation token, with the empty string treated as "no more pages".
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::MessageList;

    #[test]
    fn parses_list_page() {
        let page: MessageList = serde_json::from_str(
            r#"{"messages":[{"id":"a1","threadId":"t1"},{"id":"a2","threadId":"t1"}],
                "nextPageToken":"p2","resultSizeEstimate":1500}"#,
        )
        .unwrap();
        assert_eq!(page.ids().collect::<Vec<_>>(), vec!["a1", "a2"]);
        assert_eq!(page.continuation(), Some("p2"));
    }

    #[test]
    fn empty_mailbox_page_has_no_messages_field() {
        let page: MessageList = serde_json::from_str(r#"{"resultSizeEstimate":0}"#).unwrap();
        assert_eq!(page.ids().count(), 0);
        assert_eq!(page.continuation(), None);
    }
}
