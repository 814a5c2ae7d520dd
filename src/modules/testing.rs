// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory stand-ins for the credential store, the Google token endpoint and
//! the Gmail API. They share an [`EventLog`] so tests can assert call ordering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::modules::error::{code::ErrorCode, MailPurgeResult};
use crate::modules::gmail::client::{MailboxApi, MailboxConnector};
use crate::modules::gmail::model::{MessageIndex, MessageList};
use crate::modules::oauth2::refresh::TokenEndpoint;
use crate::modules::user::entity::{GoogleProfile, IssuedTokens, UserCredential};
use crate::modules::user::store::CredentialStore;
use crate::raise_error;

pub fn message_ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("m{i}")).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Refresh(String),
    SaveTokens(u64, String),
    Connect(String),
    List,
    Trash(usize),
}

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, predicate: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(predicate)
    }
}

struct MailboxState {
    ids: Vec<String>,
    list_calls: Vec<(Option<String>, u32)>,
    trash_calls: Vec<usize>,
    list_failure: Option<(usize, ErrorCode)>,
    trash_failure: Option<(usize, ErrorCode)>,
}

/// A mailbox served page by page. Page tokens encode the next offset.
#[derive(Clone)]
pub struct FakeMailbox {
    state: Arc<Mutex<MailboxState>>,
    events: EventLog,
}

impl FakeMailbox {
    pub fn with_ids(ids: Vec<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MailboxState {
                ids,
                list_calls: Vec::new(),
                trash_calls: Vec::new(),
                list_failure: None,
                trash_failure: None,
            })),
            events: EventLog::default(),
        }
    }

    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    /// The `call`-th list request (zero based) fails with `code`.
    pub fn fail_list_at(self, call: usize, code: ErrorCode) -> Self {
        self.state.lock().unwrap().list_failure = Some((call, code));
        self
    }

    /// The `call`-th trash request (zero based) fails with `code`.
    pub fn fail_trash_at(self, call: usize, code: ErrorCode) -> Self {
        self.state.lock().unwrap().trash_failure = Some((call, code));
        self
    }

    pub fn handle(&self) -> FakeMailboxHandle {
        FakeMailboxHandle {
            mailbox: self.clone(),
            access_token: "fake-access-token".into(),
        }
    }

    pub fn list_calls(&self) -> Vec<(Option<String>, u32)> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn trash_calls(&self) -> Vec<usize> {
        self.state.lock().unwrap().trash_calls.clone()
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().ids.len()
    }
}

pub struct FakeMailboxHandle {
    mailbox: FakeMailbox,
    pub access_token: String,
}

fn injected(code: ErrorCode) -> crate::modules::error::MailPurgeError {
    raise_error!(format!("injected upstream failure: {:?}", code), code)
}

impl MailboxApi for FakeMailboxHandle {
    async fn list_messages(
        &self,
        page_token: Option<&str>,
        max_results: u32,
    ) -> MailPurgeResult<MessageList> {
        self.mailbox.events.push(Event::List);
        let mut state = self.mailbox.state.lock().unwrap();
        let call = state.list_calls.len();
        state
            .list_calls
            .push((page_token.map(str::to_string), max_results));
        if let Some((failing, code)) = state.list_failure {
            if failing == call {
                return Err(injected(code));
            }
        }

        let offset = page_token.and_then(|t| t.parse::<usize>().ok()).unwrap_or(0);
        let end = (offset + max_results as usize).min(state.ids.len());
        let start = offset.min(end);
        let messages: Vec<MessageIndex> = state.ids[start..end]
            .iter()
            .map(|id| MessageIndex {
                id: id.clone(),
                thread_id: None,
            })
            .collect();
        Ok(MessageList {
            messages: (!messages.is_empty()).then_some(messages),
            next_page_token: (end < state.ids.len()).then(|| end.to_string()),
            result_size_estimate: Some(state.ids.len() as i64),
        })
    }

    async fn batch_trash(&self, ids: &[String]) -> MailPurgeResult<()> {
        self.mailbox.events.push(Event::Trash(ids.len()));
        let mut state = self.mailbox.state.lock().unwrap();
        let call = state.trash_calls.len();
        state.trash_calls.push(ids.len());
        if let Some((failing, code)) = state.trash_failure {
            if failing == call {
                return Err(injected(code));
            }
        }
        state.ids.retain(|id| !ids.contains(id));
        Ok(())
    }
}

pub struct FakeConnector {
    pub mailbox: FakeMailbox,
}

impl MailboxConnector for FakeConnector {
    type Api = FakeMailboxHandle;

    fn connect(&self, access_token: String) -> FakeMailboxHandle {
        self.mailbox.events.push(Event::Connect(access_token.clone()));
        FakeMailboxHandle {
            mailbox: self.mailbox.clone(),
            access_token,
        }
    }
}

/// Token endpoint that hands out `issued` or fails with `failure`.
pub struct FakeTokenEndpoint {
    issued: Option<IssuedTokens>,
    failure: Option<ErrorCode>,
    events: EventLog,
}

impl FakeTokenEndpoint {
    pub fn issuing(access_token: &str, events: EventLog) -> Self {
        Self {
            issued: Some(IssuedTokens {
                access_token: access_token.into(),
                expires_at: Some(crate::utc_now!() + 3_600_000),
                refresh_token: None,
            }),
            failure: None,
            events,
        }
    }

    pub fn failing(code: ErrorCode, events: EventLog) -> Self {
        Self {
            issued: None,
            failure: Some(code),
            events,
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.events
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Refresh(_)))
            .count()
    }
}

impl TokenEndpoint for FakeTokenEndpoint {
    async fn refresh(&self, refresh_token: &str) -> MailPurgeResult<IssuedTokens> {
        self.events.push(Event::Refresh(refresh_token.to_string()));
        match (&self.issued, self.failure) {
            (_, Some(code)) => Err(raise_error!(
                "invalid_grant: Token has been expired or revoked.".into(),
                code
            )),
            (Some(issued), None) => Ok(issued.clone()),
            (None, None) => Err(raise_error!(
                "fake endpoint has nothing to issue".into(),
                ErrorCode::InternalError
            )),
        }
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<u64, UserCredential>>,
    events: EventLog,
}

impl MemoryCredentialStore {
    pub fn new(events: EventLog) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn insert(&self, credential: UserCredential) {
        self.records
            .lock()
            .unwrap()
            .insert(credential.id, credential);
    }

    pub fn snapshot(&self, id: u64) -> Option<UserCredential> {
        self.records.lock().unwrap().get(&id).cloned()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, id: u64) -> MailPurgeResult<Option<UserCredential>> {
        Ok(self.snapshot(id))
    }

    async fn find_by_google_id(&self, google_id: &str) -> MailPurgeResult<Option<UserCredential>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|c| c.google_id == google_id)
            .cloned())
    }

    async fn upsert_by_google_id(
        &self,
        profile: GoogleProfile,
        tokens: IssuedTokens,
    ) -> MailPurgeResult<UserCredential> {
        let mut records = self.records.lock().unwrap();
        let existing = records
            .values()
            .find(|c| c.google_id == profile.google_id)
            .cloned();
        let credential = match existing {
            Some(current) => current.merge_sign_in(profile, tokens),
            None => UserCredential::create(profile, tokens),
        };
        records.insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn save_tokens(&self, id: u64, tokens: IssuedTokens) -> MailPurgeResult<UserCredential> {
        self.events
            .push(Event::SaveTokens(id, tokens.access_token.clone()));
        let mut records = self.records.lock().unwrap();
        let current = records.get(&id).cloned().ok_or_else(|| {
            raise_error!(format!("no credential {id}"), ErrorCode::ResourceNotFound)
        })?;
        let updated = current.with_tokens(tokens);
        records.insert(id, updated.clone());
        Ok(updated)
    }
}
