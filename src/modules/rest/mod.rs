// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::cleanup::lock::UserLocks;
use crate::modules::cleanup::MailboxCleanup;
use crate::modules::common::error::ErrorCapture;
use crate::modules::common::http::HttpClient;
use crate::modules::common::log::Tracing;
use crate::modules::common::session::session_middleware;
use crate::modules::database::manager::DatabaseManager;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::handler::error_handler;
use crate::modules::error::MailPurgeResult;
use crate::modules::gmail::client::GmailConnector;
use crate::modules::oauth2::flow::{GoogleOAuthConfig, LoginFlow};
use crate::modules::oauth2::refresh::GoogleTokenEndpoint;
use crate::modules::rest::public::oauth2::{google_callback, google_login};
use crate::modules::rest::public::status::get_status;
use crate::modules::user::store::NativeCredentialStore;
use crate::modules::{settings::cli::SETTINGS, utils::shutdown::shutdown_signal};
use crate::raise_error;

use super::error::ApiErrorResponse;
use api::create_openapi_service;
use poem::get;
use poem::listener::TcpListener;
use poem::middleware::{CatchPanic, Compression, Cors};
use poem::{Endpoint, EndpointExt, Route, Server};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod api;
pub mod public;

pub type ApiResult<T, E = ApiErrorResponse> = std::result::Result<T, E>;

const DESCRIPTION: &str = r#"
    mailpurge signs a user in with Google and moves every message in their Gmail mailbox to the trash.

    Sessions are kept in a signed cookie set by `/auth/google/callback`; every `/api` call reads it.
"#;

/// Long-lived collaborators shared by every request.
pub struct AppState {
    pub store: NativeCredentialStore,
    pub login: LoginFlow,
    pub token_endpoint: GoogleTokenEndpoint,
    pub connector: GmailConnector,
    pub locks: UserLocks,
    pub dashboard_url: String,
}

impl AppState {
    pub fn new(
        store: NativeCredentialStore,
        oauth: &GoogleOAuthConfig,
        connector: GmailConnector,
        dashboard_url: String,
    ) -> MailPurgeResult<Self> {
        Ok(Self {
            store,
            login: LoginFlow::new(oauth, HttpClient::new()?)?,
            token_endpoint: GoogleTokenEndpoint::new(oauth)?,
            connector,
            locks: UserLocks::new(),
            dashboard_url,
        })
    }

    pub fn from_settings() -> MailPurgeResult<Self> {
        let store = NativeCredentialStore::new(DatabaseManager::global()?.meta_db().clone());
        Self::new(
            store,
            &GoogleOAuthConfig::from_settings(),
            GmailConnector::new(HttpClient::new()?),
            SETTINGS.mailpurge_dashboard_url.clone(),
        )
    }

    pub fn cleanup(
        &self,
    ) -> MailboxCleanup<'_, NativeCredentialStore, GoogleTokenEndpoint, GmailConnector> {
        MailboxCleanup::new(
            &self.store,
            &self.token_endpoint,
            &self.connector,
            &self.locks,
        )
    }
}

/// Browsers send cookies cross-origin only to explicitly allowed origins, so an
/// empty list falls back to the dashboard's own origin.
fn cors_origins(configured: &HashSet<String>, dashboard_url: &str) -> HashSet<String> {
    if !configured.is_empty() {
        return configured.clone();
    }
    url::Url::parse(dashboard_url)
        .map(|url| url.origin().ascii_serialization())
        .into_iter()
        .collect()
}

pub fn build_routes(state: Arc<AppState>) -> impl Endpoint {
    let api_service = create_openapi_service().description(DESCRIPTION);
    let swagger = api_service.swagger_ui();
    let spec_json = api_service.spec_endpoint();

    let open_api_route = Route::new()
        .nest_no_strip("/api", api_service)
        .with(ErrorCapture)
        .with(Tracing);

    let auth_route = Route::new()
        .at("/auth/google", get(google_login))
        .at("/auth/google/callback", get(google_callback))
        .with(Tracing);

    let cors = Cors::new()
        .allow_origins(cors_origins(
            &SETTINGS.mailpurge_cors_origins,
            &SETTINGS.mailpurge_dashboard_url,
        ))
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST", "OPTIONS", "HEAD"])
        .allow_headers(vec!["Content-Type"])
        .max_age(SETTINGS.mailpurge_cors_max_age);

    Route::new()
        .nest("/api-docs/swagger", swagger)
        .nest("/api-docs/spec.json", spec_json)
        .nest("/api/status", get(get_status))
        .nest_no_strip("/api", open_api_route)
        .nest_no_strip("/auth", auth_route)
        .data(state)
        .with(session_middleware())
        .with(cors)
        .with_if(
            SETTINGS.mailpurge_http_compression_enabled,
            Compression::new(),
        )
        .with(CatchPanic::new())
        .catch_all_error(error_handler)
}

pub async fn start_http_server(state: Arc<AppState>) -> MailPurgeResult<()> {
    let listener = TcpListener::bind((
        SETTINGS.mailpurge_bind_ip.clone(),
        SETTINGS.mailpurge_http_port,
    ));

    let server = Server::new(listener)
        .name("mailpurge API Service")
        .idle_timeout(Duration::from_secs(60))
        .run_with_graceful_shutdown(
            build_routes(state),
            shutdown_signal(),
            Some(Duration::from_secs(5)),
        );
    info!(
        "mailpurge API Service is now running on {}:{}.",
        SETTINGS.mailpurge_bind_ip, SETTINGS.mailpurge_http_port
    );
    server
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}
