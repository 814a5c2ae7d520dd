// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use clap::{builder::ValueParser, Parser};
use std::{collections::HashSet, path::PathBuf, sync::LazyLock};
use url::Url;

use crate::modules::database::manager::DatabaseLocation;
use crate::modules::error::{code::ErrorCode, MailPurgeResult};
use crate::raise_error;

#[cfg(not(test))]
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::parse);

#[cfg(test)]
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::new_for_test);

/// Minimum length in bytes of the secret used to sign session cookies.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Parser)]
#[clap(
    name = "mailpurge",
    about = "A small service that signs users in with Google and bulk-moves their Gmail messages to the trash.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Settings {
    /// mailpurge log level (default: "info")
    #[clap(
        long,
        default_value = "info",
        env,
        help = "Set the log level for mailpurge"
    )]
    pub mailpurge_log_level: String,

    #[clap(long, env, help = "Set the HTTP port for mailpurge")]
    pub mailpurge_http_port: u16,

    /// The IP address that the HTTP server binds to, in IPv4 format (e.g., 192.168.1.1).
    #[clap(
        long,
        env,
        default_value = "0.0.0.0",
        help = "The IP address that the HTTP server binds to, in IPv4 format",
        value_parser = ValueParser::new(|s: &str| {
            if s.parse::<std::net::Ipv4Addr>().is_err() {
                return Err("The bind IP address must be a valid IPv4 address.".to_string());
            }
            Ok(s.to_string())
        })
    )]
    pub mailpurge_bind_ip: String,

    #[clap(long, env, help = "OAuth2 client ID issued by Google")]
    pub mailpurge_google_client_id: String,

    #[clap(long, env, help = "OAuth2 client secret issued by Google")]
    pub mailpurge_google_client_secret: String,

    /// Must match one of the redirect URIs registered for the Google OAuth2 client.
    #[clap(
        long,
        env,
        help = "Redirect URI registered with Google, e.g. https://example.com/auth/google/callback",
        value_parser = ValueParser::new(|s: &str| -> Result<String, String> {
            Url::parse(s).map_err(|_| format!("Invalid URL for google_redirect_uri: {}", s))?;
            Ok(s.to_string())
        })
    )]
    pub mailpurge_google_redirect_uri: String,

    #[clap(
        long,
        env,
        help = "Secret used to sign session cookies (at least 32 bytes)",
        value_parser = ValueParser::new(|s: &str| -> Result<String, String> {
            if s.len() < MIN_SESSION_SECRET_LEN {
                return Err(format!(
                    "Session secret must be at least {} bytes long.",
                    MIN_SESSION_SECRET_LEN
                ));
            }
            Ok(s.to_string())
        })
    )]
    pub mailpurge_session_secret: String,

    /// Location of the credential database.
    ///
    /// Accepts `memory://`, `file:///absolute/path/credentials.db` or a bare absolute path.
    #[clap(
        long,
        env,
        help = "Credential database URI (memory://, file:///abs/path.db or an absolute path)",
        value_parser = ValueParser::new(|s: &str| -> Result<String, String> {
            DatabaseLocation::parse(s)?;
            Ok(s.to_string())
        })
    )]
    pub mailpurge_database_uri: String,

    /// Where the browser lands after the OAuth2 callback.
    #[clap(
        long,
        env,
        default_value = "http://localhost:3000/dashboard",
        help = "URL to redirect users to after Google sign-in",
        value_parser = ValueParser::new(|s: &str| -> Result<String, String> {
            Url::parse(s).map_err(|_| format!("Invalid URL for dashboard_url: {}", s))?;
            Ok(s.to_string())
        })
    )]
    pub mailpurge_dashboard_url: String,

    /// mailpurge encryption password
    #[clap(
        long,
        default_value = "change-this-default-password-now",
        env,
        help = "Set the password used to encrypt stored OAuth tokens. ⚠️ Change this default in production!"
    )]
    pub mailpurge_encrypt_password: String,

    /// CORS allowed origins
    #[clap(
        long,
        default_value = "",
        env,
        help = "Set the allowed CORS origins (comma-separated list, e.g., \"https://example.com, https://another.com\"). Defaults to the dashboard origin",
        value_parser = ValueParser::new(|s: &str| -> Result<HashSet<String>, String> {
            let set: HashSet<String> = s.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
            Ok(set)
        })
    )]
    pub mailpurge_cors_origins: HashSet<String>,

    /// CORS max age in seconds (default: 86400)
    #[clap(
        long,
        default_value = "86400",
        env,
        help = "Set the CORS max age in seconds"
    )]
    pub mailpurge_cors_max_age: i32,

    /// Enable ANSI logs (default: true)
    #[clap(long, default_value = "true", env, help = "Enable ANSI formatted logs")]
    pub mailpurge_ansi_logs: bool,

    /// If false, logs will be printed to stdout
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Enable log file output (otherwise logs go to stdout)"
    )]
    pub mailpurge_log_to_file: bool,

    #[clap(
        long,
        env,
        help = "Directory for rolling server log files (required when log file output is enabled)",
        value_parser = ValueParser::new(|s: &str| {
            let path = PathBuf::from(s);
            if !path.is_absolute() {
                return Err("Path must be an absolute directory path".to_string());
            }
            Ok(path)
        })
    )]
    pub mailpurge_log_dir: Option<PathBuf>,

    /// Maximum number of log files (default: 5)
    #[clap(
        long,
        default_value = "5",
        env,
        help = "Set the maximum number of server log files"
    )]
    pub mailpurge_max_server_log_files: usize,

    #[clap(
        long,
        default_value = "true",
        env,
        help = "Enable compression for the open api server"
    )]
    pub mailpurge_http_compression_enabled: bool,

    /// Marks the session cookie `Secure`. Enable whenever the service sits behind HTTPS.
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Only send the session cookie over HTTPS"
    )]
    pub mailpurge_secure_cookie: bool,

    #[clap(
        long,
        default_value = "10",
        env,
        help = "Default number of message ids returned by the list-messages preview (1-500)",
        value_parser = clap::value_parser!(u32).range(1..=500)
    )]
    pub mailpurge_list_preview_limit: u32,
}

impl Settings {
    /// Cross-field checks that clap cannot express. Called once at startup.
    pub fn validate(&self) -> MailPurgeResult<()> {
        let required = [
            ("mailpurge_google_client_id", &self.mailpurge_google_client_id),
            (
                "mailpurge_google_client_secret",
                &self.mailpurge_google_client_secret,
            ),
            (
                "mailpurge_google_redirect_uri",
                &self.mailpurge_google_redirect_uri,
            ),
            ("mailpurge_session_secret", &self.mailpurge_session_secret),
            ("mailpurge_database_uri", &self.mailpurge_database_uri),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(raise_error!(
                format!("Required configuration '{}' is empty.", name),
                ErrorCode::MissingConfiguration
            ));
        }

        if self.mailpurge_http_port == 0 {
            return Err(raise_error!(
                "mailpurge_http_port must be a non-zero port.".into(),
                ErrorCode::MissingConfiguration
            ));
        }

        if self.mailpurge_session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(raise_error!(
                format!(
                    "mailpurge_session_secret must be at least {} bytes long.",
                    MIN_SESSION_SECRET_LEN
                ),
                ErrorCode::MissingConfiguration
            ));
        }

        for (name, value) in [
            (
                "mailpurge_google_redirect_uri",
                &self.mailpurge_google_redirect_uri,
            ),
            ("mailpurge_dashboard_url", &self.mailpurge_dashboard_url),
        ] {
            let url = Url::parse(value).map_err(|e| {
                raise_error!(
                    format!("{} is not a valid URL: {}", name, e),
                    ErrorCode::MissingConfiguration
                )
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(raise_error!(
                    format!("{} must use http or https, got '{}'.", name, url.scheme()),
                    ErrorCode::MissingConfiguration
                ));
            }
        }

        DatabaseLocation::parse(&self.mailpurge_database_uri)
            .map_err(|e| raise_error!(e, ErrorCode::MissingConfiguration))?;

        if self.mailpurge_log_to_file && self.mailpurge_log_dir.is_none() {
            return Err(raise_error!(
                "mailpurge_log_dir is required when mailpurge_log_to_file is enabled.".into(),
                ErrorCode::MissingConfiguration
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn new_for_test() -> Self {
        Self {
            mailpurge_log_level: "info".to_string(),
            mailpurge_http_port: 15630,
            mailpurge_bind_ip: "127.0.0.1".into(),
            mailpurge_google_client_id: "test-client-id.apps.googleusercontent.com".into(),
            mailpurge_google_client_secret: "test-client-secret".into(),
            mailpurge_google_redirect_uri: "http://localhost:15630/auth/google/callback".into(),
            mailpurge_session_secret: "0123456789abcdef0123456789abcdef-test".into(),
            mailpurge_database_uri: "memory://".into(),
            mailpurge_dashboard_url: "http://localhost:3000/dashboard".into(),
            mailpurge_encrypt_password: "change-this-default-password-now".into(),
            mailpurge_cors_origins: Default::default(),
            mailpurge_cors_max_age: 86400,
            mailpurge_ansi_logs: false,
            mailpurge_log_to_file: false,
            mailpurge_log_dir: None,
            mailpurge_max_server_log_files: 5,
            mailpurge_http_compression_enabled: true,
            mailpurge_secure_cookie: false,
            mailpurge_list_preview_limit: 10,
        }
    }
}
