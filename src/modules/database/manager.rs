// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::context::Initialize;
use crate::modules::database::META_MODELS;
use crate::modules::error::{code::ErrorCode, MailPurgeError, MailPurgeResult};
use crate::modules::settings::cli::SETTINGS;
use crate::raise_error;
use native_db::{Builder, Database};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::info;
use url::Url;

pub static DB_MANAGER: OnceLock<DatabaseManager> = OnceLock::new();

const MEMORY_SCHEME: &str = "memory://";

/// Where the credential database lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    pub fn parse(uri: &str) -> Result<Self, String> {
        let uri = uri.trim();
        if uri.eq_ignore_ascii_case(MEMORY_SCHEME) || uri.eq_ignore_ascii_case("memory:") {
            return Ok(DatabaseLocation::Memory);
        }

        if uri.starts_with("file:") {
            let url = Url::parse(uri).map_err(|e| format!("Invalid database URI '{}': {}", uri, e))?;
            let path = url
                .to_file_path()
                .map_err(|_| format!("Database URI '{}' does not name a local file", uri))?;
            return Self::file(path);
        }

        Self::file(PathBuf::from(uri))
    }

    fn file(path: PathBuf) -> Result<Self, String> {
        if !path.is_absolute() {
            return Err(format!(
                "Database location {:?} must be memory://, a file:// URI or an absolute path",
                path
            ));
        }
        if path.is_dir() {
            return Err(format!("Database location {:?} is a directory", path));
        }
        Ok(DatabaseLocation::File(path))
    }
}

pub struct DatabaseManager {
    /// Credential database instance
    meta_db: Arc<Database<'static>>,
}

impl DatabaseManager {
    pub fn open(location: &DatabaseLocation) -> MailPurgeResult<Self> {
        let meta_db = match location {
            DatabaseLocation::Memory => {
                info!("Opening in-memory credential database");
                Builder::new()
                    .create_in_memory(&META_MODELS)
                    .map_err(Self::handle_database_error)?
            }
            DatabaseLocation::File(path) => Self::open_file(path)?,
        };
        Ok(Self {
            meta_db: Arc::new(meta_db),
        })
    }

    fn open_file(path: &Path) -> MailPurgeResult<Database<'static>> {
        info!("Opening credential database at: {:?}", path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                raise_error!(
                    format!("Failed to create database directory {:?}: {:#?}", parent, e),
                    ErrorCode::InternalError
                )
            })?;
        }
        let mut database = Builder::new()
            .create(&META_MODELS, path)
            .map_err(Self::handle_database_error)?;
        database
            .compact()
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
        Ok(database)
    }

    /// Get a reference to the credential database
    pub fn meta_db(&self) -> &Arc<Database<'static>> {
        &self.meta_db
    }

    pub fn global() -> MailPurgeResult<&'static DatabaseManager> {
        DB_MANAGER.get().ok_or_else(|| {
            raise_error!(
                "Credential database has not been initialized".into(),
                ErrorCode::InternalError
            )
        })
    }

    fn handle_database_error(error: native_db::db_type::Error) -> MailPurgeError {
        match error {
            native_db::db_type::Error::RedbDatabaseError(database_error) => match database_error {
                redb::DatabaseError::DatabaseAlreadyOpen => {
                    raise_error!(
                        "Database is already open by another instance".into(),
                        ErrorCode::InternalError
                    )
                }
                other => {
                    raise_error!(
                        format!("Database error: {:?}", other),
                        ErrorCode::InternalError
                    )
                }
            },
            other => {
                raise_error!(
                    format!("Failed to create database: {:?}", other),
                    ErrorCode::InternalError
                )
            }
        }
    }
}

impl Initialize for DatabaseManager {
    async fn initialize() -> MailPurgeResult<()> {
        let location = DatabaseLocation::parse(&SETTINGS.mailpurge_database_uri)
            .map_err(|e| raise_error!(e, ErrorCode::MissingConfiguration))?;
        let manager = DatabaseManager::open(&location)?;
        DB_MANAGER.set(manager).map_err(|_| {
            raise_error!(
                "Credential database was initialized twice".into(),
                ErrorCode::InternalError
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_locations() {
        assert_eq!(
            DatabaseLocation::parse("memory://").unwrap(),
            DatabaseLocation::Memory
        );
        assert_eq!(
            DatabaseLocation::parse("file:///var/lib/mailpurge/credentials.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("/var/lib/mailpurge/credentials.db"))
        );
        assert_eq!(
            DatabaseLocation::parse("/var/lib/mailpurge/credentials.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("/var/lib/mailpurge/credentials.db"))
        );
    }

    #[test]
    fn rejects_relative_and_remote_locations() {
        assert!(DatabaseLocation::parse("credentials.db").is_err());
        assert!(DatabaseLocation::parse("mongodb://localhost:27017/app").is_err());
        assert!(DatabaseLocation::parse("file://remote-host/credentials.db").is_err());
    }

    #[test]
    fn opens_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.db");
        let manager = DatabaseManager::open(&DatabaseLocation::File(path.clone())).unwrap();
        assert!(path.exists());
        drop(manager);
    }
}
