// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use mimalloc::MiMalloc;
use modules::{
    context::{Initialize, ServiceContext},
    database::manager::DatabaseManager,
    error::MailPurgeResult,
    logger,
    rest::{start_http_server, AppState},
    settings::cli::SETTINGS,
};
use tracing::{error, info};

mod modules;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> MailPurgeResult<()> {
    if let Err(error) = logger::initialize_logging() {
        eprintln!("{:?}", error);
        return Err(error);
    }
    info!("Starting mailpurge");
    info!("Version:  {}", mailpurge_version!());

    let state = match initialize().await {
        Ok(state) => state,
        Err(error) => {
            error!("Startup failed: {}", error);
            eprintln!("{:?}", error);
            return Err(error);
        }
    };

    start_http_server(state).await?;
    info!("mailpurge stopped");
    Ok(())
}

/// Validates settings and opens the credential store before any request is served.
async fn initialize() -> MailPurgeResult<Arc<AppState>> {
    SETTINGS.validate()?;
    ServiceContext::initialize().await?;
    DatabaseManager::initialize().await?;
    Ok(Arc::new(AppState::from_settings()?))
}
