// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, MailPurgeResult};
use crate::modules::logger::{parse_log_level, LocalTimer};
use crate::modules::settings::cli::SETTINGS;
use crate::raise_error;
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

pub static LOG_WORKER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn setup_file_logger() -> MailPurgeResult<()> {
    let level = parse_log_level(&SETTINGS.mailpurge_log_level)?;
    let with_ansi = SETTINGS.mailpurge_ansi_logs;

    let (server_nonb, server_guard) = server_log_writer()?;
    // The guard must outlive the subscriber, otherwise buffered lines are dropped.
    let _ = LOG_WORKER_GUARD.set(server_guard);

    let server_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(with_ansi)
        .with_level(true)
        .with_writer(server_nonb)
        .with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(server_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}

fn server_log_writer() -> MailPurgeResult<(NonBlocking, WorkerGuard)> {
    let log_dir = SETTINGS.mailpurge_log_dir.clone().ok_or_else(|| {
        raise_error!(
            "mailpurge_log_dir is required when mailpurge_log_to_file is enabled.".into(),
            ErrorCode::MissingConfiguration
        )
    })?;
    let rolling = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("server")
        .max_log_files(SETTINGS.mailpurge_max_server_log_files)
        .build(log_dir)
        .map_err(|e| {
            raise_error!(
                format!("failed to initialize rolling file appender: {:#?}", e),
                ErrorCode::InternalError
            )
        })?;
    Ok(tracing_appender::non_blocking(rolling))
}
