// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, MailPurgeResult};
use crate::modules::logger::file::setup_file_logger;
use crate::modules::settings::cli::SETTINGS;
use crate::raise_error;
use chrono::Local;
use tracing::Level;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

mod file;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

pub fn initialize_logging() -> MailPurgeResult<()> {
    if SETTINGS.mailpurge_log_to_file {
        setup_file_logger()
    } else {
        setup_stdout_logger()
    }
}

fn setup_stdout_logger() -> MailPurgeResult<()> {
    let level = parse_log_level(&SETTINGS.mailpurge_log_level)?;
    let with_ansi = SETTINGS.mailpurge_ansi_logs;

    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(true)
        .with_timer(LocalTimer);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(with_ansi)
        .with_writer(std::io::stdout)
        .event_format(format)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}

fn parse_log_level(value: &str) -> MailPurgeResult<Level> {
    value.parse::<Level>().map_err(|_| {
        raise_error!(
            format!(
                "Invalid log level specified. Use one of: error, warn, info, debug, trace. \
                 The log level you currently specified is 'mailpurge_log_level'='{}'",
                value
            ),
            ErrorCode::MissingConfiguration
        )
    })
}
