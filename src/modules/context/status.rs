// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::mailpurge_version;
use crate::modules::context::SERVICE_CONTEXT;
use chrono::Local;
use poem_openapi::Object;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use timeago::Formatter;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Object)]
pub struct MailPurgeStatus {
    /// The service uptime in milliseconds since it started.
    pub uptime_ms: i64,
    /// A human-readable string indicating the time elapsed since the service started (e.g., "2 hours ago").
    pub timeago: String,
    /// The timezone in which the service is operating (e.g., "+08:00").
    pub timezone: String,
    /// The version of the mailpurge service currently running.
    pub version: String,
}

impl MailPurgeStatus {
    pub fn get() -> Self {
        let uptime_ms = SERVICE_CONTEXT.uptime_ms();
        Self {
            uptime_ms,
            timeago: Formatter::new().convert(Duration::from_millis(uptime_ms.max(0) as u64)),
            timezone: Local::now().offset().to_string(),
            version: mailpurge_version!().into(),
        }
    }
}
