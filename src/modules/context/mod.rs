// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::MailPurgeResult;
use crate::utc_now;
use std::sync::LazyLock;

pub mod status;

pub static SERVICE_CONTEXT: LazyLock<ServiceContext> = LazyLock::new(ServiceContext::new);

pub trait Initialize {
    async fn initialize() -> MailPurgeResult<()>;
}

pub struct ServiceContext {
    start_at: i64,
}

impl ServiceContext {
    fn new() -> Self {
        Self {
            start_at: utc_now!(),
        }
    }

    pub fn uptime_ms(&self) -> i64 {
        utc_now!() - self.start_at
    }
}

impl Initialize for ServiceContext {
    async fn initialize() -> MailPurgeResult<()> {
        LazyLock::force(&SERVICE_CONTEXT);
        Ok(())
    }
}
