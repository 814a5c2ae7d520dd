// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use gmail::GmailApi;
use poem_openapi::{OpenApiService, Tags};
use user::UserApi;

use crate::mailpurge_version;

pub mod gmail;
pub mod user;

#[derive(Tags)]
pub enum ApiTags {
    User,
    Gmail,
}

type MailPurgeOpenApi = (UserApi, GmailApi);

pub fn create_openapi_service() -> OpenApiService<MailPurgeOpenApi, ()> {
    OpenApiService::new((UserApi, GmailApi), "MailPurgeApi", mailpurge_version!())
}
