// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod cleanup;
pub mod common;
pub mod context;
pub mod database;
pub mod error;
pub mod gmail;
pub mod logger;
pub mod oauth2;
pub mod rest;
pub mod settings;
pub mod user;
pub mod utils;

#[cfg(test)]
pub mod testing;
