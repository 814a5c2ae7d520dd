// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod encrypt;
pub mod shutdown;

#[macro_export]
macro_rules! mailpurge_version {
    () => {
        env!("CARGO_PKG_VERSION")
    };
}

#[macro_export]
macro_rules! utc_now {
    () => {{
        use chrono::Utc;
        Utc::now().timestamp_millis()
    }};
}

#[macro_export]
macro_rules! raise_error {
    ($msg:expr, $code:expr) => {
        $crate::modules::error::MailPurgeError::Generic {
            message: $msg,
            location: snafu::Location::default(),
            code: $code,
        }
    };
}

#[macro_export]
macro_rules! encrypt {
    ($plaintext:expr) => {{
        $crate::modules::utils::encrypt::encrypt_string($plaintext)
    }};
}

#[macro_export]
macro_rules! decrypt {
    ($ciphertext:expr) => {{
        $crate::modules::utils::encrypt::decrypt_string($ciphertext)
    }};
}

/// Random identifier that stays within the 53-bit range browsers can represent exactly.
pub fn generate_id() -> u64 {
    rand::random::<u64>() & 0x1F_FFFF_FFFF_FFFF
}

/// Shortens a secret so it can appear in debug logs without leaking it.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "<short-secret>".into();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::{generate_id, mask_secret};

    #[test]
    fn mask_secret_hides_the_middle() {
        assert_eq!(mask_secret("ya29.a0AfH6SMBxyz"), "ya29...Bxyz");
        assert_eq!(mask_secret("short"), "<short-secret>");
        assert_eq!(mask_secret(""), "<short-secret>");
    }

    #[test]
    fn generated_ids_fit_in_53_bits() {
        for _ in 0..64 {
            assert!(generate_id() <= 0x1F_FFFF_FFFF_FFFF);
        }
    }
}
