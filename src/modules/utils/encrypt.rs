// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

//! AES-256-GCM sealing for OAuth tokens stored in the credential database.
//!
//! Layout of a sealed value (URL-safe base64): `salt(32) | nonce(12) | ciphertext+tag`.
//! The key is derived per value with PBKDF2-HMAC-SHA256 from the configured password.

use base64::{engine::general_purpose, Engine as _};
use ring::aead::{Aad, BoundKey, Nonce, NonceSequence, OpeningKey, SealingKey, UnboundKey, AES_256_GCM};
use ring::error::Unspecified;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailPurgeResult;
use crate::modules::settings::cli::SETTINGS;
use crate::raise_error;

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const PBKDF2_ROUNDS: u32 = 100_000;

struct OneShotNonce(Option<[u8; NONCE_LEN]>);

impl NonceSequence for OneShotNonce {
    fn advance(&mut self) -> Result<Nonce, Unspecified> {
        self.0
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(Unspecified)
    }
}

pub fn encrypt_string(plaintext: &str) -> MailPurgeResult<String> {
    TokenCipher::new(&SETTINGS.mailpurge_encrypt_password)
        .seal(plaintext)
        .map_err(|_| raise_error!("Failed to encrypt token.".into(), ErrorCode::InternalError))
}

pub fn decrypt_string(data: &str) -> MailPurgeResult<String> {
    TokenCipher::new(&SETTINGS.mailpurge_encrypt_password)
        .open(data)
        .map_err(|_| {
            raise_error!(
                "Token decryption failed, likely due to a changed encryption password or corrupted data".into(),
                ErrorCode::InternalError
            )
        })
}

pub struct TokenCipher<'a> {
    password: &'a str,
}

impl<'a> TokenCipher<'a> {
    pub fn new(password: &'a str) -> Self {
        Self { password }
    }

    fn derive_key(&self, salt: &[u8]) -> Result<UnboundKey, Unspecified> {
        let mut key = [0u8; 32];
        let rounds = NonZeroU32::new(PBKDF2_ROUNDS).ok_or(Unspecified)?;
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            rounds,
            salt,
            self.password.as_bytes(),
            &mut key,
        );
        UnboundKey::new(&AES_256_GCM, &key)
    }

    pub fn seal(&self, plaintext: &str) -> Result<String, Unspecified> {
        let rng = SystemRandom::new();
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill(&mut salt)?;
        rng.fill(&mut nonce)?;

        let mut sealing_key = SealingKey::new(self.derive_key(&salt)?, OneShotNonce(Some(nonce)));
        let mut in_out = plaintext.as_bytes().to_vec();
        sealing_key.seal_in_place_append_tag(Aad::empty(), &mut in_out)?;

        let mut sealed = Vec::with_capacity(SALT_LEN + NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&salt);
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&in_out);
        Ok(general_purpose::URL_SAFE.encode(sealed))
    }

    pub fn open(&self, data: &str) -> Result<String, Unspecified> {
        let raw = general_purpose::URL_SAFE
            .decode(data)
            .map_err(|_| Unspecified)?;
        if raw.len() < SALT_LEN + NONCE_LEN {
            return Err(Unspecified);
        }
        let (salt, rest) = raw.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| Unspecified)?;

        let mut opening_key = OpeningKey::new(self.derive_key(salt)?, OneShotNonce(Some(nonce)));
        let mut in_out = ciphertext.to_vec();
        let plain = opening_key.open_in_place(Aad::empty(), &mut in_out)?;
        String::from_utf8(plain.to_vec()).map_err(|_| Unspecified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_token_opens_with_same_password() {
        let cipher = TokenCipher::new("a-long-enough-test-password");
        let sealed = cipher.seal("1//0gRefreshTokenValue").unwrap();
        assert_ne!(sealed, "1//0gRefreshTokenValue");
        assert_eq!(cipher.open(&sealed).unwrap(), "1//0gRefreshTokenValue");
    }

    #[test]
    fn sealed_token_rejects_other_password() {
        let sealed = TokenCipher::new("first-password").seal("secret").unwrap();
        assert!(TokenCipher::new("second-password").open(&sealed).is_err());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let cipher = TokenCipher::new("pw");
        assert!(cipher.open("c2hvcnQ=").is_err());
        assert!(cipher.open("not base64 at all!").is_err());
    }

    #[test]
    fn macros_use_configured_password() {
        let sealed = crate::encrypt!("access-token").unwrap();
        assert_eq!(crate::decrypt!(&sealed).unwrap(), "access-token");
    }
}
