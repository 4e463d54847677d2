//! Password hashing with Argon2id.
//!
//! Credentials are stored as PHC strings:
//! `$argon2id$v=19$m=65536,t=1,p=4$<salt>$<digest>` (unpadded base64).
//! Verification re-derives with whatever parameters the string embeds, so
//! credentials written with other cost settings keep working.

use crate::error::CredentialError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, Salt, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use subtle::ConstantTimeEq;

/// 64 MiB.
pub const MEMORY_COST_KIB: u32 = 64 * 1024;
pub const TIME_COST: u32 = 1;
pub const PARALLELISM: u32 = 4;
pub const DIGEST_LEN: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialStore;

impl CredentialStore {
    pub fn new() -> Self {
        Self
    }

    fn hasher() -> Result<Argon2<'static>, CredentialError> {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(DIGEST_LEN))
            .map_err(|e| CredentialError::Hash(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash `password` under a fresh 16-byte salt.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Self::hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;
        Ok(phc.to_string())
    }

    /// [`CredentialStore::hash`] on the blocking pool; Argon2 at 64 MiB is
    /// too slow to run on an async worker.
    pub async fn hash_async(&self, password: &str) -> Result<String, CredentialError> {
        let store = *self;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || store.hash(&password))
            .await
            .map_err(|e| CredentialError::Hash(e.to_string()))?
    }

    pub async fn verify_async(
        &self,
        password: &str,
        encoded: &str,
    ) -> Result<bool, CredentialError> {
        let store = *self;
        let (password, encoded) = (password.to_owned(), encoded.to_owned());
        tokio::task::spawn_blocking(move || store.verify(&password, &encoded))
            .await
            .map_err(|e| CredentialError::Hash(e.to_string()))?
    }

    /// Check `password` against an encoded credential in constant time.
    ///
    /// Malformed encodings yield `Parse`, bad base64 yields `Decode`. Neither
    /// ever means "valid".
    pub fn verify(&self, password: &str, encoded: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(encoded)?;
        let algorithm = Algorithm::try_from(parsed.algorithm)?;
        let version = parsed
            .version
            .map(Version::try_from)
            .transpose()
            .map_err(|e| CredentialError::Parse(e.to_string()))?
            .unwrap_or_default();
        let params = Params::try_from(&parsed)?;

        let salt = parsed
            .salt
            .ok_or_else(|| CredentialError::Parse("missing salt".to_string()))?;
        let expected = parsed
            .hash
            .ok_or_else(|| CredentialError::Parse("missing digest".to_string()))?;

        let mut salt_buf = [0u8; Salt::MAX_LENGTH];
        let salt_bytes = salt.decode_b64(&mut salt_buf)?;

        let mut actual = vec![0u8; expected.len()];
        Argon2::new(algorithm, version, params)
            .hash_password_into(password.as_bytes(), salt_bytes, &mut actual)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;

        Ok(actual.as_slice().ct_eq(expected.as_bytes()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD_NO_PAD;

    #[test]
    fn hash_then_verify() {
        let store = CredentialStore::new();
        let encoded = store.hash("hunter22").unwrap();
        assert!(store.verify("hunter22", &encoded).unwrap());
        assert!(!store.verify("hunter23", &encoded).unwrap());
        assert!(!store.verify("", &encoded).unwrap());
    }

    #[test]
    fn fresh_salt_per_hash() {
        let store = CredentialStore::new();
        let a = store.hash("same-password").unwrap();
        let b = store.hash("same-password").unwrap();
        assert_ne!(a, b);
        assert!(store.verify("same-password", &a).unwrap());
        assert!(store.verify("same-password", &b).unwrap());
    }

    #[test]
    fn encoding_embeds_fixed_parameters() {
        let encoded = CredentialStore::new().hash("pw123456").unwrap();
        assert!(encoded.starts_with("$argon2id$v=19$m=65536,t=1,p=4$"));

        let fields: Vec<&str> = encoded.split('$').collect();
        assert_eq!(fields.len(), 6);
        let salt = STANDARD_NO_PAD.decode(fields[4]).unwrap();
        let digest = STANDARD_NO_PAD.decode(fields[5]).unwrap();
        assert_eq!(salt.len(), 16);
        assert_eq!(digest.len(), DIGEST_LEN);
    }

    #[test]
    fn verifies_credentials_with_other_parameters() {
        let salt = SaltString::generate(&mut OsRng);
        let encoded = Argon2::default()
            .hash_password(b"legacy-pass", &salt)
            .unwrap()
            .to_string();
        let store = CredentialStore::new();
        assert!(store.verify("legacy-pass", &encoded).unwrap());
        assert!(!store.verify("legacy-pasz", &encoded).unwrap());
    }

    #[test]
    fn malformed_encoding_is_a_parse_error() {
        let err = CredentialStore::new()
            .verify("whatever", "not-a-credential")
            .unwrap_err();
        assert!(matches!(err, CredentialError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn bad_base64_digest_is_a_decode_error() {
        let err = CredentialStore::new()
            .verify("whatever", "$argon2id$v=19$m=65536,t=1,p=4$c29tZXNhbHQ$!!!!")
            .unwrap_err();
        assert!(matches!(err, CredentialError::Decode(_)), "got {err:?}");
    }
}
