//! Tenant database secret encryption using AES-256-GCM
//!
//! This module provides encryption and decryption utilities for tenant
//! database credentials stored in the control-plane store, using AES-256-GCM
//! with additional authenticated data (AAD) binding each ciphertext to the
//! tenant that owns it.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use thiserror::Error;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION_ENCRYPTED: u8 = 0x01;
const VERSION_FIELD_LEN: usize = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_ENCRYPTED_LEN: usize = VERSION_FIELD_LEN + NONCE_LEN + TAG_LEN;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("empty ciphertext")]
    EmptyCiphertext,
}

/// Secure wrapper for encryption keys with zeroization
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingKey(Vec<u8>);

/// Type alias for crypto keys
pub type CryptoKey = ZeroizingKey;

impl CryptoKey {
    /// Create a new crypto key from bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::EncryptionFailed(
                "Invalid key length: expected 32 bytes".to_string(),
            ));
        }
        Ok(ZeroizingKey(bytes))
    }

    /// Get the key as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encrypt bytes using AES-256-GCM
pub fn encrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    // Version byte + nonce prefix the ciphertext
    let mut result = Vec::with_capacity(VERSION_FIELD_LEN + NONCE_LEN + ciphertext.len());
    result.push(VERSION_ENCRYPTED);
    result.extend_from_slice(&nonce);
    result.append(&mut ciphertext);

    Ok(result)
}

/// Decrypt bytes using AES-256-GCM
pub fn decrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::EmptyCiphertext);
    }

    // Legacy plaintext payloads carry no version marker
    if ciphertext[0] != VERSION_ENCRYPTED {
        return Ok(ciphertext.to_vec());
    }

    if ciphertext.len() < MIN_ENCRYPTED_LEN {
        return Err(CryptoError::InvalidFormat);
    }

    let nonce = Nonce::from_slice(&ciphertext[VERSION_FIELD_LEN..VERSION_FIELD_LEN + NONCE_LEN]);
    let tag_and_ct = &ciphertext[VERSION_FIELD_LEN + NONCE_LEN..];

    debug_assert!(tag_and_ct.len() >= TAG_LEN);

    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: tag_and_ct,
                aad,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Determine if a payload is using the encrypted format
pub fn is_encrypted_payload(ciphertext: &[u8]) -> bool {
    ciphertext.len() >= MIN_ENCRYPTED_LEN && ciphertext[0] == VERSION_ENCRYPTED
}

fn tenant_secret_aad(tenant_id: Uuid) -> String {
    format!("{}|db_secret", tenant_id)
}

/// Encrypt a tenant database secret, binding the ciphertext to the tenant id.
pub fn encrypt_tenant_secret(
    key: &CryptoKey,
    tenant_id: Uuid,
    secret: &str,
) -> Result<Vec<u8>, CryptoError> {
    encrypt_bytes(key, tenant_secret_aad(tenant_id).as_bytes(), secret.as_bytes())
}

/// Decrypt a tenant database secret. Legacy plaintext payloads pass through
/// unchanged so secrets written before encryption was introduced stay usable.
pub fn decrypt_tenant_secret(
    key: &CryptoKey,
    tenant_id: Uuid,
    ciphertext: &[u8],
) -> Result<String, CryptoError> {
    let plaintext = decrypt_bytes(key, tenant_secret_aad(tenant_id).as_bytes(), ciphertext)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> CryptoKey {
        CryptoKey::new(vec![7u8; 32]).unwrap()
    }

    #[test]
    fn test_key_length_enforced() {
        assert!(CryptoKey::new(vec![0u8; 16]).is_err());
        assert!(CryptoKey::new(vec![0u8; 32]).is_ok());
    }

    #[test]
    fn test_round_trip() {
        let key = test_key();
        let tenant_id = Uuid::new_v4();

        let ciphertext = encrypt_tenant_secret(&key, tenant_id, "s3cr3t-pa55").unwrap();
        assert!(is_encrypted_payload(&ciphertext));

        let plaintext = decrypt_tenant_secret(&key, tenant_id, &ciphertext).unwrap();
        assert_eq!(plaintext, "s3cr3t-pa55");
    }

    #[test]
    fn test_aad_binds_tenant_identity() {
        let key = test_key();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();

        let ciphertext = encrypt_tenant_secret(&key, tenant_a, "s3cr3t").unwrap();

        // Decrypting under a different tenant id must fail authentication.
        assert!(decrypt_tenant_secret(&key, tenant_b, &ciphertext).is_err());
    }

    #[test]
    fn test_legacy_plaintext_passthrough() {
        let key = test_key();
        let tenant_id = Uuid::new_v4();

        // Payload without the version marker is treated as legacy plaintext.
        let legacy = b"plaintext-password".to_vec();
        assert!(!is_encrypted_payload(&legacy));

        let recovered = decrypt_tenant_secret(&key, tenant_id, &legacy).unwrap();
        assert_eq!(recovered, "plaintext-password");
    }

    #[test]
    fn test_empty_ciphertext_rejected() {
        let key = test_key();
        assert!(matches!(
            decrypt_bytes(&key, b"aad", &[]),
            Err(CryptoError::EmptyCiphertext)
        ));
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let key = test_key();
        let truncated = vec![VERSION_ENCRYPTED, 1, 2, 3];
        assert!(matches!(
            decrypt_bytes(&key, b"aad", &truncated),
            Err(CryptoError::InvalidFormat)
        ));
    }
}
