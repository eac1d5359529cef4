//! AES-256-GCM sealing of tokens held by a token store.
//!
//! Sealed values are `base64(nonce || ciphertext)`. Keys are 32 bytes, hex-encoded.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;

use crate::error::{Error, ErrorKind, StorageErrorKind};

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

fn storage_err(kind: StorageErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Storage(kind),
    }
}

/// Seal `plaintext` under a fresh random nonce.
pub fn encrypt(plaintext: &str, key_hex: &str) -> Result<String, Error> {
    let cipher = cipher(key_hex, StorageErrorKind::EncryptionFailed)?;

    let nonce_bytes: [u8; NONCE_SIZE] = rand::thread_rng().gen();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|_| storage_err(StorageErrorKind::EncryptionFailed, "AES-GCM seal failed"))?;

    let mut sealed = nonce_bytes.to_vec();
    sealed.extend(ciphertext);
    Ok(BASE64.encode(sealed))
}

/// Open a value produced by [`encrypt`] with the same key.
pub fn decrypt(sealed_b64: &str, key_hex: &str) -> Result<String, Error> {
    let cipher = cipher(key_hex, StorageErrorKind::DecryptionFailed)?;

    let sealed = BASE64.decode(sealed_b64).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
    })?;
    if sealed.len() < NONCE_SIZE {
        return Err(storage_err(
            StorageErrorKind::DecryptionFailed,
            "Sealed value is shorter than its nonce",
        ));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| storage_err(StorageErrorKind::DecryptionFailed, "AES-GCM open failed"))?;

    String::from_utf8(plaintext).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
    })
}

fn cipher(key_hex: &str, kind: StorageErrorKind) -> Result<Aes256Gcm, Error> {
    let key = hex::decode(key_hex).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Storage(StorageErrorKind::EncryptionFailed),
    })?;
    if key.len() != KEY_SIZE {
        return Err(storage_err(kind, "Encryption key must be 32 bytes"));
    }
    Aes256Gcm::new_from_slice(&key).map_err(|_| storage_err(kind, "Invalid encryption key"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn kind(result: Result<String, Error>) -> Option<ErrorKind> {
        result.err().map(|e| e.error_kind)
    }

    #[test]
    fn test_seal_and_open() {
        let sealed = encrypt("access-token", TEST_KEY).unwrap();
        assert_ne!(sealed, "access-token");
        assert_eq!(decrypt(&sealed, TEST_KEY).unwrap(), "access-token");
    }

    #[test]
    fn test_nonce_makes_each_seal_unique() {
        assert_ne!(encrypt("x", TEST_KEY).unwrap(), encrypt("x", TEST_KEY).unwrap());
    }

    #[test]
    fn test_bad_keys() {
        assert_eq!(
            kind(encrypt("x", "zz")),
            Some(ErrorKind::Storage(StorageErrorKind::EncryptionFailed))
        );
        assert_eq!(
            kind(encrypt("x", "abcd")),
            Some(ErrorKind::Storage(StorageErrorKind::EncryptionFailed))
        );
    }

    #[test]
    fn test_wrong_key_or_corrupt_input_fails_to_open() {
        let sealed = encrypt("secret", TEST_KEY).unwrap();
        let wrong_key = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
        for result in [
            decrypt(&sealed, wrong_key),
            decrypt("not base64!!", TEST_KEY),
            decrypt("YWJj", TEST_KEY),
        ] {
            assert_eq!(
                kind(result),
                Some(ErrorKind::Storage(StorageErrorKind::DecryptionFailed))
            );
        }
    }
}
