//! At-rest encryption for cache files.
//!
//! Each file is `nonce (12 bytes) || ciphertext`. The 256-bit key lives in
//! the OS keychain next to the saved password.

use anyhow::{anyhow, Context, Result};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

use crate::auth::CredentialStore;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

pub struct CacheCipher {
    cipher: ChaCha20Poly1305,
}

impl CacheCipher {
    pub fn from_key(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(anyhow!(
                "Cache key must be {} bytes, got {}",
                KEY_LEN,
                key.len()
            ));
        }
        Ok(Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        })
    }

    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        key
    }

    /// Load the key from the keychain, creating and storing one on first use
    pub fn from_keychain() -> Result<Self> {
        let key = match CredentialStore::get_cache_key()? {
            Some(key) => key,
            None => {
                let key = Self::generate_key();
                CredentialStore::store_cache_key(&key)?;
                key
            }
        };
        Self::from_key(&key).context("Stored cache key is invalid")
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| anyhow!("Failed to encrypt cache data"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() < NONCE_LEN {
            return Err(anyhow!("Encrypted cache file is truncated"));
        }
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Failed to decrypt cache data (wrong key or corrupted file)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = CacheCipher::from_key(&CacheCipher::generate_key()).unwrap();
        let sealed = cipher.encrypt(b"roster data").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + b"roster data".len() + 16);
        assert_eq!(cipher.decrypt(&sealed).unwrap(), b"roster data");
    }

    #[test]
    fn test_nonce_differs_per_write() {
        let cipher = CacheCipher::from_key(&[7u8; KEY_LEN]).unwrap();
        let a = cipher.encrypt(b"same").unwrap();
        let b = cipher.encrypt(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_data_rejected() {
        let cipher = CacheCipher::from_key(&[1u8; KEY_LEN]).unwrap();
        let mut sealed = cipher.encrypt(b"teams").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(cipher.decrypt(&sealed).is_err());

        let other = CacheCipher::from_key(&[2u8; KEY_LEN]).unwrap();
        let sealed = cipher.encrypt(b"teams").unwrap();
        assert!(other.decrypt(&sealed).is_err());
        assert!(cipher.decrypt(&sealed[..4]).is_err());
    }

    #[test]
    fn test_key_length_checked() {
        assert!(CacheCipher::from_key(&[0u8; 16]).is_err());
    }
}
