use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "rinkside";

/// Keychain account holding the cache encryption key
const CACHE_KEY_ACCOUNT: &str = "__cache_key__";

pub struct CredentialStore;

impl CredentialStore {
    /// Store email and password in the OS keychain
    pub fn store(email: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve password for an email from the OS keychain
    pub fn get_password(email: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, email)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Delete stored credentials for an email
    pub fn delete(email: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Check if credentials exist for an email
    pub fn has_credentials(email: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, email) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }

    /// Load the cache encryption key, if one has been stored
    pub fn get_cache_key() -> Result<Option<Vec<u8>>> {
        let entry = Entry::new(SERVICE_NAME, CACHE_KEY_ACCOUNT)
            .context("Failed to create keyring entry")?;
        match entry.get_secret() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read cache key from keychain"),
        }
    }

    pub fn store_cache_key(key: &[u8]) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, CACHE_KEY_ACCOUNT)
            .context("Failed to create keyring entry")?;
        entry
            .set_secret(key)
            .context("Failed to store cache key in keychain")
    }
}
