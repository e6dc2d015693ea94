//! Secret handling for exchange API credentials
//!
//! Secrets and passphrases are wrapped in `Zeroizing` so they are wiped from
//! memory when the credential set is dropped, and they never show up in
//! `Debug` output.
//!
//! This module also generates the random material needed when provisioning
//! sub-accounts (account names and API key passphrases).

use rand::distributions::{Alphanumeric, Distribution, Uniform};
use rand::Rng;
use std::fmt;
use zeroize::Zeroizing;

/// Length of generated sub-account names
pub const SUBACCOUNT_NAME_LENGTH: usize = 8;

/// Length of generated API key passphrases (exchange accepts 8-32)
pub const PASSPHRASE_LENGTH: usize = 16;

/// API key, secret and passphrase for one exchange account
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    api_key: String,
    api_secret: Zeroizing<String>,
    passphrase: Zeroizing<String>,
}

impl ApiCredentials {
    /// Build a credential set.
    ///
    /// Returns `None` when the key or secret is blank: an account with a
    /// half-filled record cannot sign requests and is treated as having no
    /// credentials at all.
    pub fn new(api_key: &str, api_secret: &str, passphrase: &str) -> Option<Self> {
        let api_key = api_key.trim();
        let api_secret = api_secret.trim();
        if api_key.is_empty() || api_secret.is_empty() {
            return None;
        }

        Some(Self {
            api_key: api_key.to_string(),
            api_secret: Zeroizing::new(api_secret.to_string()),
            passphrase: Zeroizing::new(passphrase.trim().to_string()),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Random lowercase name for a new virtual sub-account
pub fn generate_subaccount_name() -> String {
    let letters = Uniform::new_inclusive(b'a', b'z');
    let mut rng = rand::thread_rng();
    (0..SUBACCOUNT_NAME_LENGTH)
        .map(|_| letters.sample(&mut rng) as char)
        .collect()
}

/// Random alphanumeric passphrase for a new API key
pub fn generate_api_passphrase() -> Zeroizing<String> {
    let passphrase: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSPHRASE_LENGTH)
        .map(char::from)
        .collect();
    Zeroizing::new(passphrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_or_secret_means_no_credentials() {
        assert!(ApiCredentials::new("", "secret", "pass").is_none());
        assert!(ApiCredentials::new("key", "  ", "pass").is_none());
        assert!(ApiCredentials::new("key", "secret", "").is_some());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = ApiCredentials::new("bg_key", "very-secret", "hunter2").unwrap();
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("bg_key"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_generated_subaccount_name_shape() {
        let name = generate_subaccount_name();
        assert_eq!(name.len(), SUBACCOUNT_NAME_LENGTH);
        assert!(name.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generated_passphrase_shape() {
        let passphrase = generate_api_passphrase();
        assert_eq!(passphrase.len(), PASSPHRASE_LENGTH);
        assert!(passphrase.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
