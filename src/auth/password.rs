//! Password Hashing
//! Mission: Turn plaintext passwords into stable, comparable digests

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed password digester.
///
/// The digest is HMAC-SHA256 under a process-wide salt, hex encoded. The same
/// plaintext always yields the same digest, which is what lets the account
/// store look credentials up by equality. There is no per-account salt.
#[derive(Clone)]
pub struct PasswordHasher {
    mac: HmacSha256,
}

impl PasswordHasher {
    /// Create a hasher keyed by the process-wide salt
    pub fn new(salt: &str) -> Result<Self> {
        if salt.is_empty() {
            return Err(anyhow!("Password salt must not be empty"));
        }
        let mac = HmacSha256::new_from_slice(salt.as_bytes())
            .map_err(|_| anyhow!("Password salt rejected by HMAC"))?;
        Ok(Self { mac })
    }

    pub fn hash(&self, plaintext: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = PasswordHasher::new("pepper").unwrap();
        assert_eq!(hasher.hash("pw1"), hasher.hash("pw1"));

        // A second hasher with the same salt agrees (process restart)
        let again = PasswordHasher::new("pepper").unwrap();
        assert_eq!(hasher.hash("pw1"), again.hash("pw1"));
    }

    #[test]
    fn test_different_passwords_differ() {
        let hasher = PasswordHasher::new("pepper").unwrap();
        assert_ne!(hasher.hash("pw1"), hasher.hash("pw2"));
        assert_ne!(hasher.hash(""), hasher.hash(" "));
    }

    #[test]
    fn test_salt_changes_digest() {
        let a = PasswordHasher::new("salt-a").unwrap();
        let b = PasswordHasher::new("salt-b").unwrap();
        assert_ne!(a.hash("pw1"), b.hash("pw1"));
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let hasher = PasswordHasher::new("pepper").unwrap();
        let digest = hasher.hash("pw1");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!digest.contains("pw1"));
    }

    #[test]
    fn test_empty_salt_rejected() {
        assert!(PasswordHasher::new("").is_err());
    }
}
