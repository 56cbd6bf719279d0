// ABOUTME: Shared secret held by the daemon and compared in constant time.
// ABOUTME: Only a digest is kept; comparison time does not depend on where inputs differ.

use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Clone)]
pub struct SharedSecret {
    digest: [u8; 32],
}

impl SharedSecret {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: digest(secret),
        }
    }

    /// Whether `candidate` equals the secret.
    ///
    /// Both sides are hashed first, so the comparison always walks 32 bytes
    /// whatever the candidate's length.
    pub fn verify(&self, candidate: &str) -> bool {
        let candidate = digest(candidate);
        let diff = self
            .digest
            .iter()
            .zip(candidate.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        diff == 0
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}
