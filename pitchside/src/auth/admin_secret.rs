use sha2::{Digest, Sha256};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminAccess {
    Granted,
    Denied,
    /// No secret is configured; admin operations are switched off.
    Disabled,
}

/// Shared-secret check for admin operations.
#[derive(Clone)]
pub struct AdminGate {
    /// SHA-256 of the configured secret.
    expected: Option<[u8; 32]>,
}

impl AdminGate {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            expected: secret
                .filter(|s| !s.is_empty())
                .map(|s| Sha256::digest(s.as_bytes()).into()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }

    pub fn check(&self, provided: Option<&str>) -> AdminAccess {
        let Some(expected) = &self.expected else {
            return AdminAccess::Disabled;
        };
        let Some(provided) = provided else {
            return AdminAccess::Denied;
        };

        // Both sides are hashed first so the comparison is over equal-length
        // digests whatever the input lengths.
        let provided: [u8; 32] = Sha256::digest(provided.as_bytes()).into();
        if constant_time_eq(&provided, expected) {
            AdminAccess::Granted
        } else {
            warn!("admin request rejected: secret mismatch");
            AdminAccess::Denied
        }
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Compare two byte strings, visiting every byte regardless of where they
/// first differ. Only the length difference short-circuits.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a
        .iter()
        .zip(b)
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}
