//! Plan fingerprinting and data checksums.
//!
//! [`PlanHasher`] computes a stable SHA-256 digest over the names and seed
//! revisions of a plan prefix. A snapshot is only reused when the fingerprint
//! it was written with matches the fingerprint of the current plan, so changing
//! any ancestor's seed invalidates every dependent snapshot.
//!
//! # Examples
//!
//! ```
//! use scenarist::fingerprint::PlanHasher;
//!
//! let mut hasher = PlanHasher::new();
//! hasher.push("Sandbox", "1");
//! let sandbox = hasher.current();
//! hasher.push("Roles", "1");
//! assert_ne!(sandbox, hasher.current());
//! ```

use sha2::{Digest, Sha256};

/// Incremental fingerprint over plan steps.
#[derive(Clone, Default)]
pub struct PlanHasher {
    hasher: Sha256,
}

impl PlanHasher {
    /// Start an empty fingerprint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one plan step into the fingerprint.
    pub fn push(&mut self, name: &str, revision: &str) {
        self.hasher.update(b"step");
        update_with_len(&mut self.hasher, name.as_bytes());
        update_with_len(&mut self.hasher, revision.as_bytes());
    }

    /// Hex digest of every step pushed so far.
    #[must_use]
    pub fn current(&self) -> String {
        format!("{:x}", self.hasher.clone().finalize())
    }
}

/// Hex SHA-256 of `bytes`, used as the snapshot body checksum.
#[must_use]
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn update_with_len(hasher: &mut Sha256, bytes: &[u8]) {
    let len = bytes.len();
    hasher.update(format!("{len}:").as_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fingerprint(steps: &[(&str, &str)]) -> String {
        let mut hasher = PlanHasher::new();
        for (name, revision) in steps {
            hasher.push(name, revision);
        }
        hasher.current()
    }

    #[rstest]
    fn fingerprint_is_deterministic() {
        let steps = [("Sandbox", "1"), ("Roles", "2")];
        assert_eq!(fingerprint(&steps), fingerprint(&steps));
        assert_eq!(fingerprint(&steps).len(), 64);
    }

    #[rstest]
    #[case(&[("Sandbox", "1"), ("Roles", "1")], &[("Sandbox", "2"), ("Roles", "1")])]
    #[case(&[("Sandbox", "1"), ("Roles", "1")], &[("Roles", "1"), ("Sandbox", "1")])]
    #[case(&[("ab", "c")], &[("a", "bc")])]
    fn fingerprint_distinguishes_plans(#[case] left: &[(&str, &str)], #[case] right: &[(&str, &str)]) {
        assert_ne!(fingerprint(left), fingerprint(right));
    }

    #[rstest]
    fn checksum_matches_known_digest() {
        assert_eq!(
            checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
