//! Password digest computation and verification
//!
//! Digests are unsalted SHA-256 rendered as lowercase hex. This matches the
//! format already present in the `users.password_hash` column, so it must not
//! change without a migration of the stored digests. Known weakness: without
//! a per-user salt, identical passwords produce identical digests and the
//! scheme is vulnerable to precomputed-table attacks.

use sha2::{Digest, Sha256};

/// Compute the stored digest for a plaintext password.
///
/// Deterministic across calls and users; the empty string is hashed like any
/// other input (callers reject empty credentials before getting here).
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    hex::encode(digest)
}

/// Check a plaintext password against a stored digest.
///
/// Exact, case-sensitive comparison; digests are always emitted lowercase,
/// so an uppercase stored digest never matches.
pub fn verify_password(password: &str, digest: &str) -> bool {
    hash_password(password) == digest
}
