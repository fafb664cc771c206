//! SHA-256 checksum utility for migration drift detection.

use sha2::{Digest, Sha256};

/// Compute a checksum over an ordered list of statements.
///
/// Statements are joined with a NUL separator so that moving text across a
/// statement boundary changes the checksum.
pub fn compute_statements_checksum<S: AsRef<str>>(statements: &[S]) -> String {
    let mut hasher = Sha256::new();
    for (i, stmt) in statements.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(stmt.as_ref().trim().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
