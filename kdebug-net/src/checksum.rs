// kdebug-net/src/checksum.rs
use std::fs::File;
use std::io;
use std::path::Path;

use kdebug_common::error::{KdebugError, Result};
use sha2::{Digest, Sha256};

/// Hash portion of a release checksum string. Manifests sometimes record
/// `"<hash> <filename>"`, sometimes a bare `"<hash>"`.
pub fn expected_hash(checksum: &str) -> &str {
    checksum.split_whitespace().next().unwrap_or("")
}

/// Streaming SHA-256 of a file on disk.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let bytes_copied = io::copy(&mut file, &mut hasher)?;
    let actual = hex::encode(hasher.finalize());
    tracing::debug!(
        "Calculated SHA256 for {}: {} ({} bytes read)",
        path.display(),
        actual,
        bytes_copied
    );
    Ok(actual)
}

pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    let expected = expected_hash(expected);
    let actual = file_sha256(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(KdebugError::Integrity(format!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        )))
    }
}
