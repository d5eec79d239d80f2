//! Checksum utilities for file verification

use crate::error::{BillingError, Result};
use crate::types::ChecksumAlgorithm;
use sha2::{Digest, Sha256, Sha512};
use std::io::Read;
use std::path::Path;

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => digest_reader::<Sha256, _>(reader),
        ChecksumAlgorithm::Sha512 => digest_reader::<Sha512, _>(reader),
    }
}

fn digest_reader<D: Digest, R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify that `copy` has the same content as `source`
///
/// Returns the shared checksum on success.
pub fn verify_file_copy(
    source: impl AsRef<Path>,
    copy: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let expected = compute_file_checksum(source, algorithm)?;
    let actual = compute_file_checksum(copy.as_ref(), algorithm)?;
    if actual == expected {
        Ok(actual)
    } else {
        Err(BillingError::ChecksumMismatch {
            path: copy.as_ref().display().to_string(),
            expected,
            actual,
        })
    }
}
