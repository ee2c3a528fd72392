use std::{
    fmt::Write as _,
    fs::File,
    io,
    path::Path,
};

use sha2::{Digest, Sha256};

use crate::error::{HashError, HashResult};

/// Calculates the SHA-256 checksum of a file.
///
/// The file is read in a streaming fashion and the digest is returned as a
/// lowercase hex-encoded string.
///
/// # Errors
///
/// * [`HashError::ReadFailed`] if the file cannot be read.
///
/// # Example
///
/// ```no_run
/// use depot_utils::error::HashResult;
/// use depot_utils::hash::calculate_checksum;
///
/// fn main() -> HashResult<()> {
///     let checksum = calculate_checksum("/path/to/file")?;
///     println!("Checksum is {}", checksum);
///     Ok(())
/// }
/// ```
pub fn calculate_checksum<P: AsRef<Path>>(file_path: P) -> HashResult<String> {
    let file_path = file_path.as_ref();
    let mut file = File::open(file_path).map_err(|err| {
        HashError::ReadFailed {
            path: file_path.to_path_buf(),
            source: err,
        }
    })?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|err| {
        HashError::ReadFailed {
            path: file_path.to_path_buf(),
            source: err,
        }
    })?;

    let digest = hasher.finalize();
    let mut encoded = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(encoded, "{byte:02x}");
    }
    Ok(encoded)
}

/// Verifies the SHA-256 checksum of a file against an expected value.
///
/// The comparison is case-insensitive.
///
/// # Errors
///
/// * [`HashError::ReadFailed`] if the file cannot be read.
pub fn verify_checksum<P: AsRef<Path>>(file_path: P, expected: &str) -> HashResult<bool> {
    let actual = calculate_checksum(file_path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::{calculate_checksum, verify_checksum};

    #[test]
    fn test_calculate_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world\n").unwrap();
        let path = file.path();

        let checksum = calculate_checksum(path).unwrap();
        assert_eq!(
            checksum,
            "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447"
        );
    }

    #[test]
    fn test_verify_checksum_valid() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world\n").unwrap();
        let path = file.path();

        let result = verify_checksum(
            path,
            "A948904F2F0F479B8F8197694B30184B0D2ED1C1CD2A1EC0FB85D299A192A447",
        )
        .unwrap();
        assert!(result);
    }

    #[test]
    fn test_verify_checksum_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        let path = file.path();

        let result = verify_checksum(path, "invalid-checksum").unwrap();
        assert!(!result);
    }

    #[test]
    fn test_calculate_checksum_file_not_found() {
        let result = calculate_checksum("/path/to/nonexistent/file");
        assert!(result.is_err());
    }

    #[test]
    fn test_calculate_checksum_on_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = calculate_checksum(dir.path());
        assert!(result.is_err());
    }
}
