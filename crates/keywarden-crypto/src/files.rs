//! File-reading collaborator for key directories.
//!
//! Loads named files from a directory and keeps "the file is not there"
//! distinct from "the file could not be read", because construction treats
//! those very differently (a missing archive is fine; a missing primary key
//! is fatal).

use std::io;
use std::path::Path;

use crate::error::KeyError;

/// Read `name` from `dir`.
///
/// Returns [`KeyError::NotFound`] when the file does not exist and
/// [`KeyError::Io`] for any other read failure, both tagged with the
/// caller's operation name.
pub fn read(op: &'static str, dir: &Path, name: &str) -> Result<Vec<u8>, KeyError> {
    match std::fs::read(dir.join(name)) {
        Ok(bytes) => {
            tracing::debug!(file = name, bytes = bytes.len(), "read key file");
            Ok(bytes)
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(KeyError::NotFound { op, what: name.to_string() })
        },
        Err(err) => Err(KeyError::Io { op, name: name.to_string(), source: err }),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::*;

    #[test]
    fn read_returns_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("public.upspinkey"), b"p256\n1\n2\n").unwrap();
        let bytes = read("test", dir.path(), "public.upspinkey").unwrap();
        assert_eq!(bytes, b"p256\n1\n2\n");
    }

    #[test]
    fn missing_file_is_not_exist_not_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = read("test", dir.path(), "secret.upspinkey").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotExist);
    }
}
