//! Error types for key custody operations.
//!
//! Failures form a closed set of kinds (`NotExist`, `Invalid`, `IO`) so call
//! sites can classify exhaustively, while each variant carries the operation
//! name and enough context to diagnose without exposing key material.

use std::io;

use thiserror::Error;

use crate::curve::CurveId;

/// Classification of a [`KeyError`].
///
/// Every error maps onto exactly one kind; matching on the kind is the
/// stable way to branch on failure class at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A key file or key hash that was asked for does not exist.
    NotExist,
    /// Malformed or rejected input: bad key text, non-corresponding key
    /// pair, unknown curve, oversized hash, failed verification.
    Invalid,
    /// A file read failed for a reason other than the file being absent.
    Io,
}

/// Errors that can occur during key parsing, custody, signing, and
/// derivation operations.
#[derive(Error, Debug)]
pub enum KeyError {
    /// A named key file or a key hash was not found
    #[error("{op}: no such key: {what}")]
    NotFound {
        /// Operation that failed
        op: &'static str,
        /// File name or hex key hash that was looked up
        what: String,
    },

    /// Malformed or rejected input
    #[error("{op}: {reason}")]
    Invalid {
        /// Operation that failed
        op: &'static str,
        /// What was wrong with the input
        reason: String,
    },

    /// A point failing the curve equation was supplied to scalar
    /// multiplication. Off-curve points are how invalid-curve ("twist")
    /// attacks extract private-key bits, so this is reported distinctly
    /// and the multiplication is never attempted.
    #[error("{op}: a crypto attack was attempted against you: point is not on {curve}")]
    OffCurvePoint {
        /// Operation that failed
        op: &'static str,
        /// Curve the point was claimed to be on
        curve: CurveId,
    },

    /// File read failure other than not-exist
    #[error("{op}: reading {name}")]
    Io {
        /// Operation that failed
        op: &'static str,
        /// File that could not be read
        name: String,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
}

impl KeyError {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotExist,
            Self::Invalid { .. } | Self::OffCurvePoint { .. } => ErrorKind::Invalid,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Shorthand for an [`KeyError::Invalid`] with an owned reason.
    pub(crate) fn invalid(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { op, reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_onto_closed_kind_set() {
        assert_eq!(
            KeyError::NotFound { op: "t", what: "secret.upspinkey".into() }.kind(),
            ErrorKind::NotExist
        );
        assert_eq!(KeyError::invalid("t", "bad").kind(), ErrorKind::Invalid);
        assert_eq!(
            KeyError::OffCurvePoint { op: "t", curve: CurveId::P256 }.kind(),
            ErrorKind::Invalid
        );
        assert_eq!(
            KeyError::Io {
                op: "t",
                name: "public.upspinkey".into(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            }
            .kind(),
            ErrorKind::Io
        );
    }

    #[test]
    fn off_curve_error_names_the_attack() {
        let err = KeyError::OffCurvePoint { op: "scalar_mult", curve: CurveId::P256 };
        assert!(err.to_string().contains("attack was attempted"));
    }

    #[test]
    fn messages_carry_operation_name() {
        let err = KeyError::invalid("parse_public_key", "expected 4 fields");
        assert!(err.to_string().starts_with("parse_public_key:"));
    }
}
