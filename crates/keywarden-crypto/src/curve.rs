//! NIST curve identifiers and the per-curve ECDSA primitives behind them.
//!
//! Each supported curve gets a concrete operations module generated from one
//! macro, so the rest of the crate works in curve-agnostic terms (big
//! integers in, big integers out) and dispatch happens in exactly one place.

use std::fmt;

use num_bigint::BigUint;

use crate::error::KeyError;

/// A supported elliptic curve, identified by its short wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveId {
    /// NIST P-256 (`p256`)
    P256,
    /// NIST P-384 (`p384`)
    P384,
    /// NIST P-521 (`p521`)
    P521,
}

impl CurveId {
    /// Map a wire name to a curve. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "p256" => Some(Self::P256),
            "p384" => Some(Self::P384),
            "p521" => Some(Self::P521),
            _ => None,
        }
    }

    /// Short wire name of this curve.
    pub fn name(self) -> &'static str {
        match self {
            Self::P256 => "p256",
            Self::P384 => "p384",
            Self::P521 => "p521",
        }
    }

    /// Byte length of a scalar for this curve: `ceil(bitlen(order) / 8)`.
    ///
    /// Also the upper bound on the length of a hash that can be signed.
    pub fn scalar_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serialize a big integer as a fixed-width big-endian field element.
pub(crate) fn left_pad(op: &'static str, value: &BigUint, len: usize) -> Result<Vec<u8>, KeyError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > len {
        return Err(KeyError::invalid(op, "integer exceeds curve field size"));
    }
    let mut out = vec![0u8; len];
    out[len - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

/// Zero-left-pad a prehash shorter than the field size.
///
/// ECDSA interprets the prehash as a big-endian integer, so leading zero
/// bytes leave the signed value unchanged; longer prehashes are passed
/// through for the usual leftmost-bits truncation.
pub(crate) fn pad_prehash(hash: &[u8], len: usize) -> Vec<u8> {
    if hash.len() >= len {
        return hash.to_vec();
    }
    let mut out = vec![0u8; len];
    out[len - hash.len()..].copy_from_slice(hash);
    out
}

macro_rules! curve_ops {
    ($name:ident, $curve:ident, $id:expr, $len:expr) => {
        mod $name {
            use ecdsa::signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner};
            use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
            use num_bigint::BigUint;
            use rand::rngs::OsRng;
            use $curve::ecdsa::{Signature, SigningKey, VerifyingKey};
            use $curve::{EncodedPoint, FieldBytes, PublicKey};

            use super::left_pad;
            use crate::error::KeyError;

            const LEN: usize = $len;

            /// Convert a `left_pad` result into a field element buffer.
            fn field_bytes(op: &'static str, bytes: Vec<u8>) -> Result<FieldBytes, KeyError> {
                if bytes.len() != LEN {
                    return Err(KeyError::invalid(op, "integer exceeds curve field size"));
                }
                let mut out = FieldBytes::default();
                out.copy_from_slice(&bytes);
                Ok(out)
            }

            pub(crate) fn encoded_point(
                op: &'static str,
                x: &BigUint,
                y: &BigUint,
            ) -> Result<EncodedPoint, KeyError> {
                let x = field_bytes(op, left_pad(op, x, LEN)?)?;
                let y = field_bytes(op, left_pad(op, y, LEN)?)?;
                Ok(EncodedPoint::from_affine_coordinates(&x, &y, false))
            }

            /// Build a signing key from its decimal parts, enforcing the
            /// correspondence gate: the key is rejected unless `D * G`
            /// lands exactly on the supplied public point.
            pub(crate) fn keypair(
                op: &'static str,
                x: &BigUint,
                y: &BigUint,
                d: &BigUint,
            ) -> Result<SigningKey, KeyError> {
                let point = encoded_point(op, x, y)?;
                let d = left_pad(op, d, LEN)?;
                let key = SigningKey::from_slice(&d)
                    .map_err(|_| KeyError::invalid(op, "private key is not a valid curve scalar"))?;
                let derived = PublicKey::from_secret_scalar(key.as_nonzero_scalar());
                if derived.to_encoded_point(false) != point {
                    return Err(KeyError::invalid(op, "public and private keys do not correspond"));
                }
                Ok(key)
            }

            pub(crate) fn sign_prehash(
                op: &'static str,
                key: &SigningKey,
                hash: &[u8],
            ) -> Result<(BigUint, BigUint), KeyError> {
                let hash = super::pad_prehash(hash, LEN);
                let signature: Signature = key
                    .sign_prehash_with_rng(&mut OsRng, &hash)
                    .map_err(|_| KeyError::invalid(op, "signing failed"))?;
                let (r, s) = signature.split_bytes();
                Ok((BigUint::from_bytes_be(&r), BigUint::from_bytes_be(&s)))
            }

            pub(crate) fn verify_prehash(
                op: &'static str,
                x: &BigUint,
                y: &BigUint,
                hash: &[u8],
                r: &BigUint,
                s: &BigUint,
            ) -> Result<(), KeyError> {
                let point = encoded_point(op, x, y)?;
                let key = VerifyingKey::from_encoded_point(&point)
                    .map_err(|_| KeyError::invalid(op, "invalid public key point"))?;
                let r = field_bytes(op, left_pad(op, r, LEN)?)?;
                let s = field_bytes(op, left_pad(op, s, LEN)?)?;
                let signature = Signature::from_scalars(r, s)
                    .map_err(|_| KeyError::invalid(op, "signature does not match"))?;
                let hash = super::pad_prehash(hash, LEN);
                key.verify_prehash(&hash, &signature)
                    .map_err(|_| KeyError::invalid(op, "signature does not match"))
            }

            /// `D * (x, y)` in affine coordinates.
            ///
            /// The point is validated against the curve equation before any
            /// multiplication; off-curve input is rejected outright.
            pub(crate) fn scalar_mult(
                op: &'static str,
                key: &SigningKey,
                x: &BigUint,
                y: &BigUint,
            ) -> Result<(BigUint, BigUint), KeyError> {
                let point = encoded_point(op, x, y)?;
                let public: Option<PublicKey> = PublicKey::from_encoded_point(&point).into();
                let Some(public) = public else {
                    return Err(KeyError::OffCurvePoint { op, curve: $id });
                };
                let product =
                    (public.to_projective() * **key.as_nonzero_scalar()).to_affine();
                let product = product.to_encoded_point(false);
                match (product.x(), product.y()) {
                    (Some(px), Some(py)) => {
                        Ok((BigUint::from_bytes_be(px), BigUint::from_bytes_be(py)))
                    },
                    _ => Err(KeyError::invalid(op, "scalar multiplication produced the identity")),
                }
            }
        }
    };
}

curve_ops!(ops_p256, p256, crate::curve::CurveId::P256, 32);
curve_ops!(ops_p384, p384, crate::curve::CurveId::P384, 48);
curve_ops!(ops_p521, p521, crate::curve::CurveId::P521, 66);

/// A validated ECDSA key pair on one of the supported curves.
///
/// Construction goes through the correspondence gate; holding a value of
/// this type means the private scalar matches the public point it was
/// loaded with. The underlying signing keys zeroize on drop.
pub(crate) enum EcdsaKeyPair {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(Box<p521::ecdsa::SigningKey>),
}

impl EcdsaKeyPair {
    pub(crate) fn from_parts(
        op: &'static str,
        curve: CurveId,
        x: &BigUint,
        y: &BigUint,
        d: &BigUint,
    ) -> Result<Self, KeyError> {
        match curve {
            CurveId::P256 => Ok(Self::P256(ops_p256::keypair(op, x, y, d)?)),
            CurveId::P384 => Ok(Self::P384(ops_p384::keypair(op, x, y, d)?)),
            CurveId::P521 => Ok(Self::P521(Box::new(ops_p521::keypair(op, x, y, d)?))),
        }
    }

    pub(crate) fn sign_prehash(
        &self,
        op: &'static str,
        hash: &[u8],
    ) -> Result<(BigUint, BigUint), KeyError> {
        match self {
            Self::P256(key) => ops_p256::sign_prehash(op, key, hash),
            Self::P384(key) => ops_p384::sign_prehash(op, key, hash),
            Self::P521(key) => ops_p521::sign_prehash(op, key, hash),
        }
    }

    pub(crate) fn scalar_mult(
        &self,
        op: &'static str,
        x: &BigUint,
        y: &BigUint,
    ) -> Result<(BigUint, BigUint), KeyError> {
        match self {
            Self::P256(key) => ops_p256::scalar_mult(op, key, x, y),
            Self::P384(key) => ops_p384::scalar_mult(op, key, x, y),
            Self::P521(key) => ops_p521::scalar_mult(op, key, x, y),
        }
    }
}

/// ECDSA verification against a raw public point, dispatched by curve.
pub(crate) fn verify_prehash(
    op: &'static str,
    curve: CurveId,
    x: &BigUint,
    y: &BigUint,
    hash: &[u8],
    r: &BigUint,
    s: &BigUint,
) -> Result<(), KeyError> {
    match curve {
        CurveId::P256 => ops_p256::verify_prehash(op, x, y, hash, r, s),
        CurveId::P384 => ops_p384::verify_prehash(op, x, y, hash, r, s),
        CurveId::P521 => ops_p521::verify_prehash(op, x, y, hash, r, s),
    }
}
