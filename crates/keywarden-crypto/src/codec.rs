//! Textual key codec: public-key records, private scalars, key hashes.
//!
//! The wire form of a public key is a newline-delimited text record,
//! `"<curve>\n<X decimal>\n<Y decimal>\n"`, and its identity is the SHA-256
//! hash of those exact bytes. Formatting is therefore significant: the hash
//! is always taken over the bytes as given, never over a re-serialized form.

use std::fmt;

use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::curve::{CurveId, EcdsaKeyPair};
use crate::error::KeyError;

/// SHA-256 digest of a serialized public key; the stable identifier a key
/// is stored and referenced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyHash([u8; 32]);

impl KeyHash {
    /// Digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Reconstruct a hash from raw bytes. `None` unless exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Self)
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Hash of a serialized public key, over the exact bytes as given.
pub fn key_hash(serialized: &[u8]) -> KeyHash {
    KeyHash(Sha256::digest(serialized).into())
}

/// A parsed public key together with the exact text it was parsed from.
///
/// Two public keys are equal iff their serialized byte strings are equal.
/// Curve membership of the point is not checked here; it is enforced at
/// every point of use (the private-key correspondence gate, verification,
/// and scalar multiplication).
#[derive(Debug, Clone)]
pub struct PublicKey {
    text: String,
    curve: CurveId,
    x: BigUint,
    y: BigUint,
}

impl PublicKey {
    /// Parse the newline-delimited text form of a public key.
    ///
    /// Requires exactly four fields when split on `\n`, the last empty
    /// (the record must end in a newline), with X and Y as base-10
    /// integers and a known curve name.
    pub fn parse(serialized: &[u8]) -> Result<Self, KeyError> {
        let op = "parse_public_key";
        let text = std::str::from_utf8(serialized)
            .map_err(|_| KeyError::invalid(op, "public key is not valid UTF-8"))?;
        let fields: Vec<&str> = text.split('\n').collect();
        if fields.len() != 4 || !fields[3].is_empty() {
            return Err(KeyError::invalid(
                op,
                format!("expected key type, two big ints and a newline; got {} fields", fields.len()),
            ));
        }
        let x = BigUint::parse_bytes(fields[1].as_bytes(), 10)
            .ok_or_else(|| KeyError::invalid(op, format!("{:?} is not a big int", fields[1])))?;
        let y = BigUint::parse_bytes(fields[2].as_bytes(), 10)
            .ok_or_else(|| KeyError::invalid(op, format!("{:?} is not a big int", fields[2])))?;
        let curve = CurveId::from_name(fields[0])
            .ok_or_else(|| KeyError::invalid(op, format!("unknown key type: {:?}", fields[0])))?;
        Ok(Self { text: text.to_string(), curve, x, y })
    }

    /// Serialize a (curve, X, Y) triple into the canonical text form.
    pub fn from_parts(curve: CurveId, x: BigUint, y: BigUint) -> Self {
        let text = format!("{}\n{x}\n{y}\n", curve.name());
        Self { text, curve, x, y }
    }

    /// The exact serialized text this key was parsed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Serialized bytes, suitable for hashing or re-parsing.
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Curve this key lives on.
    pub fn curve(&self) -> CurveId {
        self.curve
    }

    /// Affine X coordinate.
    pub fn x(&self) -> &BigUint {
        &self.x
    }

    /// Affine Y coordinate.
    pub fn y(&self) -> &BigUint {
        &self.y
    }

    /// [`KeyHash`] of the serialized bytes.
    pub fn hash(&self) -> KeyHash {
        key_hash(self.as_bytes())
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for PublicKey {}

/// A private scalar that passed the correspondence gate against its public
/// key, plus the validated ECDSA key pair built from it.
///
/// The canonical decimal text is retained (zeroizing on drop) because it is
/// the input key material for subkey derivation.
pub struct PrivateScalar {
    text: Zeroizing<String>,
    pair: EcdsaKeyPair,
}

impl PrivateScalar {
    /// Canonical decimal form of the scalar: comment and whitespace
    /// stripped, no leading zeros.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn pair(&self) -> &EcdsaKeyPair {
        &self.pair
    }
}

// Manual impl so the scalar never shows up in debug output.
impl fmt::Debug for PrivateScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateScalar").finish_non_exhaustive()
    }
}

/// Parse the text form of a private scalar and bind it to `public`.
///
/// Anything after `#` is a comment; surrounding whitespace is ignored. The
/// remainder must be a base-10 integer D, and `D * G` on the key's curve
/// must equal the public point. The correspondence check is a hard security
/// gate: a non-corresponding pair is rejected no matter how trusted the
/// source of the text is.
pub fn parse_private_scalar(public: &PublicKey, text: &str) -> Result<PrivateScalar, KeyError> {
    let op = "parse_private_scalar";
    let cleaned = match text.find('#') {
        Some(i) => &text[..i],
        None => text,
    }
    .trim();
    let d = BigUint::parse_bytes(cleaned.as_bytes(), 10)
        .ok_or_else(|| KeyError::invalid(op, "private key is not a decimal integer"))?;
    let pair = EcdsaKeyPair::from_parts(op, public.curve(), public.x(), public.y(), &d)?;
    Ok(PrivateScalar { text: Zeroizing::new(d.to_string()), pair })
}
