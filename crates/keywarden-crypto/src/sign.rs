//! ECDSA signing and verification, and the entry-metadata hash that binds
//! signatures to file records.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::codec::PublicKey;
use crate::curve;
use crate::error::KeyError;
use crate::ring::KeyRing;

/// An ECDSA signature: the (R, S) pair as curve-order-sized big integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// R component.
    pub r: BigUint,
    /// S component.
    pub s: BigUint,
}

/// Byte order of the 8-byte timestamp field inside [`entry_hash`], as
/// indices into the big-endian representation of the timestamp.
///
/// This arrangement is a historical accident, but every previously issued
/// signature binds to it bit-for-bit, so it is kept as a literal shuffle
/// table and locked by fixed test vectors. Do not normalize it to
/// big-endian: that would invalidate every existing signature.
const TIME_BYTE_ORDER: [usize; 8] = [4, 5, 6, 7, 3, 2, 1, 0];

impl KeyRing {
    /// ECDSA-sign `hash` with the current key and a fresh random nonce.
    ///
    /// `hash` may be at most the curve's order length in bytes
    /// (32/48/66 for p256/p384/p521); anything longer is `Invalid`.
    pub fn sign(&self, hash: &[u8]) -> Result<Signature, KeyError> {
        let op = "sign";
        let key = self.current_key();
        if hash.len() > key.curve().scalar_len() {
            return Err(KeyError::invalid(
                op,
                format!("hash of {} bytes is too long to sign with {}", hash.len(), key.curve()),
            ));
        }
        let (r, s) = key.pair().sign_prehash(op, hash)?;
        Ok(Signature { r, s })
    }

    /// Sign a 32-byte entry hash produced by [`entry_hash`].
    ///
    /// Same primitive as [`sign`](Self::sign); the fixed digest size is
    /// always within bounds for the supported curves, so there is no
    /// length check.
    pub fn sign_entry_hash(&self, entry_hash: &[u8; 32]) -> Result<Signature, KeyError> {
        let key = self.current_key();
        let (r, s) = key.pair().sign_prehash("sign_entry_hash", entry_hash)?;
        Ok(Signature { r, s })
    }
}

/// Domain-separated SHA-256 hash over a file entry's metadata.
///
/// The encoding is byte-exact: length-prefixed name and link, one byte each
/// of attribute and packing identifier, the shuffled 8-byte timestamp (see
/// [`TIME_BYTE_ORDER`]), then length-prefixed data key and content hash.
/// All length prefixes are 4-byte big-endian.
pub fn entry_hash(
    name: &str,
    link: &str,
    attribute: u8,
    packing: u8,
    time: i64,
    dkey: &[u8],
    content_hash: &[u8],
) -> [u8; 32] {
    let mut digest = Sha256::new();
    digest.update((name.len() as u32).to_be_bytes());
    digest.update(name.as_bytes());
    digest.update((link.len() as u32).to_be_bytes());
    digest.update(link.as_bytes());
    digest.update([attribute, packing]);
    let be = (time as u64).to_be_bytes();
    let mut shuffled = [0u8; 8];
    for (dst, &src) in shuffled.iter_mut().zip(TIME_BYTE_ORDER.iter()) {
        *dst = be[src];
    }
    digest.update(shuffled);
    digest.update((dkey.len() as u32).to_be_bytes());
    digest.update(dkey);
    digest.update((content_hash.len() as u32).to_be_bytes());
    digest.update(content_hash);
    digest.finalize().into()
}

/// Verify `signature` over `hash` against a serialized public key.
///
/// Pure and stateless: no key custody involved. Parse failures propagate;
/// a verification failure is `Invalid` ("signature does not match").
pub fn verify(hash: &[u8], signature: &Signature, public_key: &[u8]) -> Result<(), KeyError> {
    let key = PublicKey::parse(public_key)?;
    curve::verify_prehash(
        "verify",
        key.curve(),
        key.x(),
        key.y(),
        hash,
        &signature.r,
        &signature.s,
    )
}
