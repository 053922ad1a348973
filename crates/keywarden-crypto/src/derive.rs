//! Key-derived operations: ECDH-style scalar multiplication for content-key
//! unwrapping, and HKDF subkey derivation.

use hkdf::Hkdf;
use num_bigint::BigUint;
use sha2::Sha256;

use crate::curve::CurveId;
use crate::error::KeyError;
use crate::ring::KeyRing;

impl KeyRing {
    /// Multiply the point `(x, y)` by the private scalar of the key named
    /// by `key_hash`, returning the affine product coordinates.
    ///
    /// The point must lie on `curve`, which must be the named key's own
    /// curve: an off-curve point is rejected with the attack error before
    /// any multiplication happens, because multiplying an adversarial
    /// off-curve point can leak private-key bits through the result.
    pub fn scalar_mult(
        &self,
        key_hash: &[u8],
        curve: CurveId,
        x: &BigUint,
        y: &BigUint,
    ) -> Result<(BigUint, BigUint), KeyError> {
        let op = "scalar_mult";
        let key = self.key_by_hash(op, key_hash)?;
        if key.curve() != curve {
            return Err(KeyError::invalid(
                op,
                format!("key is on {}, not {curve}", key.curve()),
            ));
        }
        key.pair().scalar_mult(op, x, y)
    }

    /// Derive `out_len` bytes of subkey material from the current key.
    ///
    /// HKDF-SHA256 with the canonical private-scalar text as the input key
    /// material and `salt`/`info` as context. Deterministic for fixed
    /// inputs; used to mint short symmetric subkeys without exposing or
    /// reusing the scalar itself.
    pub fn derive_subkey(
        &self,
        salt: &[u8],
        info: &[u8],
        out_len: usize,
    ) -> Result<Vec<u8>, KeyError> {
        let secret = self.current_key().private_text();
        let hkdf = Hkdf::<Sha256>::new(Some(salt), secret.as_bytes());
        let mut out = vec![0u8; out_len];
        hkdf.expand(info, &mut out).map_err(|_| {
            KeyError::invalid("derive_subkey", format!("cannot derive {out_len} bytes"))
        })?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::*;

    const PUB1: &str = "p256\n86754568856409436056886548963722747418663925733852968840719951502625645703023\n55374006944977701639377273685946154797448684848748065688191847332792959379206\n";
    const SEC1: &str = "33732563467898584041325590158539299810645722675081856412396066039103123277092";
    // The second reference key's public point, used as the peer point.
    const X2: &str = "6640270742675236934700552659758623510932789581985633007789325329362331148012";
    const Y2: &str = "68892645101823987570169861213316538980647268870890981023717754447508722389034";

    fn big(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 10).unwrap()
    }

    fn ring() -> KeyRing {
        KeyRing::from_keys(PUB1.as_bytes(), SEC1, b"").unwrap()
    }

    #[test]
    fn scalar_mult_matches_pinned_product() {
        let ring = ring();
        let hash = ring.current_hash();
        let (sx, sy) = ring
            .scalar_mult(hash.as_bytes(), CurveId::P256, &big(X2), &big(Y2))
            .unwrap();
        assert_eq!(
            sx,
            big("57987325786926244269475506077883740539591666467748223085338307390855724769055")
        );
        assert_eq!(
            sy,
            big("77634029990319059770426873363577622999737947986500309546718575706608248389535")
        );
    }

    #[test]
    fn off_curve_point_is_rejected_before_multiplication() {
        let ring = ring();
        let hash = ring.current_hash();
        // (X2, Y2 + 1) fails the curve equation.
        let err = ring
            .scalar_mult(hash.as_bytes(), CurveId::P256, &big(X2), &(big(Y2) + 1u8))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(err.to_string().contains("attack was attempted"), "got: {err}");
    }

    #[test]
    fn unknown_key_hash_is_not_exist() {
        let ring = ring();
        let err = ring
            .scalar_mult(&[0xABu8; 32], CurveId::P256, &big(X2), &big(Y2))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotExist);
    }

    #[test]
    fn curve_mismatch_is_invalid() {
        let ring = ring();
        let hash = ring.current_hash();
        let err = ring
            .scalar_mult(hash.as_bytes(), CurveId::P384, &big(X2), &big(Y2))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[test]
    fn derive_subkey_matches_pinned_vectors() {
        let ring = ring();
        let out = ring.derive_subkey(b"storage-salt", b"subkey-info", 16).unwrap();
        assert_eq!(hex::encode(&out), "4aea0e0930dbcda5d4b1bb24baa9e808");

        let out = ring.derive_subkey(b"storage-salt", b"subkey-info", 32).unwrap();
        assert_eq!(
            hex::encode(&out),
            "4aea0e0930dbcda5d4b1bb24baa9e80823a859c456e94758b07cc786e469a8ee"
        );
    }

    #[test]
    fn derive_subkey_is_deterministic_and_context_sensitive() {
        let ring = ring();
        let a = ring.derive_subkey(b"salt", b"info", 16).unwrap();
        let b = ring.derive_subkey(b"salt", b"info", 16).unwrap();
        assert_eq!(a, b, "same inputs must produce same output");

        let other_salt = ring.derive_subkey(b"salt2", b"info", 16).unwrap();
        let other_info = ring.derive_subkey(b"salt", b"info2", 16).unwrap();
        assert_ne!(a, other_salt);
        assert_ne!(a, other_info);
    }

    #[test]
    fn derive_subkey_rejects_absurd_lengths() {
        let ring = ring();
        // HKDF-SHA256 tops out at 255 * 32 bytes.
        assert!(ring.derive_subkey(b"s", b"i", 255 * 32 + 1).is_err());
        assert!(ring.derive_subkey(b"s", b"i", 255 * 32).is_ok());
    }

    #[test]
    fn formatting_of_private_key_does_not_change_subkeys() {
        let plain = ring().derive_subkey(b"s", b"i", 16).unwrap();
        let commented =
            KeyRing::from_keys(PUB1.as_bytes(), &format!(" {SEC1} # retired\n"), b"")
                .unwrap()
                .derive_subkey(b"s", b"i", 16)
                .unwrap();
        assert_eq!(plain, commented);
    }
}
