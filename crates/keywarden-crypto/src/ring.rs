//! The hash-indexed rotating key store.
//!
//! A [`KeyRing`] is built once from a primary key pair plus an optional
//! archive of retired pairs, and never mutated afterwards. The loaded keys
//! live in a shared map; rotation allocates a new two-pointer view over the
//! same map, so any number of threads can sign, derive, and look up keys
//! against any view without synchronization.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::codec::{self, KeyHash, PrivateScalar, PublicKey};
use crate::curve::{CurveId, EcdsaKeyPair};
use crate::error::{ErrorKind, KeyError};
use crate::files;

/// File holding the primary private scalar.
pub const SECRET_KEY_FILE: &str = "secret.upspinkey";
/// File holding the primary public key.
pub const PUBLIC_KEY_FILE: &str = "public.upspinkey";
/// Optional file holding concatenated archive blocks of retired key pairs.
pub const ARCHIVE_KEY_FILE: &str = "secret2.upspinkey";

/// Header prefix of a 5-line archive block.
const ARCHIVE_MARKER: &str = "# EE ";

/// One fully validated key: public text, private scalar, and the ECDSA key
/// pair derived from them. Immutable once constructed.
pub struct LoadedKey {
    hash: KeyHash,
    public: PublicKey,
    private: PrivateScalar,
}

impl LoadedKey {
    /// Validate and bind a public key to its private scalar text.
    pub fn new(public: PublicKey, private: &str) -> Result<Self, KeyError> {
        let private = codec::parse_private_scalar(&public, private)?;
        Ok(Self { hash: public.hash(), public, private })
    }

    /// Stable identifier of this key.
    pub fn hash(&self) -> KeyHash {
        self.hash
    }

    /// The public half.
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// Curve this key lives on.
    pub fn curve(&self) -> CurveId {
        self.public.curve()
    }

    pub(crate) fn pair(&self) -> &EcdsaKeyPair {
        self.private.pair()
    }

    pub(crate) fn private_text(&self) -> &str {
        self.private.text()
    }
}

/// Immutable custody object: one or more loaded keys plus current/previous
/// pointers into them.
///
/// Both pointers always resolve in the key map. Cloning and
/// [`rotate`](Self::rotate) are O(1); the map itself is shared.
#[derive(Clone)]
pub struct KeyRing {
    current: KeyHash,
    previous: KeyHash,
    keys: Arc<HashMap<KeyHash, LoadedKey>>,
}

impl KeyRing {
    /// Build a ring from serialized key material.
    ///
    /// `public` and `private` are the primary pair; `archive` holds zero or
    /// more 5-line blocks of retired pairs (header line starting with
    /// `"# EE "`, then curve name, X, Y, D). Archive processing stops
    /// silently at the first malformed *header*, but a malformed key *body*
    /// after a valid header fails the whole construction. After processing,
    /// `previous` points at the last archived key that parsed and was not a
    /// duplicate; with no archive it equals `current`.
    pub fn from_keys(public: &[u8], private: &str, archive: &[u8]) -> Result<Self, KeyError> {
        let op = "KeyRing::from_keys";
        let primary = LoadedKey::new(PublicKey::parse(public)?, private)?;
        let current = primary.hash();
        let mut previous = current;
        let mut keys = HashMap::new();
        keys.insert(current, primary);

        let archive = std::str::from_utf8(archive)
            .map_err(|_| KeyError::invalid(op, "archive is not valid UTF-8"))?;
        let lines: Vec<&str> = archive.split('\n').collect();
        let mut i = 0;
        while lines.len() - i >= 5 && lines[i].starts_with(ARCHIVE_MARKER) {
            let serialized = format!("{}\n{}\n{}\n", lines[i + 1], lines[i + 2], lines[i + 3]);
            // The scalar line may carry trailing commentary after a space.
            let scalar = lines[i + 4].split(' ').next().unwrap_or(lines[i + 4]);
            let entry = LoadedKey::new(PublicKey::parse(serialized.as_bytes())?, scalar)?;
            let hash = entry.hash();
            if !keys.contains_key(&hash) {
                keys.insert(hash, entry);
                previous = hash;
            }
            i += 5;
        }

        tracing::debug!(keys = keys.len(), current = %current, "key ring constructed");
        Ok(Self { current, previous, keys: Arc::new(keys) })
    }

    /// Build a ring from the well-known files in `dir`:
    /// [`SECRET_KEY_FILE`], [`PUBLIC_KEY_FILE`], and optionally
    /// [`ARCHIVE_KEY_FILE`]. Carriage returns are stripped from all three
    /// before parsing. A missing archive file is not an error.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, KeyError> {
        let op = "KeyRing::from_dir";
        let dir = dir.as_ref();
        let private = files::read(op, dir, SECRET_KEY_FILE)?;
        let private = String::from_utf8(private)
            .map_err(|_| KeyError::invalid(op, "private key file is not valid UTF-8"))?;
        let public = files::read(op, dir, PUBLIC_KEY_FILE)?;
        let archive = match files::read(op, dir, ARCHIVE_KEY_FILE) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotExist => Vec::new(),
            Err(err) => return Err(err),
        };
        Self::from_keys(
            &strip_carriage_returns(&public),
            &private.replace('\r', ""),
            &strip_carriage_returns(&archive),
        )
    }

    /// Rotate to the previous key: a new view with `current` set to
    /// `previous` over the same key map. Pure and idempotent; the receiver
    /// is untouched.
    pub fn rotate(&self) -> Self {
        Self { current: self.previous, previous: self.previous, keys: Arc::clone(&self.keys) }
    }

    /// Hash of the key that signs and derives.
    pub fn current_hash(&self) -> KeyHash {
        self.current
    }

    /// Hash of the key a rotation would switch to.
    pub fn previous_hash(&self) -> KeyHash {
        self.previous
    }

    /// Public key of the current key.
    pub fn current_public_key(&self) -> &PublicKey {
        self.current_key().public()
    }

    /// Look up a public key by its raw wire hash.
    ///
    /// An empty hash is `Invalid`; anything that does not match a loaded
    /// key is `NotExist`.
    pub fn public_key_by_hash(&self, hash: &[u8]) -> Result<&PublicKey, KeyError> {
        let op = "public_key_by_hash";
        if hash.is_empty() {
            return Err(KeyError::invalid(op, "empty key hash"));
        }
        KeyHash::from_bytes(hash)
            .and_then(|h| self.keys.get(&h))
            .map(LoadedKey::public)
            .ok_or_else(|| KeyError::NotFound { op, what: hex_of(hash) })
    }

    /// Number of loaded keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the ring holds no keys. Cannot happen for a constructed
    /// ring, which always holds at least the primary key.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn current_key(&self) -> &LoadedKey {
        match self.keys.get(&self.current) {
            Some(key) => key,
            // Construction and rotation both keep the pointers inside the map.
            None => unreachable!("current hash always resolves in the key map"),
        }
    }

    pub(crate) fn key_by_hash(&self, op: &'static str, hash: &[u8]) -> Result<&LoadedKey, KeyError> {
        KeyHash::from_bytes(hash)
            .and_then(|h| self.keys.get(&h))
            .ok_or_else(|| KeyError::NotFound { op, what: hex_of(hash) })
    }
}

// Manual impl: hashes only, never the loaded key material.
impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("current", &self.current.to_string())
            .field("previous", &self.previous.to_string())
            .field("keys", &self.keys.len())
            .finish()
    }
}

fn strip_carriage_returns(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().copied().filter(|&b| b != b'\r').collect()
}

fn hex_of(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
