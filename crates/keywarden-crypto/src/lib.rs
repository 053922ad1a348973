//! Keywarden key custody and signing.
//!
//! Custodies a user's elliptic-curve key material for the storage platform:
//! parses and validates key files, indexes loaded keys by hash, signs
//! protected content, unwraps symmetric content keys via ECDH-style scalar
//! multiplication, and derives subkeys. Key *generation* is out of scope;
//! keys are only ever loaded from externally supplied material.
//!
//! # Key Lifecycle
//!
//! A [`KeyRing`] is built once from a primary key pair plus an optional
//! archive of retired pairs, and is immutable afterwards:
//!
//! ```text
//! secret.upspinkey  ─┐
//! public.upspinkey  ─┼─▶ KeyRing { current, previous, hash ⇒ LoadedKey }
//! secret2.upspinkey ─┘            │
//!                                 ▼
//!                    rotate() ⇒ new view, same keys, current := previous
//! ```
//!
//! Signing and derivation always act through whichever key the ring
//! currently designates, or through an explicitly named key hash for
//! unwrap requests.
//!
//! # Security
//!
//! Correspondence gate:
//! - A private scalar is accepted only if `D * G` equals the public point
//!   it was loaded with; mismatched pairs never construct
//!
//! Invalid-curve defense:
//! - Scalar multiplication validates the supplied point against the curve
//!   equation first and refuses off-curve points outright, so small-subgroup
//!   ("twist") probes never touch the private scalar
//!
//! Key hygiene:
//! - Private scalar text zeroizes on drop; signing keys zeroize internally
//! - Nothing on the signing or verification paths logs key material
//!
//! # Concurrency
//!
//! Every post-construction operation takes `&self` and is a bounded,
//! synchronous, CPU-bound computation. Rotated views share the key map by
//! reference, so rings can be cloned, rotated, and used from any number of
//! threads without synchronization.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod curve;
mod derive;
pub mod error;
pub mod files;
pub mod ring;
pub mod sign;

pub use codec::{KeyHash, PrivateScalar, PublicKey, key_hash, parse_private_scalar};
pub use curve::CurveId;
pub use error::{ErrorKind, KeyError};
pub use ring::{ARCHIVE_KEY_FILE, KeyRing, LoadedKey, PUBLIC_KEY_FILE, SECRET_KEY_FILE};
pub use sign::{Signature, entry_hash, verify};
