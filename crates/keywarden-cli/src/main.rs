//! Keywarden operator binary.
//!
//! # Usage
//!
//! ```bash
//! # Identify a public key
//! keywarden keyhash public.upspinkey
//!
//! # Inspect a key directory
//! keywarden status ~/.keys
//!
//! # Sign a file's SHA-256 digest and verify the detached signature
//! keywarden sign --dir ~/.keys report.pdf > report.sig
//! keywarden verify --key public.upspinkey --signature report.sig report.pdf
//! ```

#![allow(clippy::print_stdout, reason = "command-line output")]

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use keywarden_crypto::{KeyRing, Signature, key_hash, verify};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keywarden key directory tooling
#[derive(Parser, Debug)]
#[command(name = "keywarden")]
#[command(about = "Inspect, sign with, and verify against Keywarden key directories")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the hash of a serialized public key file
    Keyhash {
        /// Path to a public key file
        public: PathBuf,
    },

    /// Show the current and previous key hashes of a key directory
    Status {
        /// Key directory holding secret.upspinkey and friends
        dir: PathBuf,
    },

    /// Sign a file's SHA-256 digest with the directory's current key
    Sign {
        /// Key directory holding secret.upspinkey and friends
        #[arg(short, long)]
        dir: PathBuf,
        /// File to sign
        file: PathBuf,
    },

    /// Verify a detached signature against a public key file
    Verify {
        /// Path to a public key file
        #[arg(short, long)]
        key: PathBuf,
        /// Detached signature: R and S, one decimal integer per line
        #[arg(short, long)]
        signature: PathBuf,
        /// File the signature covers
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    match args.command {
        Command::Keyhash { public } => {
            let serialized = std::fs::read(&public)?;
            println!("{}", key_hash(&serialized));
        },
        Command::Status { dir } => {
            let ring = KeyRing::from_dir(&dir)?;
            println!("keys     {}", ring.len());
            println!("current  {} ({})", ring.current_hash(), ring.current_public_key().curve());
            println!("previous {}", ring.previous_hash());
        },
        Command::Sign { dir, file } => {
            let ring = KeyRing::from_dir(&dir)?;
            let digest = Sha256::digest(std::fs::read(&file)?);
            let signature = ring.sign(&digest)?;
            tracing::info!(key = %ring.current_hash(), "signed {}", file.display());
            println!("{}", signature.r);
            println!("{}", signature.s);
        },
        Command::Verify { key, signature, file } => {
            let public = std::fs::read(&key)?;
            let signature = read_signature(&signature)?;
            let digest = Sha256::digest(std::fs::read(&file)?);
            verify(&digest, &signature, &public)?;
            println!("signature verifies");
        },
    }
    Ok(())
}

/// Parse a detached signature file: R and S as decimal integers, one per
/// line.
fn read_signature(path: &Path) -> Result<Signature, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text.lines();
    let (Some(r), Some(s)) = (lines.next(), lines.next()) else {
        return Err(format!("{}: expected R and S, one per line", path.display()).into());
    };
    let parse = |field: &str| {
        BigUint::parse_bytes(field.trim().as_bytes(), 10)
            .ok_or_else(|| format!("{}: {field:?} is not a decimal integer", path.display()))
    };
    Ok(Signature { r: parse(r)?, s: parse(s)? })
}
