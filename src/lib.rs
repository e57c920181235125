//! Air-gapped brainkey/salt wallet-seed generation, Shamir splitting, and
//! recovery, with intcode and mnemonic transport encodings for writing
//! artifacts on paper.
//!
//! [`generate::run`] produces a salt, a brainkey, and a set of Shamir
//! shares from a memorized salt phrase plus OS entropy; [`recover`]
//! inverts that flow from whichever artifacts the user has on hand.
//! Everything in between — Galois-field arithmetic ([`gf`], [`poly`]),
//! secret splitting ([`shamir`]), forward error correction ([`rs`]),
//! transport codecs ([`intcode`], [`mnemonic`]), the wire parameter header
//! ([`params`]), and KDF orchestration ([`kdf`]) — is exposed as a
//! standalone module so each piece can be tested and reasoned about on its
//! own.

#![forbid(unsafe_code)]

pub mod cancel;
pub mod crypto;
pub mod display;
pub mod drbg;
pub mod entropy;
pub mod error;
pub mod generate;
pub mod gf;
pub mod intcode;
pub mod kdf;
pub mod mnemonic;
pub mod params;
pub mod poly;
pub mod recover;
pub mod rs;
pub mod shamir;

pub use error::{Result, SbkError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
