//! Error taxonomy for the generation/recovery pipelines.
//!
//! Mirrors the three classes from the design: user-correctable codes the
//! caller can re-prompt for, environmental codes worth a retry/backoff, and
//! fatal/integrity codes that must never be followed by disclosing a secret.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SbkError {
    #[error("OS entropy pool below floor of {floor} bytes after waiting {waited_secs}s")]
    InsufficientEntropy { floor: usize, waited_secs: u64 },

    #[error("unsupported header version: {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    #[error("intcode at position {position}: bad order index {found} (expected {expected})")]
    BadOrder {
        position: usize,
        expected: u8,
        found: u8,
    },

    #[error("mnemonic word {word:?} has no wordlist neighbor within edit distance 4")]
    UnknownWord { word: String },

    #[error("decode needs at least {needed} groups, got {got}")]
    NotEnoughData { needed: usize, got: usize },

    #[error("no dominant candidate recovered RS voting ({top} vs {runner_up} votes)")]
    Corrupt { top: usize, runner_up: usize },

    #[error("shares disagree on header fields: {0}")]
    SharesFromDifferentSecrets(String),

    #[error("invalid threshold scheme: t={t}, n={n}")]
    InvalidScheme { t: usize, n: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal round-trip self-check failed before disclosure: {0}")]
    InternalRoundTripFailure(String),

    #[error("degenerate polynomial input: {0}")]
    DegeneratePoints(String),

    #[error("argon2 failure: {0}")]
    Kdf(String),
}

pub type Result<T> = std::result::Result<T, SbkError>;

impl SbkError {
    /// True for errors where the caller should re-prompt the same artifact.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            SbkError::BadOrder { .. }
                | SbkError::UnknownWord { .. }
                | SbkError::NotEnoughData { .. }
                | SbkError::Corrupt { .. }
                | SbkError::InvalidScheme { .. }
        )
    }

    /// True for errors where the caller should back off and retry or abort.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            SbkError::InsufficientEntropy { .. } | SbkError::Cancelled
        )
    }

    /// True for errors after which no secret may be disclosed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SbkError::InternalRoundTripFailure(_)
                | SbkError::UnsupportedVersion { .. }
                | SbkError::SharesFromDifferentSecrets(_)
        )
    }
}
