//! Key recovery pipeline.
//!
//! Two entry points mirror generation's two artifact families: salt+brainkey
//! (decode directly, re-derive) and shares (decode each, join, then
//! re-derive). Grounded on the inverse of `generate.rs`'s flow and on
//! `sbk/cli_util.py`'s group-by-group acceptance model, generalized into the
//! [`EntryState`] state machine below.

use crate::error::{Result, SbkError};
use crate::intcode;
use crate::kdf::{self, KdfParams};
use crate::mnemonic;
use crate::params::{self, Parameters};
use crate::rs;
use crate::shamir::{self, RawShare};

/// One token the user entered for a group: either an intcode string or a
/// pair of mnemonic words. Both resolve to the same two decoded bytes; the
/// artifact doesn't care which transport a given group arrived through.
#[derive(Debug, Clone)]
pub enum EnteredGroup {
    Intcode(String),
    Words(String, String),
}

impl EnteredGroup {
    /// Resolve this group to its two bytes, or `None` if the intcode failed
    /// to parse (an unparseable intcode is treated as an erasure, same as a
    /// group the user hasn't entered yet; a bad mnemonic word instead fails
    /// outright with `UnknownWord` since there's no plausible silent
    /// fallback for a typo beyond edit distance 4).
    fn resolve(&self, position: usize) -> Result<(Option<u8>, Option<u8>)> {
        match self {
            EnteredGroup::Intcode(code) => {
                let maybe_codes = [Some(code.clone())];
                let parts = intcode::decode_parts(&maybe_codes, position as u32).map_err(|e| {
                    match e {
                        SbkError::BadOrder { expected, found, .. } => SbkError::BadOrder {
                            position,
                            expected,
                            found,
                        },
                        other => other,
                    }
                })?;
                Ok((parts[0], parts[1]))
            }
            EnteredGroup::Words(a, b) => {
                let (byte_a, byte_b) = decode_word_pair(a, b)?;
                Ok((Some(byte_a), Some(byte_b)))
            }
        }
    }
}

/// Per-artifact entry progress as groups are typed in one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    PartiallyFilled,
    Recoverable,
    Complete,
}

/// Tracks entered groups for one artifact (salt, brainkey, or share) and
/// reports which state the entry is in. `msg_len` is the artifact's
/// plaintext length (before RS padding); the RS block is `2 * padded_len`.
pub struct ArtifactEntry {
    msg_len: usize,
    groups: Vec<Option<EnteredGroup>>,
}

impl ArtifactEntry {
    pub fn new(num_groups: usize, msg_len: usize) -> Self {
        ArtifactEntry {
            msg_len,
            groups: vec![None; num_groups],
        }
    }

    pub fn accept(&mut self, position: usize, group: EnteredGroup) {
        self.groups[position] = Some(group);
    }

    fn padded_len(&self) -> usize {
        if self.msg_len % 2 == 0 {
            self.msg_len
        } else {
            self.msg_len + 1
        }
    }

    fn to_maybe_bytes(&self) -> Result<Vec<rs::MaybePacket>> {
        let mut out = Vec::with_capacity(self.groups.len() * 2);
        for (position, group) in self.groups.iter().enumerate() {
            match group {
                Some(g) => {
                    let (a, b) = g.resolve(position)?;
                    out.push(a);
                    out.push(b);
                }
                None => {
                    out.push(None);
                    out.push(None);
                }
            }
        }
        Ok(out)
    }

    fn filled_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_some()).count()
    }

    pub fn state(&self) -> EntryState {
        let filled = self.filled_count();
        if filled == 0 {
            EntryState::Empty
        } else if filled * 2 < self.msg_len {
            EntryState::PartiallyFilled
        } else if self.try_decode().is_ok() {
            EntryState::Complete
        } else {
            EntryState::Recoverable
        }
    }

    /// Decode the artifact via error-correction decode over whatever
    /// groups have been entered so far.
    pub fn try_decode(&self) -> Result<Vec<u8>> {
        let maybe_bytes = self.to_maybe_bytes()?;
        let decoded = rs::decode(&maybe_bytes, self.padded_len())?;
        Ok(decoded[..self.msg_len].to_vec())
    }
}

/// Recover from salt + brainkey entries, given their already-decoded raw
/// bytes (via [`ArtifactEntry::try_decode`]) and the salt header that
/// carries the KDF parameters.
pub fn from_salt_and_brainkey(
    raw_salt: &[u8],
    raw_brainkey: &[u8],
    salt_header: &[u8; params::SALT_HEADER_LEN],
    wallet_name: &str,
) -> Result<Vec<u8>> {
    let salt_params = params::decode_salt_header(salt_header)?;
    let mut secret = Vec::with_capacity(raw_salt.len() + raw_brainkey.len() + wallet_name.len());
    secret.extend_from_slice(raw_salt);
    secret.extend_from_slice(raw_brainkey);
    secret.extend_from_slice(wallet_name.as_bytes());

    let kdf_params = KdfParams {
        kdf_p: params::KDF_PARALLELISM,
        kdf_m: salt_params.kdf_m,
        kdf_t: salt_params.kdf_t,
    };
    kdf::derive_seed(
        &secret,
        kdf_params,
        crate::generate::WALLET_SEED_LEN,
        &crate::cancel::CancelToken::new(),
    )
}

/// One share entry ready for recovery: its decoded header and raw body.
pub struct ShareEntry {
    pub header: [u8; params::SHARE_HEADER_LEN],
    pub body: Vec<u8>,
}

fn headers_agree(a: &Parameters, b: &Parameters) -> bool {
    a.version == b.version && a.kdf_m == b.kdf_m && a.kdf_t == b.kdf_t && a.sss_t == b.sss_t
}

/// Recover from T share entries (any order — the header carries `sss_x`).
pub fn from_shares(shares: &[ShareEntry], wallet_name: &str) -> Result<Vec<u8>> {
    if shares.is_empty() {
        return Err(SbkError::NotEnoughData {
            needed: 1,
            got: 0,
        });
    }

    let decoded_params: Vec<Parameters> = shares
        .iter()
        .map(|s| params::decode_share_header(&s.header))
        .collect::<Result<Vec<_>>>()?;

    let first = &decoded_params[0];
    if decoded_params.iter().any(|p| !headers_agree(first, p)) {
        return Err(SbkError::SharesFromDifferentSecrets(
            "share headers disagree on version/kdf_m/kdf_t/sss_t".into(),
        ));
    }

    let raw_shares: Vec<RawShare> = shares
        .iter()
        .zip(decoded_params.iter())
        .map(|(s, p)| RawShare {
            x: p.sss_x.expect("share header always carries sss_x"),
            y: s.body.clone(),
        })
        .collect();

    let master_key = shamir::join(&raw_shares, first.sss_t as usize)?;

    let mut secret = Vec::with_capacity(master_key.len() + wallet_name.len());
    secret.extend_from_slice(&master_key);
    secret.extend_from_slice(wallet_name.as_bytes());

    let kdf_params = KdfParams {
        kdf_p: params::KDF_PARALLELISM,
        kdf_m: first.kdf_m,
        kdf_t: first.kdf_t,
    };
    kdf::derive_seed(
        &secret,
        kdf_params,
        crate::generate::WALLET_SEED_LEN,
        &crate::cancel::CancelToken::new(),
    )
}

/// Resolve a two-word mnemonic group to its two decoded bytes.
pub fn decode_word_pair(word_a: &str, word_b: &str) -> Result<(u8, u8)> {
    Ok((mnemonic::decode_word(word_a)?, mnemonic::decode_word(word_b)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::drbg::shareset_coeff_rng;
    use crate::entropy::FixedEntropySource;
    use crate::generate::{self, GenerationRequest, PipelineConfig};

    #[test]
    fn recovering_from_shares_reproduces_original_wallet_seed() {
        let req = GenerationRequest {
            salt_phrase: "test secret",
            wallet_name: "empty",
            shareset_id: 1,
            sss_t: 2,
            sss_n: 3,
            kdf_m: 100,
            kdf_t: 1,
        };
        let config = PipelineConfig::new();
        let entropy = FixedEntropySource(32);
        let artifacts = generate::run(&req, &config, &entropy, &CancelToken::new()).unwrap();

        let shares: Vec<ShareEntry> = artifacts
            .shares
            .iter()
            .map(|s| ShareEntry {
                header: s.header,
                body: s.body.clone(),
            })
            .collect();

        let recovered_seed = from_shares(&shares[..2], req.wallet_name).unwrap();
        assert_eq!(recovered_seed, artifacts.wallet_seed);
    }

    #[test]
    fn recovering_from_salt_and_brainkey_reproduces_original_wallet_seed() {
        let req = GenerationRequest {
            salt_phrase: "test secret",
            wallet_name: "empty",
            shareset_id: 1,
            sss_t: 2,
            sss_n: 3,
            kdf_m: 100,
            kdf_t: 1,
        };
        let config = PipelineConfig::new();
        let entropy = FixedEntropySource(32);
        let artifacts = generate::run(&req, &config, &entropy, &CancelToken::new()).unwrap();

        let recovered_seed = from_salt_and_brainkey(
            &artifacts.raw_salt,
            &artifacts.raw_brainkey,
            &artifacts.salt_header,
            req.wallet_name,
        )
        .unwrap();
        assert_eq!(recovered_seed, artifacts.wallet_seed);
    }

    #[test]
    fn mismatched_share_headers_rejected() {
        let params_a = params::new_share_parameters(100, 1, 1, 2, 3).unwrap();
        let params_b = params::new_share_parameters(200, 1, 2, 2, 3).unwrap();
        let shares = vec![
            ShareEntry {
                header: params::encode_share_header(&params_a),
                body: vec![1, 2, 3],
            },
            ShareEntry {
                header: params::encode_share_header(&params_b),
                body: vec![4, 5, 6],
            },
        ];
        let err = from_shares(&shares, "wallet").unwrap_err();
        assert!(matches!(err, SbkError::SharesFromDifferentSecrets(_)));
    }

    #[test]
    fn entry_state_machine_progresses() {
        let mut entry = ArtifactEntry::new(4, 4);
        assert_eq!(entry.state(), EntryState::Empty);
        entry.accept(0, EnteredGroup::Intcode("000-000".into()));
        assert_eq!(entry.state(), EntryState::PartiallyFilled);
    }

    #[test]
    fn deterministic_coeff_rng_used_by_generation_reproduces_shares() {
        let salt = b"abcdefghijklm";
        let mut a = shareset_coeff_rng(salt, 1);
        let mut b = shareset_coeff_rng(salt, 1);
        let secret = b"fixedsecret12345";
        let sa = shamir::split(secret, 2, 3, &[1, 2, 3], &mut a).unwrap();
        let sb = shamir::split(secret, 2, 3, &[1, 2, 3], &mut b).unwrap();
        assert_eq!(sa, sb);
    }
}
