//! Byte-wise Shamir's Secret Sharing over GF(2^8).
//!
//! Grounded on `sbk/shamir.py`'s `_split_data_gf_256`/`_join_gf_256`: each
//! byte of the secret gets its own independent degree-`t-1` polynomial, all
//! `n` shares are evaluated from the same x-coordinate set, and a share's
//! body is the concatenation of that x-coordinate's y-value across every
//! byte position. The `sharks` crate produces a single share format with
//! an embedded length prefix that doesn't match this crate's
//! header-carries-x-and-t layout, so the split/join logic here is
//! original, not a wrapper around `sharks`.

use rand_core::RngCore;

use crate::error::{Result, SbkError};
use crate::poly::{self, Point};

pub const MIN_THRESHOLD: usize = 2;
pub const MAX_THRESHOLD: usize = 10;

/// One share's raw body: `(x, [y_0..y_{len-1}])`. The x-coordinate is also
/// carried in the artifact's header, but is needed here directly
/// to interpolate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawShare {
    pub x: u8,
    pub y: Vec<u8>,
}

fn validate_scheme(t: usize, n: usize) -> Result<()> {
    if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&t) || t > n {
        return Err(SbkError::InvalidScheme { t, n });
    }
    Ok(())
}

/// Split `secret` into `n` shares at threshold `t`, using exactly the given
/// `x_coords` (must be `n` distinct non-zero values). Coefficients above the
/// secret's own byte (c0) are drawn from `rng`, which callers seed
/// deterministically from the raw salt and shareset id (see [`crate::drbg`]).
pub fn split(
    secret: &[u8],
    t: usize,
    n: usize,
    x_coords: &[u8],
    rng: &mut dyn RngCore,
) -> Result<Vec<RawShare>> {
    validate_scheme(t, n)?;
    if x_coords.len() != n {
        return Err(SbkError::InvalidScheme { t, n });
    }
    {
        let mut seen = [false; 256];
        for &x in x_coords {
            if x == 0 || seen[x as usize] {
                return Err(SbkError::InvalidScheme { t, n });
            }
            seen[x as usize] = true;
        }
    }

    let mut shares: Vec<RawShare> = x_coords
        .iter()
        .map(|&x| RawShare {
            x,
            y: vec![0u8; secret.len()],
        })
        .collect();

    let mut coeffs = vec![0u8; t];
    for (i, &secret_byte) in secret.iter().enumerate() {
        coeffs[0] = secret_byte;
        let mut rand_buf = vec![0u8; t - 1];
        rng.fill_bytes(&mut rand_buf);
        coeffs[1..].copy_from_slice(&rand_buf);

        for share in shares.iter_mut() {
            share.y[i] = poly::eval(&coeffs, share.x);
        }
    }

    self_check_invariant(secret, &shares, t)?;
    Ok(shares)
}

/// Re-join every size-`t` subset of `shares` and confirm each recovers the
/// same secret — the split code self-checks this
/// invariant during generation by re-joining enumerated subsets".
fn self_check_invariant(secret: &[u8], shares: &[RawShare], t: usize) -> Result<()> {
    for subset in k_combinations(shares.len(), t) {
        let picked: Vec<&RawShare> = subset.iter().map(|&i| &shares[i]).collect();
        let recovered = join(&picked.into_iter().cloned().collect::<Vec<_>>(), t)?;
        if recovered != secret {
            return Err(SbkError::InternalRoundTripFailure(
                "shamir split self-check: subset did not recover secret".into(),
            ));
        }
    }
    Ok(())
}

fn k_combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![vec![]];
    }
    if k > n {
        return vec![];
    }
    let mut result = Vec::new();
    let mut combo: Vec<usize> = (0..k).collect();
    loop {
        result.push(combo.clone());
        let mut i = k;
        loop {
            if i == 0 {
                return result;
            }
            i -= 1;
            if combo[i] != i + n - k {
                break;
            }
        }
        combo[i] += 1;
        for j in (i + 1)..k {
            combo[j] = combo[j - 1] + 1;
        }
    }
}

/// Reconstruct the secret from `shares`. All shares must have equal body
/// length and distinct x-coordinates; fewer than `t` shares, or duplicate
/// x-coordinates, fail rather than returning a meaningless value.
pub fn join(shares: &[RawShare], t: usize) -> Result<Vec<u8>> {
    if shares.len() < t {
        return Err(SbkError::NotEnoughData {
            needed: t,
            got: shares.len(),
        });
    }
    let body_len = shares[0].y.len();
    if shares.iter().any(|s| s.y.len() != body_len) {
        return Err(SbkError::InvalidScheme {
            t,
            n: shares.len(),
        });
    }
    {
        let mut seen = [false; 256];
        for s in shares {
            if seen[s.x as usize] {
                return Err(SbkError::InvalidScheme {
                    t,
                    n: shares.len(),
                });
            }
            seen[s.x as usize] = true;
        }
    }

    let mut secret = vec![0u8; body_len];
    for i in 0..body_len {
        let points: Vec<Point> = shares.iter().map(|s| Point::new(s.x, s.y[i])).collect();
        secret[i] = poly::interpolate(&points, 0)?;
    }
    Ok(secret)
}
