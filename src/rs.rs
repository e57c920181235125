//! Reed-Solomon-style forward error correction over GF(2^8).
//!
//! Grounded on `sbk/ecc_rs.py`: message bytes are treated as the y-values of
//! a polynomial sampled at `x = 0, 1, ..., len(msg)-1`; ECC bytes are that
//! same polynomial evaluated at further x-coordinates. Decoding does not
//! attempt algebraic syndrome decoding — with exactly `msg_len` points
//! present it interpolates directly, and with more than `msg_len` points
//! (some corrupt) it does majority-vote recovery over sampled `msg_len`-size
//! subsets, mirroring `ecc_rs.py::decode_packets`'s early-exit/dominance
//! thresholds.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::Serialize;

use crate::error::{Result, SbkError};
use crate::poly::{self, Point};

/// A received packet; `None` marks an erasure. Position in the slice is the
/// x-coordinate.
pub type MaybePacket = Option<u8>;

/// Diagnostic summary of one [`decode`] call, for callers (the CLI) that
/// want to report how much redundancy a recovery actually used rather than
/// just the recovered bytes.
#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    pub present: usize,
    pub msg_len: usize,
    pub exact: bool,
    pub candidates_tried: usize,
    pub top_votes: usize,
    pub runner_up_votes: usize,
}

fn n_choose_r(n: u64, r: u64) -> u64 {
    if r > n {
        return 0;
    }
    let r = r.min(n - r);
    let mut numer: u128 = 1;
    let mut denom: u128 = 1;
    for i in 0..r {
        numer *= (n - i) as u128;
        denom *= (i + 1) as u128;
    }
    (numer / denom) as u64
}

/// Encode `msg` to a systematic block `msg || ecc`, where the `ecc_len`
/// bytes are the same polynomial evaluated past the end of the message.
/// Inputs shorter than two bytes are padded/duplicated first, since at
/// least two points are needed to define a polynomial.
pub fn encode(msg: &[u8], ecc_len: usize) -> Vec<u8> {
    if ecc_len == 0 {
        return msg.to_vec();
    }

    let padded: Vec<u8> = if msg.len() < 2 {
        if msg.is_empty() {
            vec![0, 0]
        } else {
            vec![msg[0], msg[0]]
        }
    } else {
        msg.to_vec()
    };

    let data_points: Vec<Point> = padded
        .iter()
        .enumerate()
        .map(|(x, &y)| Point::new(x as u8, y))
        .collect();

    let mut block = msg.to_vec();
    // ECC is computed over the (possibly padded) data points so a short
    // original message still yields a well-defined polynomial, but the
    // systematic prefix written out is the caller's original `msg`.
    for x in padded.len()..(padded.len() + ecc_len) {
        let y = poly::interpolate(&data_points, x as u8).expect("degree checked above");
        block.push(y);
    }
    block
}

fn iter_subset_indexes(num_points: usize, msg_len: usize) -> Vec<Vec<usize>> {
    let all: Vec<usize> = (0..num_points).collect();
    if msg_len == num_points {
        return vec![all];
    }

    let combos = n_choose_r(num_points as u64, msg_len as u64);
    let mut rng = thread_rng();

    if combos < 1000 {
        let mut result = k_combinations(num_points, msg_len);
        result.shuffle(&mut rng);
        result
    } else {
        let cap = (combos / 3).max(1) as usize;
        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::with_capacity(cap);
        let mut attempts = 0usize;
        // Sampling without replacement from a huge combination space: retry
        // on collision, bounded so a pathological RNG can't loop forever.
        while result.len() < cap && attempts < cap * 20 {
            attempts += 1;
            let mut sample = all.clone();
            sample.shuffle(&mut rng);
            sample.truncate(msg_len);
            sample.sort_unstable();
            if seen.insert(sample.clone()) {
                result.push(sample);
            }
        }
        result
    }
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

/// Recover the `msg_len`-byte message from `packets` (length `msg_len +
/// ecc_len`, `None` entries are erasures). Exactly `msg_len` present packets
/// interpolate directly; more than that runs majority-vote recovery;
/// fewer fails with [`SbkError::NotEnoughData`]. Lagrange interpolation
/// needs at least two points, so `msg_len == 1` fails with
/// [`SbkError::DegeneratePoints`] — every caller in this crate pads to an
/// even length of at least two bytes before calling `decode`, the same way
/// [`encode`] pads its interpolation basis internally.
pub fn decode(packets: &[MaybePacket], msg_len: usize) -> Result<Vec<u8>> {
    decode_with_report(packets, msg_len).map(|(msg, _)| msg)
}

/// Same as [`decode`], but also returns a [`DecodeReport`] describing how
/// the recovery went (exact interpolation vs. how many candidate subsets
/// were tried and by what margin the winner beat the runner-up).
pub fn decode_with_report(
    packets: &[MaybePacket],
    msg_len: usize,
) -> Result<(Vec<u8>, DecodeReport)> {
    if msg_len == 1 {
        return Err(SbkError::DegeneratePoints(
            "decode needs at least two message bytes to interpolate; pad to an even length \
             of at least two before encoding"
                .into(),
        ));
    }

    let present: Vec<Point> = packets
        .iter()
        .enumerate()
        .filter_map(|(x, y)| y.map(|y| Point::new(x as u8, y)))
        .collect();

    if present.len() < msg_len {
        return Err(SbkError::NotEnoughData {
            needed: msg_len,
            got: present.len(),
        });
    }

    let msg_x_coords: Vec<u8> = (0..msg_len as u8).collect();

    if present.len() == msg_len {
        let mut msg = Vec::with_capacity(msg_len);
        for &x in &msg_x_coords {
            msg.push(poly::interpolate(&present, x)?);
        }
        let report = DecodeReport {
            present: present.len(),
            msg_len,
            exact: true,
            candidates_tried: 1,
            top_votes: 1,
            runner_up_votes: 0,
        };
        return Ok((msg, report));
    }

    let mut candidates: HashMap<Vec<u8>, usize> = HashMap::new();
    let subsets = iter_subset_indexes(present.len(), msg_len);

    for (sample_num, idxs) in subsets.iter().enumerate() {
        let sample: Vec<Point> = idxs.iter().map(|&i| present[i]).collect();
        let mut msg = Vec::with_capacity(msg_len);
        for &x in &msg_x_coords {
            msg.push(poly::interpolate(&sample, x)?);
        }
        *candidates.entry(msg).or_insert(0) += 1;

        if (sample_num + 1) % 20 == 0 {
            if let Some((verdict, top_votes, runner_up_votes)) = dominant_candidate(&candidates, 10) {
                let report = DecodeReport {
                    present: present.len(),
                    msg_len,
                    exact: false,
                    candidates_tried: sample_num + 1,
                    top_votes,
                    runner_up_votes,
                };
                return Ok((verdict, report));
            }
        }
    }

    if candidates.len() == 1 {
        let (msg, votes) = candidates.into_iter().next().unwrap();
        let report = DecodeReport {
            present: present.len(),
            msg_len,
            exact: false,
            candidates_tried: subsets.len(),
            top_votes: votes,
            runner_up_votes: 0,
        };
        return Ok((msg, report));
    }

    if let Some((verdict, top_votes, runner_up_votes)) = dominant_candidate(&candidates, 2) {
        let report = DecodeReport {
            present: present.len(),
            msg_len,
            exact: false,
            candidates_tried: subsets.len(),
            top_votes,
            runner_up_votes,
        };
        return Ok((verdict, report));
    }

    let mut tally: Vec<(Vec<u8>, usize)> = candidates.into_iter().collect();
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    let (top, top_n) = tally.first().cloned().unwrap_or((Vec::new(), 0));
    let runner_up = tally.get(1).map(|(_, n)| *n).unwrap_or(0);
    let _ = top;
    Err(SbkError::Corrupt {
        top: top_n,
        runner_up,
    })
}

fn dominant_candidate(
    candidates: &HashMap<Vec<u8>, usize>,
    margin: usize,
) -> Option<(Vec<u8>, usize, usize)> {
    let mut tally: Vec<(&Vec<u8>, &usize)> = candidates.iter().collect();
    tally.sort_by(|a, b| b.1.cmp(a.1));
    if tally.len() == 1 {
        return Some((tally[0].0.clone(), *tally[0].1, 0));
    }
    let (top, top_n) = tally[0];
    let (_, runner_n) = tally[1];
    if *top_n > runner_n * margin {
        Some((top.clone(), *top_n, *runner_n))
    } else {
        None
    }
}
