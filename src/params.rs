//! Bit-packed parameter header codec.
//!
//! Grounded on `sbk/parameters.py`'s `params2bytes`/`bytes2params`: KDF cost
//! parameters are lossily compressed through an exponential code (base
//! 1.125) so a wide practical range of memory/time costs fits a handful of
//! bits, then everything is packed into a little-endian 24-bit field. A
//! salt header only needs the low 16 bits (version + both KDF fields); a
//! share header carries the full 24 bits, adding the share's SSS
//! x-coordinate and threshold.
//!
//! One quirk carried over unchanged from the source: the header never
//! encodes `sss_n` (the total number of shares) at all, only `sss_x` and
//! `sss_t`. A decoded share header's `sss_n` is set equal to `sss_t` as a
//! placeholder; callers that need the real share count must track it
//! out of band (the generation pipeline does, since it's the one that
//! chose `n`).

use crate::error::{Result, SbkError};

pub const MIN_THRESHOLD: u8 = 2;
pub const MAX_THRESHOLD: u8 = 10;
pub const KDF_PARALLELISM: u32 = 128;
pub const SALT_HEADER_LEN: usize = 2;
pub const SHARE_HEADER_LEN: usize = 3;
pub const CURRENT_VERSION: u8 = 0;

const EXP_BASE: f64 = 1.125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    pub version: u8,
    pub kdf_p: u32,
    pub kdf_m: u32,
    pub kdf_t: u32,
    /// `None` for a salt-only header; share headers always carry `Some`.
    pub sss_x: Option<u8>,
    pub sss_t: u8,
    pub sss_n: u8,
}

fn param_coeffs(b: f64) -> (i64, i64) {
    let s = (1.0 / (b - 1.0)) as i64;
    let o = 1 - s;
    (s, o)
}

fn param_exp(n: u32, b: f64) -> u32 {
    let (s, o) = param_coeffs(b);
    (b.powi(n as i32) * s as f64 + o as f64).round() as u32
}

fn param_log(v: f64, b: f64) -> u32 {
    let (s, o) = param_coeffs(b);
    let n = ((v - o as f64) / s as f64).ln() / b.ln();
    n.round().clamp(0.0, u32::MAX as f64) as u32
}

/// Quantize `(kdf_m, kdf_t)` through the exponential code and back, so the
/// values stored in a [`Parameters`] are always exactly representable in
/// the header: decoding an encoded header and re-encoding it is a no-op.
pub fn quantize_kdf_params(kdf_m: u32, kdf_t: u32) -> (u32, u32) {
    let kdf_m_enc = param_log(kdf_m as f64 / 100.0, EXP_BASE);
    let kdf_t_enc = param_log(kdf_t as f64, EXP_BASE);
    (param_exp(kdf_m_enc, EXP_BASE) * 100, param_exp(kdf_t_enc, EXP_BASE))
}

/// Build a validated, already-quantized share [`Parameters`].
pub fn new_share_parameters(kdf_m: u32, kdf_t: u32, sss_x: u8, sss_t: u8, sss_n: u8) -> Result<Parameters> {
    if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&sss_t) || sss_t > sss_n {
        return Err(SbkError::InvalidScheme {
            t: sss_t as usize,
            n: sss_n as usize,
        });
    }
    let (kdf_m, kdf_t) = quantize_kdf_params(kdf_m, kdf_t);
    Ok(Parameters {
        version: CURRENT_VERSION,
        kdf_p: KDF_PARALLELISM,
        kdf_m,
        kdf_t,
        sss_x: Some(sss_x),
        sss_t,
        sss_n,
    })
}

/// Build a validated, already-quantized salt-only [`Parameters`] (no SSS
/// fields carried in the wire header).
pub fn new_salt_parameters(kdf_m: u32, kdf_t: u32) -> Parameters {
    let (kdf_m, kdf_t) = quantize_kdf_params(kdf_m, kdf_t);
    Parameters {
        version: CURRENT_VERSION,
        kdf_p: KDF_PARALLELISM,
        kdf_m,
        kdf_t,
        sss_x: None,
        sss_t: 2,
        sss_n: 2,
    }
}

fn pack(params: &Parameters) -> u32 {
    let kdf_m_enc = param_log(params.kdf_m as f64 / 100.0, EXP_BASE);
    let kdf_t_enc = param_log(params.kdf_t as f64, EXP_BASE);
    let sss_x_enc = params.sss_x.map(|x| x.saturating_sub(1)).unwrap_or(0) as u32;
    let sss_t_enc = params.sss_t.saturating_sub(2) as u32;

    (params.version as u32 & 0b1111)
        | ((kdf_m_enc & 0b0011_1111) << 4)
        | ((kdf_t_enc & 0b0011_1111) << 10)
        | ((sss_x_enc & 0b0001_1111) << 16)
        | ((sss_t_enc & 0b0000_0111) << 21)
}

/// Encode a salt header: low 16 bits of the packed field (version + both
/// KDF fields; the SSS fields live past bit 15 and are dropped).
pub fn encode_salt_header(params: &Parameters) -> [u8; SALT_HEADER_LEN] {
    let encoded = pack(params);
    [(encoded & 0xFF) as u8, ((encoded >> 8) & 0xFF) as u8]
}

/// Encode a share header: all 24 packed bits.
pub fn encode_share_header(params: &Parameters) -> [u8; SHARE_HEADER_LEN] {
    let encoded = pack(params);
    [
        (encoded & 0xFF) as u8,
        ((encoded >> 8) & 0xFF) as u8,
        ((encoded >> 16) & 0xFF) as u8,
    ]
}

fn unpack_kdf(encoded: u32) -> Result<(u8, u32, u32)> {
    let version = (encoded & 0b1111) as u8;
    if version != CURRENT_VERSION {
        return Err(SbkError::UnsupportedVersion {
            found: version,
            expected: CURRENT_VERSION,
        });
    }
    let kdf_m_enc = (encoded >> 4) & 0b0011_1111;
    let kdf_t_enc = (encoded >> 10) & 0b0011_1111;
    let kdf_m = param_exp(kdf_m_enc, EXP_BASE) * 100;
    let kdf_t = param_exp(kdf_t_enc, EXP_BASE);
    Ok((version, kdf_m, kdf_t))
}

/// Decode a 2-byte salt header.
pub fn decode_salt_header(data: &[u8; SALT_HEADER_LEN]) -> Result<Parameters> {
    let encoded = data[0] as u32 | ((data[1] as u32) << 8);
    let (version, kdf_m, kdf_t) = unpack_kdf(encoded)?;
    Ok(Parameters {
        version,
        kdf_p: KDF_PARALLELISM,
        kdf_m,
        kdf_t,
        sss_x: None,
        sss_t: 2,
        sss_n: 2,
    })
}

/// Decode a 3-byte share header.
pub fn decode_share_header(data: &[u8; SHARE_HEADER_LEN]) -> Result<Parameters> {
    let encoded = data[0] as u32 | ((data[1] as u32) << 8) | ((data[2] as u32) << 16);
    let (version, kdf_m, kdf_t) = unpack_kdf(encoded)?;
    let sss_x_enc = ((encoded >> 16) & 0b0001_1111) as u8;
    let sss_t_enc = ((encoded >> 21) & 0b0000_0111) as u8;
    let sss_t = sss_t_enc + 2;
    Ok(Parameters {
        version,
        kdf_p: KDF_PARALLELISM,
        kdf_m,
        kdf_t,
        sss_x: Some(sss_x_enc + 1),
        sss_t,
        sss_n: sss_t,
    })
}
