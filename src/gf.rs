//! GF(2^8) arithmetic (Rijndael's field, reducing polynomial 0x11B).
//!
//! Addition/subtraction are XOR. Multiplication and inversion go through
//! precomputed exp/log tables built once from generator 3, the same
//! table-driven approach `sbk/gf_util.py` uses (there: `gf_lut.MUL_LUT`,
//! `gf_lut.MUL_INVERSE_LUT`, lazily populated; here: built eagerly via
//! `std::sync::OnceLock` so the tables are process-wide immutable, per the
//! design-notes guidance against mutable package-level caches).

use std::sync::OnceLock;

const REDUCING_POLY: u16 = 0x11B;
const GENERATOR: u8 = 3;

struct Tables {
    exp: [u8; 512],
    log: [u8; 256],
    inv: [u8; 256],
}

fn build_tables() -> Tables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];

    // Walk the multiplicative group generated by 3: exp[i] = 3^i, reducing
    // mod the Rijndael polynomial on overflow past the 8th bit.
    let mut p: u8 = 1;
    for i in 0..255usize {
        exp[i] = p;
        log[p as usize] = i as u8;

        let hi_set = p & 0x80 != 0;
        let mut doubled = (p as u16) << 1;
        if hi_set {
            doubled ^= REDUCING_POLY;
        }
        p = (doubled as u8) ^ p; // xtime(p) XOR p == p * 3
        let _ = GENERATOR;
    }
    for i in 255..512 {
        exp[i] = exp[i - 255];
    }

    let mut inv = [0u8; 256];
    for a in 1..256usize {
        if a == 1 {
            inv[a] = 1;
            continue;
        }
        let l = log[a] as usize;
        let inv_log = (255 - l) % 255;
        inv[a] = exp[inv_log];
    }

    Tables { exp, log, inv }
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(build_tables)
}

/// `a + b` in GF(2^8), i.e. XOR.
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// `a - b` in GF(2^8); identical to `add` since characteristic is 2.
#[inline]
pub fn sub(a: u8, b: u8) -> u8 {
    a ^ b
}

/// `a * b` in GF(2^8) via exp/log tables.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    let li = t.log[a as usize] as usize + t.log[b as usize] as usize;
    t.exp[li]
}

/// Multiplicative inverse; by convention `inverse(0) == 0` for callers that
/// would otherwise need to special-case zero.
#[inline]
pub fn inverse(a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    tables().inv[a as usize]
}

/// `a / b` in GF(2^8). `b` must be non-zero.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    mul(a, inverse(b))
}

/// `a^e` in GF(2^8) by repeated multiplication (exponents here are always
/// small — at most `degree`, so a square-and-multiply ladder isn't worth it).
pub fn pow(a: u8, e: u32) -> u8 {
    let mut result = 1u8;
    for _ in 0..e {
        result = mul(result, a);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_vector_0x53_times_0xca() {
        assert_eq!(mul(0x53, 0xCA), 0x01);
    }

    #[test]
    fn add_is_xor_and_self_inverse() {
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                assert_eq!(add(a, b), a ^ b);
                assert_eq!(add(add(a, b), b), a);
            }
        }
    }

    #[test]
    fn mul_is_commutative_and_associative() {
        let vals = [0u8, 1, 2, 3, 7, 15, 53, 0x80, 0xCA, 0xFF];
        for &a in &vals {
            for &b in &vals {
                assert_eq!(mul(a, b), mul(b, a));
                for &c in &vals {
                    assert_eq!(mul(mul(a, b), c), mul(a, mul(b, c)));
                }
            }
        }
    }

    #[test]
    fn mul_inverse_round_trips_for_all_nonzero() {
        for a in 1..=255u8 {
            assert_eq!(mul(a, inverse(a)), 1, "a={a:#x}");
        }
    }

    #[test]
    fn inverse_of_zero_is_zero_by_convention() {
        assert_eq!(inverse(0), 0);
    }

    #[test]
    fn mul_by_zero_is_zero() {
        for a in 0..=255u8 {
            assert_eq!(mul(a, 0), 0);
            assert_eq!(mul(0, a), 0);
        }
    }

    #[test]
    fn pow_matches_repeated_mul() {
        for &a in &[2u8, 5, 0x53, 0xCA] {
            let mut expect = 1u8;
            for e in 0..8u32 {
                assert_eq!(pow(a, e), expect);
                expect = mul(expect, a);
            }
        }
    }
}
