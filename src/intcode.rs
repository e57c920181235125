//! Intcode transport codec.
//!
//! Grounded on `sbk/cli_util.py`'s `bytes2intcode_parts`/`intcodes2parts`: a
//! byte pair at position `i` is packed into a 20-bit integer carrying a
//! mod-13 ordering index in its high bits, rendered as a zero-padded 6-digit
//! decimal string `ddd-ddd`. The ordering index lets the decoder catch a
//! transposed pair of groups without any extra redundancy.

use crate::error::{Result, SbkError};
use crate::rs;

/// Encode `data` (even length) to one intcode per byte pair, starting the
/// mod-13 ordering index at `idx_offset`.
pub fn encode_parts(data: &[u8], idx_offset: u32) -> Result<Vec<String>> {
    if data.len() % 2 != 0 {
        return Err(SbkError::NotEnoughData {
            needed: data.len() + 1,
            got: data.len(),
        });
    }

    let mut out = Vec::with_capacity(data.len() / 2);
    for i in 0..data.len() / 2 {
        let idx = idx_offset as usize + i;
        let chk_idx = (idx % 13) as u32;
        let byte0 = data[i * 2] as u32;
        let byte1 = data[i * 2 + 1] as u32;
        let bits = (chk_idx << 16) | (byte0 << 8) | byte1;
        out.push(format!("{:03}-{:03}", bits / 1000, bits % 1000));
    }
    Ok(out)
}

fn parse_digits(intcode: &str) -> Option<u32> {
    let digits: String = intcode.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 6 {
        return None;
    }
    digits.parse().ok()
}

/// Decode a sequence of optional intcode strings back to a flat byte
/// sequence, one `Option<u8>` per position, two per group. `None` groups
/// (not entered, or unparseable) leave both their bytes as erasures.
/// Fails with [`SbkError::BadOrder`] the moment a present group's embedded
/// ordering index doesn't match the position expected from `idx_offset`.
pub fn decode_parts(intcodes: &[Option<String>], idx_offset: u32) -> Result<Vec<Option<u8>>> {
    let mut expected_chk_idx = idx_offset % 13;
    let mut part_vals: Vec<Option<u8>> = vec![None; intcodes.len() * 2];

    for (pos, maybe_code) in intcodes.iter().enumerate() {
        if let Some(code) = maybe_code {
            if let Some(bits) = parse_digits(code) {
                let chk_idx = bits >> 16;
                if chk_idx != expected_chk_idx {
                    return Err(SbkError::BadOrder {
                        position: pos,
                        expected: expected_chk_idx as u8,
                        found: chk_idx as u8,
                    });
                }
                part_vals[pos * 2] = Some(((bits >> 8) & 0xFF) as u8);
                part_vals[pos * 2 + 1] = Some((bits & 0xFF) as u8);
            }
        }
        expected_chk_idx = (expected_chk_idx + 1) % 13;
    }

    Ok(part_vals)
}

fn padded_len(msg_len: usize) -> usize {
    if msg_len % 2 == 0 {
        msg_len
    } else {
        msg_len + 1
    }
}

/// Encode `msg` to intcodes: apply the RS codec with `ecc_len` equal to the
/// (possibly padded) message length, so data and ECC form equal halves of
/// the resulting group sequence, then render one intcode per byte pair.
pub fn bytes_to_intcodes(msg: &[u8]) -> Vec<String> {
    let pad_len = padded_len(msg.len());
    let mut padded = msg.to_vec();
    padded.resize(pad_len, 0);
    let block = rs::encode(&padded, pad_len);
    encode_parts(&block, 0).expect("block length is even by construction")
}

/// Decode intcodes produced by [`bytes_to_intcodes`] back to the original
/// `msg_len`-byte message.
pub fn intcodes_to_bytes(codes: &[Option<String>], msg_len: usize) -> Result<Vec<u8>> {
    let pad_len = padded_len(msg_len);
    let parts = decode_parts(codes, 0)?;
    let decoded = rs::decode(&parts, pad_len)?;
    Ok(decoded[..msg_len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swapped_groups_are_detected_as_bad_order() {
        let data = [0x01u8, 0x02, 0x03, 0x04];
        let codes = encode_parts(&data, 0).unwrap();
        assert_eq!(codes.len(), 2);

        let swapped: Vec<Option<String>> = vec![Some(codes[1].clone()), Some(codes[0].clone())];
        let err = decode_parts(&swapped, 0).unwrap_err();
        assert!(matches!(err, SbkError::BadOrder { position: 0, .. }));
    }

    #[test]
    fn encode_decode_parts_round_trip() {
        let data: Vec<u8> = (0u8..40).collect();
        let codes = encode_parts(&data, 0).unwrap();
        let maybe_codes: Vec<Option<String>> = codes.into_iter().map(Some).collect();
        let parts = decode_parts(&maybe_codes, 0).unwrap();
        let recovered: Vec<u8> = parts.into_iter().map(|b| b.unwrap()).collect();
        assert_eq!(recovered, data);
    }

    #[test]
    fn missing_groups_leave_erasures() {
        let data: Vec<u8> = (0u8..20).collect();
        let codes = encode_parts(&data, 0).unwrap();
        let mut maybe_codes: Vec<Option<String>> = codes.into_iter().map(Some).collect();
        maybe_codes[2] = None;
        let parts = decode_parts(&maybe_codes, 0).unwrap();
        assert_eq!(parts[4], None);
        assert_eq!(parts[5], None);
        assert!(parts[0].is_some());
    }

    #[test]
    fn bytes_to_intcodes_round_trips() {
        for len in 1..=21usize {
            let msg: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(31)).collect();
            let codes = bytes_to_intcodes(&msg);
            let maybe_codes: Vec<Option<String>> = codes.into_iter().map(Some).collect();
            let decoded = intcodes_to_bytes(&maybe_codes, len).unwrap();
            assert_eq!(decoded, msg);
        }
    }

    #[test]
    fn bytes_to_intcodes_tolerates_single_erasure() {
        let msg: Vec<u8> = (0..13u8).collect();
        let codes = bytes_to_intcodes(&msg);
        let mut maybe_codes: Vec<Option<String>> = codes.into_iter().map(Some).collect();
        maybe_codes[1] = None;
        let decoded = intcodes_to_bytes(&maybe_codes, msg.len()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn rejects_odd_length_data_for_raw_parts() {
        let data = [1u8, 2, 3];
        assert!(encode_parts(&data, 0).is_err());
    }
}
