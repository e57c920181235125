//! Textual artifact display grid.
//!
//! Pure formatting: given an artifact's header-prefixed bytes, lay out the
//! rows a user would copy to paper — a data intcode and its two mnemonic
//! words on the left, the matching ECC intcode on the right. The codecs
//! themselves ([`crate::intcode`], [`crate::mnemonic`], [`crate::rs`]) don't
//! know or care about this layout; it only exists to make a printed
//! artifact easy to read back correctly.

use crate::intcode;
use crate::mnemonic;
use crate::rs;

/// One row of the display grid: a labeled data intcode, the two mnemonic
/// words spelling out the same two bytes, and the labeled ECC intcode for
/// the matching stripe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub data_label: char,
    pub data_intcode: String,
    pub words: (&'static str, &'static str),
    pub ecc_label: char,
    pub ecc_intcode: String,
}

impl std::fmt::Display for DisplayRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}   {}   {}   {}: {}",
            self.data_label, self.data_intcode, self.words.0, self.words.1, self.ecc_label,
            self.ecc_intcode
        )
    }
}

/// Build the display grid for `data`: pads to an even length, splits into
/// data and ECC halves the same way [`intcode::bytes_to_intcodes`] does,
/// and pairs each data stripe's intcode and words with its ECC stripe's
/// intcode.
pub fn build_grid(data: &[u8]) -> Vec<DisplayRow> {
    let pad_len = if data.len() % 2 == 0 {
        data.len()
    } else {
        data.len() + 1
    };
    let mut padded = data.to_vec();
    padded.resize(pad_len, 0);

    let block = rs::encode(&padded, pad_len);
    let (data_half, ecc_half) = block.split_at(pad_len);

    let data_codes = intcode::encode_parts(data_half, 0).expect("data half has even length");
    let ecc_codes =
        intcode::encode_parts(ecc_half, pad_len as u32 / 2).expect("ecc half has even length");
    let words = mnemonic::encode(data_half);

    data_codes
        .into_iter()
        .zip(ecc_codes)
        .enumerate()
        .map(|(i, (data_intcode, ecc_intcode))| DisplayRow {
            data_label: 'A',
            data_intcode,
            words: (words[i * 2], words[i * 2 + 1]),
            ecc_label: 'B',
            ecc_intcode,
        })
        .collect()
}

/// Render `data`'s display grid as the multi-line text a user would copy
/// to paper, one row per line.
pub fn format_artifact(data: &[u8]) -> String {
    build_grid(data)
        .iter()
        .map(|row| row.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_one_row_per_two_bytes() {
        let data = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06];
        let grid = build_grid(&data);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn row_words_match_data_bytes() {
        let data = [0u8, 255];
        let grid = build_grid(&data);
        assert_eq!(grid[0].words, (mnemonic::WORDLIST[0], mnemonic::WORDLIST[255]));
    }

    #[test]
    fn render_produces_one_line_per_row() {
        let data = [1u8, 2, 3, 4];
        let text = format_artifact(&data);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().starts_with("A: "));
    }

    #[test]
    fn odd_length_data_is_padded_before_layout() {
        let data = [7u8, 8, 9];
        let grid = build_grid(&data);
        assert_eq!(grid.len(), 2);
    }
}
