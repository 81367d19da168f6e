use std::cmp::Ordering;

use crate::CipherError;

/// Filler appended to the plaintext so it fills the last grid row.
///
/// It is not escaped: trailing runs of this character in a plaintext are
/// indistinguishable from filler and are removed by `decode`.
pub const PADDING: char = '_';

/// Columnar transposition with a precomputed column read order.
#[derive(Debug, Clone)]
pub struct ColumnarCipher {
    /// Original column indices in the order they are read out.
    order: Vec<usize>,
}

impl ColumnarCipher {
    pub fn new(key: &str) -> Result<Self, CipherError> {
        let key: Vec<char> = key.chars().collect();
        if key.is_empty() {
            return Err(CipherError::DegenerateKey);
        }

        // sort_by is stable, so repeated key characters keep their positions.
        let mut order: Vec<usize> = (0..key.len()).collect();
        order.sort_by(|&a, &b| collate(key[a], key[b]));

        Ok(Self { order })
    }

    pub fn columns(&self) -> usize {
        self.order.len()
    }

    pub fn encode(&self, message: &str) -> String {
        let cols = self.columns();
        let mut cells: Vec<char> = message.chars().collect();
        let padding = (cols - cells.len() % cols) % cols;
        cells.extend(std::iter::repeat(PADDING).take(padding));

        let rows = cells.len() / cols;
        let mut out = String::with_capacity(cells.len());
        for &col in &self.order {
            for row in 0..rows {
                out.push(cells[row * cols + col]);
            }
        }
        out
    }

    pub fn decode(&self, cipher: &str) -> Result<String, CipherError> {
        let cols = self.columns();
        let cells: Vec<char> = cipher.chars().collect();
        if cells.len() % cols != 0 {
            return Err(CipherError::LengthMismatch {
                len: cells.len(),
                columns: cols,
            });
        }

        let rows = cells.len() / cols;
        let mut grid = vec![PADDING; cells.len()];
        for (run, &col) in self.order.iter().enumerate() {
            for row in 0..rows {
                grid[row * cols + col] = cells[run * rows + row];
            }
        }

        let mut plain: String = grid.into_iter().collect();
        let keep = plain.trim_end_matches(PADDING).len();
        plain.truncate(keep);
        Ok(plain)
    }
}

/// Encode `message` with a transposition keyed by `key`.
pub fn encode(message: &str, key: &str) -> Result<String, CipherError> {
    Ok(ColumnarCipher::new(key)?.encode(message))
}

/// Invert [`encode`], stripping trailing padding.
pub fn decode(cipher: &str, key: &str) -> Result<String, CipherError> {
    ColumnarCipher::new(key)?.decode(cipher)
}

/// Character order used to rank key columns.
///
/// Mirrors the browser's locale comparison for the characters that show up
/// in user names: punctuation before digits before letters, letters compared
/// case-insensitively with lowercase ahead of uppercase on a tie.
fn collate(a: char, b: char) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

fn collation_key(c: char) -> (u8, char, bool, char) {
    let class = if c.is_alphabetic() {
        2
    } else if c.is_numeric() {
        1
    } else {
        0
    };
    let folded = c.to_lowercase().next().unwrap_or(c);
    (class, folded, c.is_uppercase(), c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::shared_key;

    #[test]
    fn encode_decode_roundtrip() {
        let keys = [
            shared_key("alice", "bob"),
            "x".to_string(),
            "abab".to_string(),
            "aB1_".to_string(),
            "a-much-longer-key-than-any-message-below-2024".to_string(),
        ];
        let messages = [
            "HELLO",
            "",
            "x",
            "meet me at the lounge at noon!",
            "héllo wörld ☕",
        ];
        for key in &keys {
            for message in messages {
                let cipher = encode(message, key).unwrap();
                assert_eq!(cipher.chars().count() % key.chars().count(), 0);
                assert_eq!(decode(&cipher, key).unwrap(), message, "key {key:?}");
            }
        }
    }

    #[test]
    fn known_vectors() {
        // "alicebob" reads columns a b b c e i l o -> 0 5 7 3 4 2 1 6
        assert_eq!(encode("HELLO", "alicebob").unwrap(), "H__LOLE_");
        assert_eq!(encode("abcdef", "bac").unwrap(), "beadcf");
        assert_eq!(decode("beadcf", "bac").unwrap(), "abcdef");
    }

    #[test]
    fn repeated_key_characters_keep_position() {
        assert_eq!(ColumnarCipher::new("bb").unwrap().order, vec![0, 1]);
        assert_eq!(ColumnarCipher::new("abab").unwrap().order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn letters_compare_case_insensitively() {
        assert_eq!(ColumnarCipher::new("aB").unwrap().order, vec![0, 1]);
        assert_eq!(ColumnarCipher::new("Aa").unwrap().order, vec![1, 0]);
        assert_eq!(ColumnarCipher::new("b1_").unwrap().order, vec![2, 1, 0]);
    }

    #[test]
    fn single_column_key_is_identity() {
        assert_eq!(encode("hello", "x").unwrap(), "hello");
        assert_eq!(decode("hello", "x").unwrap(), "hello");
    }

    #[test]
    fn empty_key_is_rejected() {
        assert_eq!(encode("hello", ""), Err(CipherError::DegenerateKey));
        assert_eq!(decode("hello", ""), Err(CipherError::DegenerateKey));
    }

    #[test]
    fn ragged_ciphertext_is_rejected() {
        assert_eq!(
            decode("abcde", "ab"),
            Err(CipherError::LengthMismatch { len: 5, columns: 2 })
        );
    }

    #[test]
    fn trailing_padding_in_plaintext_is_lost() {
        let cipher = encode("wait__", "ab").unwrap();
        assert_eq!(decode(&cipher, "ab").unwrap(), "wait");
        // Padding in the middle survives.
        let cipher = encode("snake_case", "key").unwrap();
        assert_eq!(decode(&cipher, "key").unwrap(), "snake_case");
    }
}
