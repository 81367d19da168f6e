/// Derive the transposition key for a conversation between `a` and `b`.
///
/// The two identifiers are ordered by UTF-16 code units (the order the
/// browser client sorts strings in) and concatenated, so both participants
/// compute the same key without exchanging anything.
pub fn shared_key(a: &str, b: &str) -> String {
    let (first, second) = if a.encode_utf16().cmp(b.encode_utf16()).is_le() {
        (a, b)
    } else {
        (b, a)
    };
    let mut key = String::with_capacity(a.len() + b.len());
    key.push_str(first);
    key.push_str(second);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric() {
        let pairs = [
            ("alice", "bob"),
            ("Zed", "adam"),
            ("", "x"),
            ("same", "same"),
            ("\u{e000}", "😀"),
        ];
        for (a, b) in pairs {
            assert_eq!(shared_key(a, b), shared_key(b, a));
        }
    }

    #[test]
    fn sorted_concatenation() {
        assert_eq!(shared_key("bob", "alice"), "alicebob");
        // Uppercase sorts before lowercase by code unit.
        assert_eq!(shared_key("adam", "Zed"), "Zedadam");
    }

    #[test]
    fn orders_by_utf16_code_units() {
        // U+E000 is a single unit 0xE000; the emoji starts with surrogate 0xD83D.
        assert_eq!(shared_key("\u{e000}", "😀"), "😀\u{e000}");
    }
}
