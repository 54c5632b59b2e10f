//! Text decoding for line-oriented formats

use std::borrow::Cow;

/// Decode bytes as UTF-8, falling back to Latin-1 per byte
///
/// A leading UTF-8 byte order mark is dropped. Never fails.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Rewrite carriage-return-only line endings to line feeds
///
/// Input that already contains a line feed is returned untouched.
pub fn normalize_line_endings(bytes: &[u8]) -> Cow<'_, [u8]> {
    if bytes.contains(&b'\n') || !bytes.contains(&b'\r') {
        return Cow::Borrowed(bytes);
    }
    Cow::Owned(
        bytes
            .iter()
            .map(|&b| if b == b'\r' { b'\n' } else { b })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_is_borrowed() {
        let decoded = decode_text("Café".as_bytes());
        assert!(matches!(decoded, Cow::Borrowed("Café")));
    }

    #[test]
    fn test_latin1_fallback() {
        assert_eq!(decode_text(b"Caf\xe9"), "Café");
    }

    #[test]
    fn test_mixed_endings_untouched() {
        let input = b"a\r\nb\rc\n";
        assert!(matches!(normalize_line_endings(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_bom_stripped() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFHeading"), "Heading");
    }
}
