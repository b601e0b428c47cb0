/// Literal form of a string: `(...)` with backslash escapes.
pub fn literal_form(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 2);
    out.push(b'(');
    for &c in s {
        match c {
            b'\n' => out.extend_from_slice(br"\n"),
            b'\r' => out.extend_from_slice(br"\r"),
            b'\t' => out.extend_from_slice(br"\t"),
            b'(' => out.extend_from_slice(br"\("),
            b')' => out.extend_from_slice(br"\)"),
            b'\\' => out.extend_from_slice(br"\\"),
            c if c <= 31 || c >= 127 => out.extend_from_slice(format!("\\{:03o}", c).as_bytes()),
            c => out.push(c),
        }
    }
    out.push(b')');
    out
}

/// Hex form of a string: `<...>` with two upper case digits per byte.
pub fn hex_form(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() * 2 + 2);
    out.push(b'<');
    out.extend_from_slice(hex::encode_upper(s).as_bytes());
    out.push(b'>');
    out
}

/// Encode `s` as a PDF string token, picking the shorter of the two forms.
/// Equal lengths favor the literal form.
pub fn encode(s: &[u8]) -> Vec<u8> {
    let literal = literal_form(s);
    // the hex form always has a length of 2 * n + 2
    if s.len() * 2 + 2 < literal.len() {
        hex_form(s)
    } else {
        literal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_is_literal() {
        assert_eq!(encode(b"Hello World"), b"(Hello World)".to_vec());
        assert_eq!(encode(b""), b"()".to_vec());
    }

    #[test]
    fn parenthesis_and_backslash_are_escaped() {
        assert_eq!(literal_form(b"a(b)c\\"), br"(a\(b\)c\\)".to_vec());
        // balanced or not, every parenthesis is escaped
        assert_eq!(literal_form(b"(("), br"(\(\()".to_vec());
    }

    #[test]
    fn control_characters() {
        assert_eq!(literal_form(b"\n\r\t"), br"(\n\r\t)".to_vec());
        assert_eq!(literal_form(&[0x01, 0x7F, 0xFF]), br"(\001\177\377)".to_vec());
    }

    #[test]
    fn binary_is_hex() {
        let binary = [0x00, 0xD3, 0xEB, 0xE9];
        assert_eq!(encode(&binary), b"<00D3EBE9>".to_vec());
    }

    #[test]
    fn tie_favors_literal() {
        // literal: `(\001)` is 6 bytes, hex: `<01>` is 4 bytes
        assert_eq!(encode(&[1]), b"<01>".to_vec());
        // literal: `(a\n)` is 5 bytes, hex: `<610A>` is 6 bytes
        assert_eq!(encode(b"a\n"), br"(a\n)".to_vec());
        // literal: `(\(\()` is 6 bytes, hex: `<2828>` is 6 bytes
        assert_eq!(encode(b"(("), br"(\(\()".to_vec());
    }
}
