pub(crate) fn is_delimiter(chr: u8) -> bool {
    matches!(
        chr,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

pub(crate) fn is_whitespace(chr: u8) -> bool {
    matches!(chr, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C' | b'\0')
}

/// Bytes that may appear in a name without `#XX` escaping.
pub(crate) fn is_regular(chr: u8) -> bool {
    !is_delimiter(chr) && !is_whitespace(chr) && chr != b'#' && (b'!'..=b'~').contains(&chr)
}

/// Length of the encoded name, including the leading `/`.
pub fn encoded_len(n: &[u8]) -> usize {
    n.iter().map(|&c| if is_regular(c) { 1 } else { 3 }).sum::<usize>() + 1
}

/// Encode `n` as a name token: `/` followed by the identifier where every
/// irregular byte is written as `#` plus two hex digits.
pub fn encode(n: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(n));
    let mut last_write = 0;
    out.push(b'/');
    for (index, &c) in n.iter().enumerate() {
        if !is_regular(c) {
            out.extend_from_slice(&n[last_write..index]);
            last_write = index + 1;
            out.push(b'#');
            out.extend_from_slice(hex::encode_upper([c]).as_bytes());
        }
    }
    out.extend_from_slice(&n[last_write..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &[u8], expected: &[u8]) {
        let out = encode(name);
        assert_eq!(
            out,
            expected,
            "Expected {}, got {}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(&out)
        );
        assert_eq!(encoded_len(name), out.len());
    }

    #[test]
    fn no_delimiters() {
        check(b"FlateDecode", b"/FlateDecode");
    }

    #[test]
    fn delimiter_in_the_middle() {
        check(b"Hello World!", b"/Hello#20World!");
    }

    #[test]
    fn delimiter_start_and_end() {
        check(b" Hello(", b"/#20Hello#28");
    }

    #[test]
    fn hash_and_high_bytes() {
        check(b"A#B\xE9", b"/A#23B#E9");
    }
}
