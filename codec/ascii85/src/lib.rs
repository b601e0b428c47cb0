//! ASCII base-85 encoding as used by the PDF `ASCII85Decode` filter.
//!
//! Four input bytes are mapped to five characters in the range `!`..=`u`. A
//! group of four zero bytes is abbreviated as `z`. A trailing group of `n`
//! bytes (1 to 3) is padded with zeros and only `n + 1` characters are kept.
//! The encoded data ends with the `~>` end-of-data marker.

/// Marks the end of an encoded sequence.
pub const END_OF_DATA: &[u8] = b"~>";

const BASE: u32 = 85;
const OFFSET: u8 = b'!';

/// Column at which [`encode_wrapped`] starts a new line.
pub const DEFAULT_MAX_COLUMN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A character outside of `!`..=`u`, `z` and whitespace.
    InvalidCharacter { position: usize, character: u8 },
    /// `z` appeared inside a group.
    MisplacedZ { position: usize },
    /// A group value doesn't fit into 32 bits.
    Overflow { position: usize },
    /// The trailing group consists of a single character.
    TruncatedGroup,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidCharacter { position, character } => {
                write!(f, "invalid character 0x{:02x} at {}", character, position)
            }
            DecodeError::MisplacedZ { position } => write!(f, "'z' inside a group at {}", position),
            DecodeError::Overflow { position } => write!(f, "group ending at {} overflows", position),
            DecodeError::TruncatedGroup => write!(f, "trailing group with a single character"),
        }
    }
}

impl std::error::Error for DecodeError {}

fn encode_group(group: [u8; 4]) -> [u8; 5] {
    let mut value = u32::from_be_bytes(group);
    let mut out = [0u8; 5];
    for digit in out.iter_mut().rev() {
        *digit = (value % BASE) as u8 + OFFSET;
        value /= BASE;
    }
    out
}

/// Calls `emit` with the encoded form of every group in `data`.
fn for_each_group(data: &[u8], mut emit: impl FnMut(&[u8])) {
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let group = [chunk[0], chunk[1], chunk[2], chunk[3]];
        if group == [0; 4] {
            emit(b"z");
        } else {
            emit(&encode_group(group));
        }
    }

    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut group = [0u8; 4];
        group[..rest.len()].copy_from_slice(rest);
        emit(&encode_group(group)[..rest.len() + 1]);
    }
}

/// Encode `data` without any line breaks.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_capacity(data.len()));
    for_each_group(data, |chars| out.extend_from_slice(chars));
    out.extend_from_slice(END_OF_DATA);
    out
}

/// Encode `data` the way it is embedded into PDF streams.
///
/// The output starts with a tab and continues on a new, tab indented line
/// once `max_column` characters were written to the current line.
pub fn encode_wrapped(data: &[u8], max_column: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_capacity(data.len()) + 1);
    out.push(b'\t');
    let mut column = 0;
    for_each_group(data, |chars| {
        out.extend_from_slice(chars);
        column += chars.len();
        if column >= max_column {
            out.extend_from_slice(b"\n\t");
            column = 0;
        }
    });
    out.extend_from_slice(END_OF_DATA);
    out
}

fn encoded_capacity(len: usize) -> usize {
    // 5 chars for 4 bytes, rounded up, plus the end marker and some slack for
    // line breaks.
    len / 4 * 5 + 5 + END_OF_DATA.len() + len / 32
}

/// Decode ASCII85 data. Whitespace is ignored, decoding stops at `~>`.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(input.len() / 5 * 4 + 4);
    let mut group = [0u8; 5];
    let mut filled = 0;

    let mut position = 0;
    while position < input.len() {
        let c = input[position];
        match c {
            b'~' if input.get(position + 1) == Some(&b'>') => break,
            c if c.is_ascii_whitespace() => {}
            b'z' if filled == 0 => out.extend_from_slice(&[0; 4]),
            b'z' => return Err(DecodeError::MisplacedZ { position }),
            b'!'..=b'u' => {
                group[filled] = c - OFFSET;
                filled += 1;
                if filled == group.len() {
                    out.extend_from_slice(&decode_group(&group, position)?);
                    filled = 0;
                }
            }
            character => return Err(DecodeError::InvalidCharacter { position, character }),
        }
        position += 1;
    }

    match filled {
        0 => {}
        1 => return Err(DecodeError::TruncatedGroup),
        n => {
            // pad with the highest digit so that the truncated bytes round up
            // to the encoded value
            for digit in group.iter_mut().skip(n) {
                *digit = (BASE - 1) as u8;
            }
            let bytes = decode_group(&group, position)?;
            out.extend_from_slice(&bytes[..n - 1]);
        }
    }

    Ok(out)
}

fn decode_group(group: &[u8; 5], position: usize) -> Result<[u8; 4], DecodeError> {
    let value = group
        .iter()
        .try_fold(0u32, |acc, &digit| acc.checked_mul(BASE)?.checked_add(u32::from(digit)))
        .ok_or(DecodeError::Overflow { position })?;
    Ok(value.to_be_bytes())
}
