use nom::{branch, bytes, character, combinator, sequence};

use super::{
    error::{ReadError, TailError},
    ReadResult,
};

pub const TRAILER: &[u8] = b"trailer";
pub const K_SIZE: &[u8] = b"Size";
pub const K_ROOT: &[u8] = b"Root";
pub const K_INFO: &[u8] = b"Info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerError {
    MissingSize,
    InvalidSize,
    MissingRoot,
    InvalidRoot,
    InvalidInfo,
}

/// The entries of a trailer dictionary this crate writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    pub size: u32,
    /// Object number of the catalog.
    pub root: u32,
    /// Object number of the document information dictionary.
    pub info: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value<'a> {
    Reference(u32, u32),
    Integer(i64),
    Name(&'a [u8]),
}

fn ws(input: &[u8]) -> ReadResult<&[u8]> {
    character::complete::multispace0(input)
}

fn name(input: &[u8]) -> ReadResult<&[u8]> {
    let (remainder, _) = character::complete::char('/')(input)?;
    bytes::complete::take_till1(|c: u8| c.is_ascii_whitespace() || b"()<>[]{}/%".contains(&c))(remainder)
}

fn reference(input: &[u8]) -> ReadResult<Value> {
    let (remainder, (number, _, generation, _, _)) = sequence::tuple((
        character::complete::u32,
        character::complete::multispace1,
        character::complete::u32,
        character::complete::multispace1,
        character::complete::char('R'),
    ))(input)?;
    Ok((remainder, Value::Reference(number, generation)))
}

fn value(input: &[u8]) -> ReadResult<Value> {
    branch::alt((
        reference,
        combinator::map(character::complete::i64, Value::Integer),
        combinator::map(name, Value::Name),
    ))(input)
}

fn entry(input: &[u8]) -> ReadResult<(&[u8], Value)> {
    let (remainder, _) = ws(input)?;
    let (remainder, key) = name(remainder)?;
    let (remainder, _) = ws(remainder)?;
    let (remainder, value) = value(remainder)?;
    Ok((remainder, (key, value)))
}

fn into_trailer(entries: &[(&[u8], Value)]) -> Result<Trailer, TrailerError> {
    let get = |key: &[u8]| entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

    let size = match get(K_SIZE).ok_or(TrailerError::MissingSize)? {
        Value::Integer(size) => size.try_into().map_err(|_| TrailerError::InvalidSize)?,
        _ => return Err(TrailerError::InvalidSize),
    };
    let root = match get(K_ROOT).ok_or(TrailerError::MissingRoot)? {
        Value::Reference(number, _) => number,
        _ => return Err(TrailerError::InvalidRoot),
    };
    let info = match get(K_INFO) {
        None => None,
        Some(Value::Reference(number, _)) => Some(number),
        Some(_) => return Err(TrailerError::InvalidInfo),
    };

    Ok(Trailer { size, root, info })
}

/// Parse `trailer` followed by its dictionary.
pub fn trailer(input: &[u8]) -> ReadResult<Trailer> {
    let (remainder, _) = ws(input)?;
    let (remainder, _) = bytes::complete::tag(TRAILER)(remainder)?;
    let (remainder, _) = ws(remainder)?;
    let (remainder, _) = bytes::complete::tag(b"<<")(remainder)?;

    let mut entries = Vec::new();
    let mut remainder = remainder;
    while let Ok((inner, key_value)) = entry(remainder) {
        entries.push(key_value);
        remainder = inner;
    }
    let (remainder, _) = ws(remainder)?;
    let (remainder, _) = bytes::complete::tag(b">>")(remainder)?;

    let trailer =
        into_trailer(&entries).map_err(|err| nom::Err::Failure(ReadError::new(input, TailError::Trailer(err))))?;
    Ok((remainder, trailer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_trailer() {
        let (rest, t) = trailer(b"trailer\n<</Root 2 0 R/Size 6/Info 1 0 R>>\nstartxref").unwrap();
        assert_eq!(rest, b"\nstartxref");
        assert_eq!(
            t,
            Trailer {
                size: 6,
                root: 2,
                info: Some(1)
            }
        );
    }

    #[test]
    fn spaced_trailer() {
        let (_, t) = trailer(b"trailer\n<< /Size 4\n\t/Root 9 0 R /ID /Foo >>").unwrap();
        assert_eq!(
            t,
            Trailer {
                size: 4,
                root: 9,
                info: None
            }
        );
    }

    #[test]
    fn missing_root() {
        let err = trailer(b"trailer<</Size 4>>").unwrap_err();
        match err {
            nom::Err::Failure(e) => assert_eq!(e.kind, TailError::Trailer(TrailerError::MissingRoot)),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn invalid_size() {
        assert!(matches!(trailer(b"trailer<</Size 1 0 R/Root 1 0 R>>"), Err(nom::Err::Failure(_))));
    }
}
