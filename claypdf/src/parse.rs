//! Reads back the structure of a written file: the header, the
//! cross-reference table and the trailer.

use nom::{bytes, character, IResult, Parser};

pub use self::{
    error::{ReadError, TailError},
    trailer::{trailer, Trailer, TrailerError},
    xref::{eof_marker_tail, startxref_tail, xref_table, XrefTableEntry},
};
use self::error::relabel;
use crate::error::{Error, Result};

mod error;
mod trailer;
mod xref;

pub type ReadResult<'a, O> = IResult<&'a [u8], O, ReadError>;

/// Everything needed to locate the objects of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStructure {
    pub version: (u8, u8),
    pub announced_binary: bool,
    pub startxref: usize,
    pub xref: Vec<XrefTableEntry>,
    pub trailer: Trailer,
}

impl FileStructure {
    /// Offset of object `number` if it is in use.
    pub fn offset(&self, number: u32) -> Option<usize> {
        self.xref
            .iter()
            .find(|e| e.object == number && !e.free)
            .map(|e| e.byte_offset)
    }

    pub fn used_objects(&self) -> impl Iterator<Item = &XrefTableEntry> {
        self.xref.iter().filter(|e| !e.free)
    }
}

/// Apply `parser` at positions moving from the end of the input towards its
/// start, at most `limit` bytes away from the end. Returns the input in front
/// of the match, the input after the match and the parsed value. Fails with
/// `missing` if nothing matches.
pub(crate) fn backward_search<'a, O, P>(
    limit: usize,
    missing: TailError,
    mut parser: P,
) -> impl FnMut(&'a [u8]) -> ReadResult<'a, (&'a [u8], O)>
where
    P: Parser<&'a [u8], O, ReadError>,
{
    move |input: &'a [u8]| {
        let first = input.len().saturating_sub(limit);
        for start in (first..input.len()).rev() {
            if let Ok((trailing, value)) = parser.parse(&input[start..]) {
                return Ok((&input[..start], (trailing, value)));
            }
        }
        Err(nom::Err::Error(ReadError::new(input, missing)))
    }
}

fn header(input: &[u8]) -> ReadResult<(u8, u8)> {
    let (remainder, _) = bytes::complete::tag_no_case("%PDF-")(input)?;
    let (remainder, major) = character::complete::u8(remainder)?;
    let (remainder, _) = character::complete::char('.')(remainder)?;
    let (remainder, minor) = character::complete::u8(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    Ok((remainder, (major, minor)))
}

fn version(input: &[u8]) -> ReadResult<(u8, u8)> {
    header(input).map_err(relabel(TailError::MissingHeader))
}

fn comment(input: &[u8]) -> ReadResult<&[u8]> {
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, _) = character::complete::char('%')(remainder)?;
    let (remainder, comment) = character::complete::not_line_ending(remainder)?;
    let (remainder, _) = character::complete::line_ending(remainder)?;

    Ok((remainder, comment))
}

/// A comment of at least four bytes with the high bit set.
fn binary_indicator(input: &[u8]) -> ReadResult<bool> {
    match comment(input) {
        Ok((r, comment)) if comment.len() > 3 && comment.iter().all(|&d| d >= 128) => Ok((r, true)),
        _ => Ok((input, false)),
    }
}

/// Turns a parser error into an [`Error`] located in `file`.
fn located(file: &[u8]) -> impl Fn(nom::Err<ReadError>) -> Error + '_ {
    move |err| match err {
        nom::Err::Incomplete(_) => Error::Parse {
            offset: file.len(),
            kind: TailError::Truncated,
        },
        nom::Err::Error(e) | nom::Err::Failure(e) => Error::Parse {
            offset: e.offset(file.len()),
            kind: e.kind,
        },
    }
}

/// Read the header, the last cross-reference section and its trailer.
pub fn read_structure(input: &[u8]) -> Result<FileStructure> {
    let located = located(input);
    let (after_version, version) = version(input).map_err(&located)?;
    let (_, announced_binary) = binary_indicator(after_version).map_err(&located)?;
    eof_marker_tail(input).map_err(&located)?;
    let (_, startxref) = startxref_tail(input).map_err(&located)?;
    let section = input.get(startxref..).ok_or(Error::Parse {
        offset: input.len(),
        kind: TailError::StartxrefOutOfRange,
    })?;
    let (after_xref, xref) = xref_table(section).map_err(&located)?;
    let (_, trailer) = trailer(after_xref).map_err(&located)?;
    log::debug!(
        "read PDF {}.{} with {} xref entries, trailer {:?}",
        version.0,
        version.1,
        xref.len(),
        trailer
    );

    Ok(FileStructure {
        version,
        announced_binary,
        startxref,
        xref,
        trailer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        let empty = &[0u8; 0][..];
        assert_eq!(Ok((empty, (1, 4))), version(b"%PDF-1.4"));
    }

    #[test]
    fn test_parse_binary_indicator() {
        let empty = &[0u8; 0][..];
        assert_eq!(Ok((empty, true)), binary_indicator(b"%\xbf\xbf\xbf\xbf\xbf\n"));
        assert_eq!(Ok((&b"%abcd\n"[..], false)), binary_indicator(b"%abcd\n"));
    }

    #[test]
    fn backward_search_finds_last_match() {
        let input = &b"a startxref 1 startxref 2"[..];
        let (before, (after, _)) =
            backward_search(100, TailError::MissingStartxref, bytes::complete::tag::<_, _, ReadError>("startxref"))(
                input,
            )
            .unwrap();
        assert_eq!(before, b"a startxref 1 ");
        assert_eq!(after, b" 2");
    }

    #[test]
    fn minimal_file() {
        let file = b"%PDF-1.4\n%\xC3\xEC\xE1\xF9\n\
            1 0 obj<</Type/Catalog>>endobj\n\
            xref\n0 2\n0000000000 65535 f \n0000000015 00000 n \n\
            trailer\n<</Root 1 0 R/Size 2>>\nstartxref\n46\n%%EOF\n";
        let structure = read_structure(file).unwrap();
        assert_eq!(structure.version, (1, 4));
        assert!(structure.announced_binary);
        assert_eq!(structure.startxref, 46);
        assert_eq!(structure.offset(1), Some(15));
        assert_eq!(structure.used_objects().count(), 1);
        assert_eq!(
            structure.trailer,
            Trailer {
                size: 2,
                root: 1,
                info: None
            }
        );
    }

    #[test]
    fn truncated_file() {
        let file = b"%PDF-1.4\n1 0 obj<<>>endobj\n";
        assert!(matches!(
            read_structure(file),
            Err(Error::Parse {
                kind: TailError::MissingEofMarker,
                ..
            })
        ));

        let file = b"%PDF-1.4\nstartxref\n999\n%%EOF\n";
        assert!(matches!(
            read_structure(file),
            Err(Error::Parse {
                offset: 29,
                kind: TailError::StartxrefOutOfRange,
            })
        ));
    }

    #[test]
    fn failures_are_located() {
        assert!(matches!(
            read_structure(b"PDF-1.4\n%%EOF\n"),
            Err(Error::Parse {
                offset: 0,
                kind: TailError::MissingHeader,
            })
        ));

        // the entry of object 1 has no type
        let file = b"%PDF-1.4\nxref\n0 2\n0000000000 65535 f \n0000000015 00000 \n\
            trailer\n<</Root 1 0 R/Size 2>>\nstartxref\n9\n%%EOF\n";
        match read_structure(file) {
            Err(Error::Parse { offset, kind }) => {
                assert!(matches!(kind, TailError::Syntax(_)), "{:?}", kind);
                assert_eq!(&file[offset..offset + 7], b"\ntraile");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
