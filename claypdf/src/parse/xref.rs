use nom::{branch, bytes, character, combinator, multi};

use super::{
    backward_search,
    error::{ReadError, TailError},
    ReadResult,
};

const EOF_MARKER: &[u8] = b"%%EOF";
const STARTXREF: &[u8] = b"startxref";

/// One line of a cross-reference section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefTableEntry {
    pub object: u32,
    pub byte_offset: usize,
    pub generation: u32,
    pub free: bool,
}

/// Find the last `startxref` and return the offset following it.
pub fn startxref_tail(input: &[u8]) -> ReadResult<usize> {
    let (remainder, (trailing, _)) =
        backward_search(STARTXREF.len() + 2048, TailError::MissingStartxref, bytes::complete::tag_no_case(STARTXREF))(
            input,
        )?;
    let (trailing, _) = character::complete::multispace0(trailing)?;
    let (_, xref_pos) = character::complete::u64(trailing)?;
    let xref_pos: usize = xref_pos
        .try_into()
        .map_err(|_| nom::Err::Error(ReadError::new(trailing, TailError::StartxrefOutOfRange)))?;

    Ok((remainder, xref_pos))
}

fn xref_entries(input: &[u8]) -> ReadResult<Vec<XrefTableEntry>> {
    let (remainder, first) = character::complete::u32(input)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, count) = character::complete::u32(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;

    let invalid = || nom::Err::Failure(ReadError::new(input, TailError::XrefEntry));

    // every entry takes 20 bytes, don't trust the count beyond what the input can hold
    let mut entries = Vec::with_capacity((count as usize).min(remainder.len() / 20));

    let mut remainder = remainder;
    for i in 0..count {
        let (inner, offset) = character::complete::u64(remainder)?;
        let (inner, _) = character::complete::space1(inner)?;
        let (inner, generation) = character::complete::u32(inner)?;
        let (inner, _) = character::complete::space1(inner)?;
        let (inner, free) = branch::alt((
            combinator::value(false, bytes::complete::tag(b"n")),
            combinator::value(true, bytes::complete::tag(b"f")),
        ))(inner)?;
        let (inner, _) = character::complete::multispace0(inner)?;

        entries.push(XrefTableEntry {
            object: first.checked_add(i).ok_or_else(invalid)?,
            byte_offset: offset.try_into().map_err(|_| invalid())?,
            generation,
            free,
        });
        remainder = inner;
    }

    Ok((remainder, entries))
}

/// Parse an `xref` section with all of its subsections.
pub fn xref_table(input: &[u8]) -> ReadResult<Vec<XrefTableEntry>> {
    let (remainder, _) = character::complete::multispace0(input)?;
    let (remainder, _) = bytes::complete::tag(b"xref")(remainder)?;
    let (remainder, _) = character::complete::multispace0(remainder)?;
    let (remainder, sections) = multi::many1(xref_entries)(remainder)?;
    Ok((remainder, sections.into_iter().flatten().collect()))
}

/// Matches a `%%EOF` marker at the end of the input, followed by at most one
/// line break.
pub fn eof_marker_tail(input: &[u8]) -> ReadResult<()> {
    let (remainder, _trailing) =
        backward_search(EOF_MARKER.len() + 2, TailError::MissingEofMarker, bytes::complete::tag(EOF_MARKER))(input)?;
    Ok((remainder, ()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::CrossReferenceTable;

    #[test]
    fn test_startxref_tail() {
        let input = &b"         startxref\n2132"[..];
        let res = startxref_tail(input);
        assert!(matches!(res, Ok((_, 2132))));

        let input = &b"         startxref\n555\n%%EOF\n"[..];
        let res = startxref_tail(input);
        assert!(matches!(res, Ok((_, 555))));
    }

    #[test]
    fn test_invalid_startxref_tail() {
        // too big
        let input = &b"         startxref\n9999999999999999999999999999999"[..];
        assert!(matches!(startxref_tail(input), Err(nom::Err::Error(_))));

        assert!(matches!(
            startxref_tail(b"xref\n0 1\n"),
            Err(nom::Err::Error(ReadError {
                kind: TailError::MissingStartxref,
                ..
            }))
        ));
    }

    #[test]
    fn reads_written_table() {
        let mut table = CrossReferenceTable::new();
        for (number, offset) in [(1, 15), (2, 200), (3, 300), (7, 700), (8, 800)] {
            table.set_offset(number, offset).unwrap();
        }
        let mut out = Vec::new();
        table.write(&mut out).unwrap();
        out.extend_from_slice(b"trailer\n");

        let (rest, entries) = xref_table(&out).unwrap();
        assert_eq!(rest, b"trailer\n");
        assert_eq!(entries.len(), 6);
        assert_eq!(
            entries[0],
            XrefTableEntry {
                object: 0,
                byte_offset: 0,
                generation: 65535,
                free: true
            }
        );
        let used: Vec<_> = entries
            .iter()
            .filter(|e| !e.free)
            .map(|e| (e.object, e.byte_offset))
            .collect();
        assert_eq!(used, vec![(1, 15), (2, 200), (3, 300), (7, 700), (8, 800)]);
    }

    #[test]
    fn eof_marker() {
        assert!(eof_marker_tail(b"startxref\n9\n%%EOF\n").is_ok());
        assert!(eof_marker_tail(b"startxref\n9\n%%EOF").is_ok());
        assert_eq!(
            eof_marker_tail(b"%%EOF\n1 0 obj\n").unwrap_err(),
            nom::Err::Error(ReadError {
                kind: TailError::MissingEofMarker,
                remaining: 14,
            })
        );
    }
}
