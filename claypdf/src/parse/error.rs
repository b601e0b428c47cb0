use nom::{
    error::{ErrorKind, ParseError},
    InputLength,
};

use crate::parse::trailer::TrailerError;

/// Why the header or the tail section of a file couldn't be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TailError {
    #[error("no `%PDF-x.y` header")]
    MissingHeader,
    #[error("no `%%EOF` marker at the end")]
    MissingEofMarker,
    #[error("no `startxref` near the end")]
    MissingStartxref,
    #[error("`startxref` points past the end of the file")]
    StartxrefOutOfRange,
    #[error("malformed cross-reference entry")]
    XrefEntry,
    #[error("invalid trailer: {0:?}")]
    Trailer(TrailerError),
    #[error("input ends early")]
    Truncated,
    #[error("unexpected input ({0:?})")]
    Syntax(ErrorKind),
}

impl From<TrailerError> for TailError {
    fn from(err: TrailerError) -> Self {
        TailError::Trailer(err)
    }
}

/// The innermost failure and how many bytes of input were left at that
/// point. Every parser here runs on a suffix of the file, so the remaining
/// length locates the failure in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadError {
    pub kind: TailError,
    pub remaining: usize,
}

impl ReadError {
    pub fn new<I: InputLength>(input: I, kind: TailError) -> Self {
        Self {
            kind,
            remaining: input.input_len(),
        }
    }

    /// Position of the failure in a file of `file_len` bytes.
    pub fn offset(&self, file_len: usize) -> usize {
        file_len.saturating_sub(self.remaining)
    }
}

impl<I: InputLength> ParseError<I> for ReadError {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        Self::new(input, TailError::Syntax(kind))
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Replace the kind of an error, keeping where it happened.
pub(crate) fn relabel(kind: TailError) -> impl Fn(nom::Err<ReadError>) -> nom::Err<ReadError> {
    move |err| err.map(|e| ReadError { kind, ..e })
}
