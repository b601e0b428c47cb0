use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The output sink refused a write.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An offset was recorded twice for the same object number.
    #[error("object {0} already has an offset")]
    DuplicateObject(u32),

    /// A resource key was registered twice.
    #[error("resource key is already registered")]
    DuplicateResource,

    /// Resource names are numbered from 1.
    #[error("resource index must not be 0")]
    InvalidResourceIndex,

    /// A stream can't be both a JPEG file and deflated.
    #[error("DCT and Flate filters are mutually exclusive")]
    ConflictingFilters,

    #[error("object numbers are exhausted")]
    ObjectNumberOverflow,

    #[error("a page is already open")]
    PageAlreadyOpen,

    #[error("no page is open")]
    NoOpenPage,

    #[error("document is already closed")]
    DocumentClosed,

    /// The image has a pixel representation that can't be embedded.
    #[error("image can't be embedded: {0}")]
    UnsupportedImage(&'static str),

    /// A draw command or paint feature without PDF serialization.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// The header or tail section of a file couldn't be read.
    #[error("parse error at byte {offset}: {kind}")]
    Parse {
        offset: usize,
        kind: crate::parse::TailError,
    },
}
