/// Range of the real numbers that may appear in the output.
///
/// PDF/A limits reals to the range of a 16.16 fixed point number. Larger
/// magnitudes can't be represented more precisely than an integer anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarRange {
    /// ±32767 with a resolution of 1/65536.
    #[default]
    Narrow,
    /// ±2^24, values below 1/65536 snap to zero.
    Wide,
}

/// Output options threaded through a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum line length outside of stream data. `0` disables wrapping.
    pub max_columns: usize,
    /// Indent continuation lines with a tab.
    pub indent: bool,
    /// Emit `%` comments describing the objects.
    pub comments: bool,
    /// Deflate content streams and image planes.
    pub compress: bool,
    /// ASCII85 encode every stream so the file is 7-bit clean.
    pub seven_bit: bool,
    pub scalar_range: ScalarRange,
}

/// Lines that are not part of stream data are limited to 255 bytes.
pub const MAX_LINE_LENGTH: usize = 255;

impl Config {
    /// Smallest output, binary streams.
    pub fn compact() -> Self {
        Self {
            max_columns: MAX_LINE_LENGTH,
            indent: false,
            comments: false,
            compress: true,
            seven_bit: false,
            scalar_range: ScalarRange::Narrow,
        }
    }

    /// 7-bit clean, commented output that can be read in a text editor.
    pub fn human_readable() -> Self {
        Self {
            max_columns: 80,
            indent: true,
            comments: true,
            compress: false,
            seven_bit: true,
            scalar_range: ScalarRange::Narrow,
        }
    }

    pub fn with_scalar_range(mut self, range: ScalarRange) -> Self {
        self.scalar_range = range;
        self
    }

    pub(crate) fn stream_encoding(&self) -> StreamEncoding {
        StreamEncoding {
            compress: self.compress,
            seven_bit: self.seven_bit,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::compact()
    }
}

/// The subset of [`Config`] that decides how stream data is filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEncoding {
    pub compress: bool,
    pub seven_bit: bool,
}

impl Default for StreamEncoding {
    fn default() -> Self {
        Config::default().stream_encoding()
    }
}
