use std::{io::Write, ops::BitOr};

use flate2::{write::ZlibEncoder, Compression};

use crate::{
    config::StreamEncoding,
    error::{Error, Result},
};

pub const K_FLATE_DECODE: &str = "/FlateDecode";

/// Filters applied to the bytes of a [`Stream`], in PDF order the ASCII85
/// layer is decoded first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Filters(u8);

impl Filters {
    pub const NONE: Filters = Filters(0);
    /// The bytes are a JPEG file.
    pub const DCT: Filters = Filters(1);
    pub const FLATE: Filters = Filters(1 << 1);
    pub const ASCII85: Filters = Filters(1 << 2);

    pub fn contains(self, other: Filters) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Filters {
    type Output = Filters;

    fn bitor(self, rhs: Self) -> Self::Output {
        Filters(self.0 | rhs.0)
    }
}

/// Payload of a stream object and the filters that were applied to it.
///
/// A stream is filled once, written once and freed right after.
#[derive(Debug, Clone, Default)]
pub struct Stream {
    data: Option<Vec<u8>>,
    filters: Filters,
}

impl Stream {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Some(data),
            filters: Filters::NONE,
        }
    }

    /// Wrap bytes that are already encoded, e.g. a JPEG file with
    /// [`Filters::DCT`].
    pub fn with_filters(data: Vec<u8>, filters: Filters) -> Result<Self> {
        if filters.contains(Filters::DCT) && filters.contains(Filters::FLATE) {
            return Err(Error::ConflictingFilters);
        }
        Ok(Self {
            data: Some(data),
            filters,
        })
    }

    /// Compress the data if `encoding` asks for it and it pays off, then
    /// ASCII85 encode if a 7-bit clean file was requested.
    pub fn deflate(&mut self, encoding: StreamEncoding) {
        if encoding.compress
            && !self.filters.contains(Filters::FLATE)
            && !self.filters.contains(Filters::DCT)
            && !self.filters.contains(Filters::ASCII85)
        {
            if let Some(data) = &self.data {
                match compress(data) {
                    Some(compressed) if compressed.len() + K_FLATE_DECODE.len() < data.len() => {
                        log::trace!("deflated stream from {} to {} bytes", data.len(), compressed.len());
                        self.data = Some(compressed);
                        self.filters = self.filters | Filters::FLATE;
                    }
                    Some(compressed) => log::trace!(
                        "keep {} bytes uncompressed, deflate would produce {} bytes",
                        data.len(),
                        compressed.len()
                    ),
                    None => log::trace!("deflate failed, keep {} bytes uncompressed", data.len()),
                }
            }
        }

        if encoding.seven_bit {
            self.base85();
        }
    }

    /// ASCII85 encode the data. Does nothing if it already is.
    pub fn base85(&mut self) {
        if self.filters.contains(Filters::ASCII85) {
            return;
        }
        if let Some(data) = &self.data {
            self.data = Some(aw_ascii85::encode_wrapped(data, aw_ascii85::DEFAULT_MAX_COLUMN));
            self.filters = self.filters | Filters::ASCII85;
        }
    }

    /// The value of the `/Filter` entry, if any.
    pub fn filter(&self) -> Option<&'static str> {
        let base85 = self.filters.contains(Filters::ASCII85);
        if self.filters.contains(Filters::DCT) {
            Some(if base85 {
                "[/ASCII85Decode /DCTDecode]"
            } else {
                "/DCTDecode"
            })
        } else if self.filters.contains(Filters::FLATE) {
            Some(if base85 {
                "[/ASCII85Decode /FlateDecode]"
            } else {
                K_FLATE_DECODE
            })
        } else if base85 {
            Some("/ASCII85Decode")
        } else {
            None
        }
    }

    pub fn filters(&self) -> Filters {
        self.filters
    }

    /// Length of the encoded data, the value of `/Length`.
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_asset(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn free(&mut self) {
        self.data = None;
        self.filters = Filters::NONE;
    }
}

fn compress(data: &[u8]) -> Option<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data).ok()?;
    encoder.finish().ok()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::ZlibDecoder;

    use super::*;

    const COMPRESS: StreamEncoding = StreamEncoding {
        compress: true,
        seven_bit: false,
    };

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn repetitive_data_is_deflated() {
        let content = b"0 0 10 10 re f\n".repeat(100);
        let mut stream = Stream::new(content.clone());
        stream.deflate(COMPRESS);
        assert_eq!(stream.filter(), Some("/FlateDecode"));
        assert!(stream.len() < content.len());
        assert_eq!(inflate(stream.data()), content);

        // a second call does nothing
        let once = stream.data().to_vec();
        stream.deflate(COMPRESS);
        assert_eq!(stream.data(), &once[..]);
    }

    #[test]
    fn short_data_stays_uncompressed() {
        let mut stream = Stream::new(b"q Q".to_vec());
        stream.deflate(COMPRESS);
        assert_eq!(stream.filter(), None);
        assert_eq!(stream.data(), b"q Q");
    }

    #[test]
    fn jpeg_is_never_deflated() {
        let mut stream = Stream::with_filters(vec![0; 1000], Filters::DCT).unwrap();
        stream.deflate(COMPRESS);
        assert_eq!(stream.filter(), Some("/DCTDecode"));
        assert_eq!(stream.len(), 1000);
    }

    #[test]
    fn compression_disabled() {
        let mut stream = Stream::new(vec![0; 1000]);
        stream.deflate(StreamEncoding {
            compress: false,
            seven_bit: false,
        });
        assert_eq!(stream.filter(), None);
    }

    #[test]
    fn seven_bit_output() {
        let content = b"BT /F1 12 Tf (Hello) Tj ET\n".repeat(20);
        let mut stream = Stream::new(content.clone());
        stream.deflate(StreamEncoding {
            compress: true,
            seven_bit: true,
        });
        assert_eq!(stream.filter(), Some("[/ASCII85Decode /FlateDecode]"));
        assert!(stream.data().iter().all(u8::is_ascii));
        assert!(stream.data().starts_with(b"\t"));
        assert!(stream.data().ends_with(b"~>"));
        let decoded = aw_ascii85::decode(stream.data()).unwrap();
        assert_eq!(inflate(&decoded), content);

        let mut jpeg = Stream::with_filters(vec![0xFF; 20], Filters::DCT).unwrap();
        jpeg.deflate(StreamEncoding {
            compress: true,
            seven_bit: true,
        });
        assert_eq!(jpeg.filter(), Some("[/ASCII85Decode /DCTDecode]"));

        let mut plain = Stream::new(b"q Q".to_vec());
        plain.base85();
        plain.base85();
        assert_eq!(plain.filter(), Some("/ASCII85Decode"));
        assert_eq!(aw_ascii85::decode(plain.data()).unwrap(), b"q Q");
    }

    #[test]
    fn jpeg_and_flate_conflict() {
        let err = Stream::with_filters(vec![0; 4], Filters::DCT | Filters::FLATE);
        assert!(matches!(err, Err(Error::ConflictingFilters)));

        let stream = Stream::with_filters(vec![0; 4], Filters::FLATE | Filters::ASCII85).unwrap();
        assert_eq!(stream.filter(), Some("[/ASCII85Decode /FlateDecode]"));
    }

    #[test]
    fn free_drops_the_asset() {
        let mut stream = Stream::with_filters(vec![1, 2, 3], Filters::DCT).unwrap();
        assert!(stream.has_asset());
        stream.free();
        assert!(!stream.has_asset());
        assert_eq!(stream.len(), 0);
        assert_eq!(stream.filter(), None);
    }
}
