use std::io;

use time::OffsetDateTime;

use crate::{
    config::Config,
    error::{Error, Result},
    pdf::{
        content::{encode_text, ContentStream},
        decompose, Bitmap, CrossReferenceTable, DecomposedImage, DrawCommand, Filters, GraphicState, ImageKey,
        Mask, Matrix, Paint, PaintStyle, Rect, ResourceKind, ResourceMap, ResourceName, StandardFont, Stream,
    },
    writer::{number, TokenWriter, Writer},
};

/// Four bytes with the high bit set, "Clay" with bit 7 set, tell transfer
/// tools that the file is binary.
const HEADER: &[u8] = b"%PDF-1.4\n%\xC3\xEC\xE1\xF9\n";
const PRODUCER: &str = concat!("claypdf ", env!("CARGO_PKG_VERSION"));

/// Resource dictionaries in the order they appear in `/Resources`.
const RESOURCE_KINDS: [ResourceKind; 4] = [
    ResourceKind::Font,
    ResourceKind::XObject,
    ResourceKind::GraphicState,
    ResourceKind::Pattern,
];

/// Entries of the document information dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    /// Used for `/CreationDate` and `/ModDate`, the time of closing if unset.
    pub date: Option<OffsetDateTime>,
}

impl DocumentInfo {
    fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }
}

/// `D:YYYYMMDDHHmmSS` followed by the UTC offset.
pub(crate) fn pdf_date(date: &OffsetDateTime) -> String {
    let date = date.to_offset(time::UtcOffset::UTC);
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}+00'00'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
    )
}

#[derive(Debug)]
struct OpenPage {
    width: f32,
    height: f32,
    content: ContentStream,
}

#[derive(Debug)]
enum State {
    Fresh,
    PageOpen(OpenPage),
    PageClosed,
    Closed,
}

/// Layout of an image XObject dictionary.
struct ImageHeader {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    bits_per_component: u8,
    /// `/SMask` or `/Mask` and the object number of the mask.
    mask: Option<(&'static str, u32)>,
    /// Tells readers not to convert JPEG data from YCbCr.
    color_transform_off: bool,
}

enum ColorSpace {
    Rgb,
    Gray,
    Indexed { max_index: usize, palette: u32 },
    /// A stencil mask has no color space.
    ImageMask,
}

/// Writes a PDF file in one pass.
///
/// Pages are written as soon as they are ended, images, fonts and graphics
/// states as soon as they are first used. The page tree, the catalog and the
/// cross-reference table follow when the document is closed.
pub struct Document<W: Writer> {
    tok: TokenWriter<W>,
    config: Config,
    state: State,
    /// Sink position of the header, offsets are relative to it.
    origin: usize,
    xref: CrossReferenceTable,
    info_number: u32,
    catalog_number: u32,
    page_tree_number: u32,
    pages: Vec<u32>,
    name_index: u32,
    info: DocumentInfo,
    xmp_metadata: Option<Vec<u8>>,

    bitmaps: ResourceMap<ImageKey, ResourceName>,
    graphic_states: ResourceMap<GraphicState, ResourceName>,
    fonts: ResourceMap<StandardFont, ResourceName>,
    /// Resource name to object number, one per [`RESOURCE_KINDS`] entry.
    dictionaries: [ResourceMap<ResourceName, u32>; 4],
}

impl<W: Writer> Document<W> {
    /// Write the file header to `sink` and start a document.
    pub fn new(sink: W, config: Config) -> Result<Self> {
        let origin = sink.position();
        let mut tok = TokenWriter::new(sink, &config);
        tok.raw(HEADER)?;

        let mut xref = CrossReferenceTable::new();
        let info_number = xref.next_unused()?;
        let catalog_number = xref.next_unused()?;
        let page_tree_number = xref.next_unused()?;
        log::debug!("start document at sink position {}", origin);

        Ok(Self {
            tok,
            config,
            state: State::Fresh,
            origin,
            xref,
            info_number,
            catalog_number,
            page_tree_number,
            pages: Vec::new(),
            name_index: 0,
            info: DocumentInfo::default(),
            xmp_metadata: None,
            bitmaps: ResourceMap::new(),
            graphic_states: ResourceMap::new(),
            fonts: ResourceMap::new(),
            dictionaries: Default::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    pub fn set_info(&mut self, info: DocumentInfo) -> Result<()> {
        self.require_not_closed()?;
        self.info = info;
        Ok(())
    }

    /// XMP packet referenced by the catalog's `/Metadata` entry.
    pub fn set_xmp_metadata(&mut self, xmp: Vec<u8>) -> Result<()> {
        self.require_not_closed()?;
        self.xmp_metadata = Some(xmp);
        Ok(())
    }

    /// Start a page of `width` x `height` points. Content is drawn with the
    /// origin in the top left corner and the y axis pointing down.
    ///
    /// If `crop` is given, drawing is clipped to it and its top left corner
    /// becomes the origin.
    pub fn begin_page(&mut self, width: f32, height: f32, crop: Option<Rect>) -> Result<()> {
        match self.state {
            State::Fresh | State::PageClosed => {}
            State::PageOpen(_) => {
                log::warn!("begin_page: a page is already open");
                return Err(Error::PageAlreadyOpen);
            }
            State::Closed => {
                log::warn!("begin_page: document is closed");
                return Err(Error::DocumentClosed);
            }
        }
        log::debug!("begin page {} ({} x {})", self.pages.len() + 1, width, height);

        let mut content = ContentStream::new(&self.config);
        content.concat(&Matrix([1.0, 0.0, 0.0, -1.0, 0.0, height]))?;
        if let Some(crop) = crop {
            content.clip_rect(&crop)?;
            content.concat(&Matrix::translate(crop.x, crop.y))?;
        }
        self.state = State::PageOpen(OpenPage { width, height, content });
        Ok(())
    }

    /// Record `command` on the open page. Resources it uses are written
    /// right away.
    pub fn draw(&mut self, command: &DrawCommand) -> Result<()> {
        self.content()?;
        if let Err(err) = command.check_supported() {
            log::warn!("skip {} draw: {}", command.name(), err);
            return Err(err);
        }
        if let DrawCommand::Path { path, .. } = command {
            if path.is_empty() {
                return Ok(());
            }
        }

        let graphic_state = match command.paint().and_then(|p| p.graphic_state()) {
            Some(state) => Some(self.graphic_state(&state)?),
            None => None,
        };

        match command {
            DrawCommand::Rect { rect, paint } => {
                let content = self.content()?;
                content.comment("rect")?;
                content.save()?;
                if let Some(name) = graphic_state {
                    content.set_graphic_state(name)?;
                }
                content.paint_state(paint)?;
                content.rect(rect)?;
                content.paint_path(&paint.style)?;
                content.restore()?;
            }
            DrawCommand::Path { path, paint } => {
                let content = self.content()?;
                content.comment("path")?;
                content.save()?;
                if let Some(name) = graphic_state {
                    content.set_graphic_state(name)?;
                }
                content.paint_state(paint)?;
                content.path(path)?;
                content.paint_path(&paint.style)?;
                content.restore()?;
            }
            DrawCommand::Image { bitmap, matrix } => {
                if !matrix.is_finite() {
                    return Err(Error::Unsupported("non finite image matrix"));
                }
                let name = self.bitmap(bitmap)?;
                // map the unit square onto the bitmap, upside down
                let (w, h) = (bitmap.width as f32, bitmap.height as f32);
                let matrix = matrix.pre_translate(0.0, h).pre_scale(w, -h);
                let content = self.content()?;
                content.comment("image")?;
                content.save()?;
                content.concat(&matrix)?;
                content.draw_xobject(name)?;
                content.restore()?;
            }
            DrawCommand::Text {
                text,
                origin,
                font,
                size,
                paint,
            } => {
                let name = self.font(*font)?;
                let fill = Paint {
                    style: PaintStyle::Fill,
                    ..*paint
                };
                let content = self.content()?;
                content.comment("text")?;
                content.save()?;
                if let Some(name) = graphic_state {
                    content.set_graphic_state(name)?;
                }
                content.paint_state(&fill)?;
                content.text(name, *size, *origin, &encode_text(text))?;
                content.restore()?;
            }
            DrawCommand::Oval { .. }
            | DrawCommand::RoundRect { .. }
            | DrawCommand::Points { .. }
            | DrawCommand::Vertices { .. } => return Err(Error::Unsupported(command.name())),
        }
        Ok(())
    }

    /// Write the content stream and the page object of the open page.
    pub fn end_page(&mut self) -> Result<()> {
        let page = match std::mem::replace(&mut self.state, State::PageClosed) {
            State::PageOpen(page) => page,
            other => {
                let err = if matches!(other, State::Closed) {
                    Error::DocumentClosed
                } else {
                    Error::NoOpenPage
                };
                log::warn!("end_page: {}", err);
                self.state = other;
                return Err(err);
            }
        };

        let mut stream = Stream::new(page.content.into_bytes());
        stream.deflate(self.config.stream_encoding());
        self.tok.comment("Content Stream")?;
        let contents = self.write_stream(&stream)?;
        stream.free();

        self.tok.comment("Page Object")?;
        let number = self.start_indirect_object(None)?;
        self.tok.begin_dict(Some("Page"))?;
        self.tok.write_str("/Parent")?;
        self.tok.write_indirect_reference(self.page_tree_number)?;
        self.tok.write_str("/MediaBox")?;
        self.tok.write_str("[")?;
        self.tok.write_int(0)?;
        self.tok.write_int(0)?;
        self.tok.write_scalar(page.width)?;
        self.tok.write_scalar(page.height)?;
        self.tok.write_str("]")?;
        self.tok.write_str("/Contents")?;
        self.tok.write_indirect_reference(contents)?;
        self.tok.end_dict()?;
        self.end_indirect_object()?;

        self.pages.push(number);
        log::debug!("page {} written as object {}", self.pages.len(), number);
        Ok(())
    }

    /// Write the trailing objects, the cross-reference table and the
    /// trailer. An open page is ended first.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            State::Closed => {
                log::warn!("close: document is already closed");
                return Err(Error::DocumentClosed);
            }
            State::PageOpen(_) => self.end_page()?,
            State::Fresh | State::PageClosed => {}
        }

        let metadata = match self.xmp_metadata.take() {
            Some(xmp) => Some(self.write_metadata(xmp)?),
            None => None,
        };
        self.write_info()?;
        self.write_catalog(metadata)?;
        self.write_page_tree()?;

        self.tok.comment("Cross-Reference Table")?;
        self.tok.ensure_line_start()?;
        let xref_offset = self.offset();
        let size = self.xref.max_number() + 1;
        self.xref.write(&mut self.tok)?;

        self.tok.comment("Trailer")?;
        self.tok.raw(b"trailer\n")?;
        self.tok.begin_dict(None)?;
        self.tok.write_str("/Root")?;
        self.tok.write_indirect_reference(self.catalog_number)?;
        self.tok.write_str("/Size")?;
        self.tok.write_int(i64::from(size))?;
        self.tok.write_str("/Info")?;
        self.tok.write_indirect_reference(self.info_number)?;
        self.tok.end_dict()?;
        self.tok.raw(b"\nstartxref\n")?;
        self.tok.raw(number::format_size(xref_offset, 0).as_bytes())?;
        self.tok.raw(b"\n%%EOF\n")?;
        self.tok.flush()?;

        log::debug!("closed document with {} pages and {} objects", self.pages.len(), self.xref.len());
        self.bitmaps.reset();
        self.graphic_states.reset();
        self.fonts.reset();
        for dictionary in &mut self.dictionaries {
            dictionary.reset();
        }
        self.xref.reset();
        self.state = State::Closed;
        Ok(())
    }

    /// Close the document if that did not happen yet and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        if !self.is_closed() {
            self.close()?;
        }
        Ok(self.tok.into_inner())
    }

    /// Name of the image XObject showing `bitmap`. Equal bitmaps are only
    /// embedded once.
    pub fn bitmap(&mut self, bitmap: &Bitmap) -> Result<ResourceName> {
        self.require_not_closed()?;
        let key = bitmap.key();
        if let Some(name) = self.bitmaps.find(&key) {
            return Ok(*name);
        }
        let number = match self.serialize_bitmap(bitmap) {
            Ok(number) => number,
            Err(err) => {
                log::warn!("can't embed image {:?}: {}", key, err);
                return Err(err);
            }
        };
        let name = self.register(ResourceKind::XObject, number)?;
        self.bitmaps.add(key, name)?;
        Ok(name)
    }

    /// Name of an external graphics state with the given alpha and blend mode.
    pub fn graphic_state(&mut self, state: &GraphicState) -> Result<ResourceName> {
        self.require_not_closed()?;
        if let Some(name) = self.graphic_states.find(state) {
            return Ok(*name);
        }
        self.tok.comment("External Graphic State")?;
        let number = self.start_indirect_object(None)?;
        let alpha = f32::from(state.alpha) / 255.0;
        self.tok.begin_dict(Some("ExtGState"))?;
        self.tok.write_str("/CA")?;
        self.tok.write_scalar(alpha)?;
        self.tok.write_str("/ca")?;
        self.tok.write_scalar(alpha)?;
        self.tok.write_str("/BM")?;
        self.tok.write_as_name(state.blend.pdf_name())?;
        self.tok.end_dict()?;
        self.end_indirect_object()?;

        let name = self.register(ResourceKind::GraphicState, number)?;
        self.graphic_states.add(*state, name)?;
        Ok(name)
    }

    /// Name of one of the standard fonts.
    pub fn font(&mut self, font: StandardFont) -> Result<ResourceName> {
        self.require_not_closed()?;
        if let Some(name) = self.fonts.find(&font) {
            return Ok(*name);
        }
        self.tok.comment("Font")?;
        let number = self.start_indirect_object(None)?;
        self.tok.begin_dict(Some("Font"))?;
        self.tok.write_str("/Subtype/Type1")?;
        self.tok.write_str("/BaseFont")?;
        self.tok.write_as_name(font.base_font())?;
        if !font.is_symbolic() {
            self.tok.write_str("/Encoding/WinAnsiEncoding")?;
        }
        self.tok.end_dict()?;
        self.end_indirect_object()?;

        let name = self.register(ResourceKind::Font, number)?;
        self.fonts.add(font, name)?;
        Ok(name)
    }

    fn require_not_closed(&self) -> Result<()> {
        if self.is_closed() {
            log::warn!("document is closed");
            Err(Error::DocumentClosed)
        } else {
            Ok(())
        }
    }

    fn content(&mut self) -> Result<&mut ContentStream> {
        match &mut self.state {
            State::PageOpen(page) => Ok(&mut page.content),
            State::Closed => Err(Error::DocumentClosed),
            State::Fresh | State::PageClosed => Err(Error::NoOpenPage),
        }
    }

    /// Assign the next name and add it to the resource dictionary of `kind`.
    fn register(&mut self, kind: ResourceKind, number: u32) -> Result<ResourceName> {
        self.name_index += 1;
        let name = ResourceName::new(kind, self.name_index)?;
        let index = RESOURCE_KINDS
            .iter()
            .position(|&k| k == kind)
            .ok_or(Error::Unsupported("resource kind"))?;
        self.dictionaries[index].add(name, number)?;
        Ok(name)
    }

    fn offset(&self) -> usize {
        self.tok.position() - self.origin
    }

    /// Start `number 0 obj` on a new line, a new number if `None`.
    fn start_indirect_object(&mut self, number: Option<u32>) -> Result<u32> {
        let number = match number {
            Some(number) => number,
            None => self.xref.next_unused()?,
        };
        self.tok.ensure_line_start()?;
        self.xref.set_offset(number, self.offset())?;
        log::trace!("write object {} at offset {}", number, self.offset());
        self.tok.begin_indirect_object(number)?;
        Ok(number)
    }

    fn end_indirect_object(&mut self) -> io::Result<()> {
        self.tok.write_str("endobj")?;
        self.tok.raw(b"\n")
    }

    /// Write a stream object with the entries written by `header` followed by
    /// `/Filter` and `/Length`.
    fn write_stream_with<F>(&mut self, stream: &Stream, header: F) -> Result<u32>
    where
        F: FnOnce(&mut TokenWriter<W>) -> io::Result<()>,
    {
        let number = self.start_indirect_object(None)?;
        self.tok.begin_dict(None)?;
        header(&mut self.tok)?;
        if let Some(filter) = stream.filter() {
            self.tok.write_str("/Filter")?;
            self.tok.write_str(filter)?;
        }
        self.tok.write_str("/Length")?;
        self.tok.write_size(stream.len(), 0)?;
        self.tok.end_dict()?;
        self.tok.write_str("stream\n")?;
        self.tok.raw(stream.data())?;
        self.tok.write_str("\nendstream")?;
        self.end_indirect_object()?;
        Ok(number)
    }

    fn write_stream(&mut self, stream: &Stream) -> Result<u32> {
        self.write_stream_with(stream, |_| Ok(()))
    }

    fn write_image(&mut self, stream: &Stream, image: ImageHeader) -> Result<u32> {
        self.write_stream_with(stream, |tok| {
            tok.write_str("/Type/XObject")?;
            tok.write_str("/Subtype/Image")?;
            tok.write_str("/Width")?;
            tok.write_int(i64::from(image.width))?;
            tok.write_str("/Height")?;
            tok.write_int(i64::from(image.height))?;
            match image.color_space {
                ColorSpace::Rgb => tok.write_str("/ColorSpace/DeviceRGB")?,
                ColorSpace::Gray => tok.write_str("/ColorSpace/DeviceGray")?,
                ColorSpace::Indexed { max_index, palette } => {
                    tok.write_str("/ColorSpace")?;
                    tok.write_str("[/Indexed/DeviceRGB")?;
                    tok.write_size(max_index, 0)?;
                    tok.write_indirect_reference(palette)?;
                    tok.write_str("]")?;
                }
                ColorSpace::ImageMask => tok.write_str("/ImageMask true")?,
            }
            tok.write_str("/BitsPerComponent")?;
            tok.write_int(i64::from(image.bits_per_component))?;
            if image.color_transform_off {
                tok.write_str("/ColorTransform 0")?;
            }
            if let Some((key, number)) = image.mask {
                tok.write_str(key)?;
                tok.write_indirect_reference(number)?;
            }
            Ok(())
        })
    }

    fn serialize_bitmap(&mut self, bitmap: &Bitmap) -> Result<u32> {
        let encoding = self.config.stream_encoding();
        let planes = match decompose(bitmap)? {
            DecomposedImage::Jpeg(data) => {
                let mut stream = Stream::with_filters(data, Filters::DCT)?;
                stream.deflate(encoding);
                self.tok.comment("JPEG")?;
                return self.write_image(
                    &stream,
                    ImageHeader {
                        width: bitmap.width,
                        height: bitmap.height,
                        color_space: ColorSpace::Rgb,
                        bits_per_component: 8,
                        mask: None,
                        color_transform_off: true,
                    },
                );
            }
            DecomposedImage::Planes(planes) => planes,
        };

        let plane = |color_space, bits_per_component, mask| ImageHeader {
            width: bitmap.width,
            height: bitmap.height,
            color_space,
            bits_per_component,
            mask,
            color_transform_off: false,
        };

        let palette_len = planes.palette_len();
        let mask = match planes.mask {
            Some(Mask::Stencil(bits)) => {
                let mut stream = Stream::new(bits);
                stream.deflate(encoding);
                self.tok.comment("stencil mask (1 bit per pixel)")?;
                let number = self.write_image(&stream, plane(ColorSpace::ImageMask, 1, None))?;
                Some(("/Mask", number))
            }
            Some(Mask::Alpha(alpha)) => {
                let mut stream = Stream::new(alpha);
                stream.deflate(encoding);
                self.tok.comment("alpha mask")?;
                let number = self.write_image(&stream, plane(ColorSpace::Gray, 8, None))?;
                Some(("/SMask", number))
            }
            None => None,
        };

        let color_space = match planes.palette {
            Some(palette) => {
                let mut stream = Stream::new(palette);
                stream.deflate(encoding);
                self.tok.comment("color table")?;
                let number = self.write_stream(&stream)?;
                ColorSpace::Indexed {
                    max_index: palette_len - 1,
                    palette: number,
                }
            }
            None => ColorSpace::Rgb,
        };

        let mut stream = Stream::new(planes.color);
        stream.deflate(encoding);
        self.tok.comment("bitmap")?;
        self.write_image(&stream, plane(color_space, 8, mask))
    }

    fn write_metadata(&mut self, xmp: Vec<u8>) -> Result<u32> {
        let mut stream = Stream::new(xmp);
        stream.deflate(self.config.stream_encoding());
        self.tok.comment("XMP Metadata")?;
        self.write_stream_with(&stream, |tok| {
            tok.write_str("/Type/Metadata")?;
            tok.write_str("/Subtype/XML")
        })
    }

    fn write_info(&mut self) -> Result<()> {
        self.tok.comment("Document Information Dictionary")?;
        self.start_indirect_object(Some(self.info_number))?;
        self.tok.begin_dict(None)?;
        for (key, value) in self.info.entries() {
            self.tok.write_as_name(key)?;
            self.tok.write_string(value.as_bytes())?;
        }
        self.tok.write_str("/Producer")?;
        self.tok.write_string(PRODUCER.as_bytes())?;
        let date = pdf_date(&self.info.date.unwrap_or_else(OffsetDateTime::now_utc));
        self.tok.write_str("/CreationDate")?;
        self.tok.write_string(date.as_bytes())?;
        self.tok.write_str("/ModDate")?;
        self.tok.write_string(date.as_bytes())?;
        self.tok.end_dict()?;
        self.end_indirect_object()?;
        Ok(())
    }

    fn write_catalog(&mut self, metadata: Option<u32>) -> Result<()> {
        self.tok.comment("Catalog")?;
        self.start_indirect_object(Some(self.catalog_number))?;
        self.tok.begin_dict(Some("Catalog"))?;
        self.tok.write_str("/Pages")?;
        self.tok.write_indirect_reference(self.page_tree_number)?;
        if let Some(metadata) = metadata {
            self.tok.write_str("/Metadata")?;
            self.tok.write_indirect_reference(metadata)?;
        }
        self.tok.end_dict()?;
        self.end_indirect_object()?;
        Ok(())
    }

    fn write_page_tree(&mut self) -> Result<()> {
        self.tok.comment("Page Tree Node")?;
        self.start_indirect_object(Some(self.page_tree_number))?;
        self.tok.begin_dict(Some("Pages"))?;
        self.tok.write_str("/Count")?;
        self.tok.write_size(self.pages.len(), 0)?;

        self.tok.write_str("/Resources")?;
        self.tok.begin_dict(None)?;
        for (kind, dictionary) in RESOURCE_KINDS.iter().zip(&self.dictionaries) {
            if dictionary.is_empty() {
                continue;
            }
            self.tok.write_as_name(kind.dictionary_key())?;
            self.tok.begin_dict(None)?;
            for (name, number) in dictionary.iter() {
                self.tok.write_name(*name)?;
                self.tok.write_indirect_reference(*number)?;
            }
            self.tok.end_dict()?;
        }
        self.tok.end_dict()?;

        self.tok.write_str("/Kids")?;
        self.tok.write_str("[")?;
        for &page in &self.pages {
            self.tok.write_indirect_reference(page)?;
        }
        self.tok.write_str("]")?;
        self.tok.end_dict()?;
        self.end_indirect_object()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Pixels, Point};

    fn epoch() -> DocumentInfo {
        DocumentInfo {
            date: Some(OffsetDateTime::UNIX_EPOCH),
            ..DocumentInfo::default()
        }
    }

    fn document() -> Document<Vec<u8>> {
        let mut doc = Document::new(Vec::new(), Config::compact()).unwrap();
        doc.set_info(epoch()).unwrap();
        doc
    }

    fn gray(generation_id: u32) -> Bitmap {
        Bitmap::new(
            generation_id,
            2,
            2,
            Pixels::Gray8 {
                data: vec![0, 64, 128, 255],
                row_bytes: 2,
            },
        )
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn date_format() {
        assert_eq!(pdf_date(&OffsetDateTime::UNIX_EPOCH), "D:19700101000000+00'00'");
    }

    #[test]
    fn header_and_reserved_numbers() {
        let doc = document();
        assert_eq!(doc.info_number, 1);
        assert_eq!(doc.catalog_number, 2);
        assert_eq!(doc.page_tree_number, 3);
        assert_eq!(doc.tok.get_ref(), &HEADER.to_vec());
        assert!(HEADER[10..14].iter().all(|&b| b >= 128));
    }

    #[test]
    fn empty_document() {
        let out = document().finish().unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("<</Type/Pages/Count 0/Resources<<>>/Kids[]>>"), "{}", text);
        assert!(text.contains("trailer\n<</Root 2 0 R/Size 4/Info 1 0 R>>\nstartxref\n"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn lifecycle() {
        let mut doc = document();
        assert!(matches!(doc.end_page(), Err(Error::NoOpenPage)));
        assert!(matches!(
            doc.draw(&DrawCommand::Rect {
                rect: Rect::default(),
                paint: Paint::default()
            }),
            Err(Error::NoOpenPage)
        ));
        doc.begin_page(100.0, 100.0, None).unwrap();
        assert!(matches!(doc.begin_page(100.0, 100.0, None), Err(Error::PageAlreadyOpen)));
        doc.end_page().unwrap();
        assert!(matches!(doc.end_page(), Err(Error::NoOpenPage)));
        doc.begin_page(100.0, 100.0, None).unwrap();
        // closing ends the open page
        doc.close().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert!(matches!(doc.close(), Err(Error::DocumentClosed)));
        assert!(matches!(doc.begin_page(1.0, 1.0, None), Err(Error::DocumentClosed)));
        assert!(matches!(doc.end_page(), Err(Error::DocumentClosed)));
        assert!(matches!(doc.set_info(DocumentInfo::default()), Err(Error::DocumentClosed)));
        // finish after close only returns the sink
        assert!(doc.finish().is_ok());
    }

    #[test]
    fn page_content_is_flipped() {
        let mut doc = Document::new(Vec::new(), Config {
            compress: false,
            ..Config::compact()
        })
        .unwrap();
        doc.set_info(epoch()).unwrap();
        doc.begin_page(612.0, 792.0, Some(Rect::new(10.0, 20.0, 100.0, 200.0)))
            .unwrap();
        doc.end_page().unwrap();
        let out = doc.finish().unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(
            text.contains("stream\n1 0 0 -1 0 792 cm 10 20 100 200 re W n 1 0 0 1 10 20 cm\nendstream"),
            "{}",
            text
        );
        assert!(text.contains("/MediaBox[0 0 612 792]"));
    }

    #[test]
    fn images_are_deduplicated() {
        let mut doc = document();
        doc.begin_page(100.0, 100.0, None).unwrap();
        let first = doc.bitmap(&gray(7)).unwrap();
        let again = doc.bitmap(&gray(7)).unwrap();
        let other = doc.bitmap(&gray(8)).unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(first.to_string(), "/X1");
        assert_eq!(other.to_string(), "/X2");
        let out = doc.finish().unwrap();
        assert_eq!(count(&out, b"/Subtype/Image"), 2);
        assert!(count(&out, b"/XObject<</X1 4 0 R/X2 5 0 R>>") == 1);
    }

    #[test]
    fn unsupported_image_draws_nothing() {
        let mut doc = document();
        doc.begin_page(100.0, 100.0, None).unwrap();
        let unknown = DrawCommand::Image {
            bitmap: Bitmap::new(1, 1, 1, Pixels::Unknown),
            matrix: Matrix::IDENTITY,
        };
        assert!(matches!(doc.draw(&unknown), Err(Error::UnsupportedImage(_))));
        doc.draw(&DrawCommand::Oval {
            rect: Rect::default(),
            paint: Paint::default(),
        })
        .unwrap_err();
        let out = doc.finish().unwrap();
        assert_eq!(count(&out, b" Do"), 0);
        assert_eq!(count(&out, b"/XObject"), 0);
    }

    #[test]
    fn translucent_paint_uses_graphic_state() {
        let mut doc = Document::new(Vec::new(), Config {
            compress: false,
            ..Config::compact()
        })
        .unwrap();
        doc.set_info(epoch()).unwrap();
        doc.begin_page(100.0, 100.0, None).unwrap();
        let rect = DrawCommand::Rect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            paint: Paint::fill([255, 0, 0, 51]),
        };
        doc.draw(&rect).unwrap();
        doc.draw(&rect).unwrap();
        let out = doc.finish().unwrap();
        let text = String::from_utf8_lossy(&out);
        assert_eq!(count(&out, b"/Type/ExtGState"), 1);
        assert!(text.contains("<</Type/ExtGState/CA 0.2/ca 0.2/BM/Normal>>"), "{}", text);
        assert_eq!(count(&out, b"/G1 gs"), 2);
        assert!(text.contains("/ExtGState<</G1 4 0 R>>"));
    }

    #[test]
    fn empty_translucent_path_writes_no_graphic_state() {
        let mut doc = document();
        doc.begin_page(100.0, 100.0, None).unwrap();
        doc.draw(&DrawCommand::Path {
            path: crate::pdf::Path::new(),
            paint: Paint::fill([0, 0, 0, 128]),
        })
        .unwrap();
        let out = doc.finish().unwrap();
        let text = String::from_utf8_lossy(&out);
        assert_eq!(count(&out, b"/Type/ExtGState"), 0);
        assert!(text.contains("/Count 1/Resources<<>>/Kids"), "{}", text);
    }

    #[test]
    fn text_uses_standard_font() {
        let mut doc = Document::new(Vec::new(), Config {
            compress: false,
            ..Config::compact()
        })
        .unwrap();
        doc.begin_page(100.0, 100.0, None).unwrap();
        doc.draw(&DrawCommand::Text {
            text: "Hello".into(),
            origin: Point::new(10.0, 20.0),
            font: StandardFont::Helvetica,
            size: 12.0,
            paint: Paint::default(),
        })
        .unwrap();
        let out = doc.finish().unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/BaseFont/Helvetica/Encoding/WinAnsiEncoding"));
        assert!(text.contains("BT/F1 12 Tf 1 0 0 -1 10 20 Tm(Hello)Tj ET"), "{}", text);
        assert!(text.contains("/Font<</F1 4 0 R>>"));
    }

    #[test]
    fn info_entries() {
        let mut doc = document();
        doc.set_info(DocumentInfo {
            title: Some("Report (draft)".into()),
            author: Some("Somebody".into()),
            ..epoch()
        })
        .unwrap();
        let out = doc.finish().unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains(
            "1 0 obj<</Title(Report \\(draft\\))/Author(Somebody)/Producer(claypdf "
        ));
        assert!(text.contains("/CreationDate(D:19700101000000+00'00')/ModDate(D:19700101000000+00'00')>>"));
    }

    #[test]
    fn xmp_metadata_is_referenced() {
        let mut doc = document();
        doc.set_xmp_metadata(b"<x:xmpmeta/>".to_vec()).unwrap();
        let out = doc.finish().unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("4 0 obj<</Type/Metadata/Subtype/XML/Length 12>>stream\n<x:xmpmeta/>\nendstream"));
        assert!(text.contains("<</Type/Catalog/Pages 3 0 R/Metadata 4 0 R>>"));
        assert!(text.contains("/Size 5"));
    }

    struct Broken;

    impl Writer for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "broken pipe"))
        }

        fn position(&self) -> usize {
            0
        }
    }

    #[test]
    fn sink_errors_propagate() {
        assert!(matches!(Document::new(Broken, Config::default()), Err(Error::Io(_))));
    }
}
