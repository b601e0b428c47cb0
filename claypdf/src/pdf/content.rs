use std::io;

use crate::{
    config::Config,
    error::{Error, Result},
    pdf::{Bitmap, ResourceName},
    writer::TokenWriter,
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Affine transformation in PDF order `[a b c d e f]`, mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Matrix([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    /// `self · T(tx, ty)`: the translation is applied before `self`.
    pub fn pre_translate(self, tx: f32, ty: f32) -> Self {
        let [a, b, c, d, e, f] = self.0;
        Matrix([a, b, c, d, a * tx + c * ty + e, b * tx + d * ty + f])
    }

    /// `self · S(sx, sy)`: the scale is applied before `self`.
    pub fn pre_scale(self, sx: f32, sy: f32) -> Self {
        let [a, b, c, d, e, f] = self.0;
        Matrix([a * sx, b * sx, c * sy, d * sy, e, f])
    }

    pub fn map(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathVerb {
    Move(Point),
    Line(Point),
    Cubic(Point, Point, Point),
    Close,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    verbs: Vec<PathVerb>,
    current: Point,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.current = Point::new(x, y);
        self.verbs.push(PathVerb::Move(self.current));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.current = Point::new(x, y);
        self.verbs.push(PathVerb::Line(self.current));
        self
    }

    /// Quadratic curves are stored as the equivalent cubic curve.
    pub fn quad_to(self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        let p0 = self.current;
        let c1 = Point::new(p0.x + 2.0 / 3.0 * (cx - p0.x), p0.y + 2.0 / 3.0 * (cy - p0.y));
        let c2 = Point::new(x + 2.0 / 3.0 * (cx - x), y + 2.0 / 3.0 * (cy - y));
        self.cubic_to(c1.x, c1.y, c2.x, c2.y, x, y)
    }

    pub fn cubic_to(mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> Self {
        self.current = Point::new(x, y);
        self.verbs
            .push(PathVerb::Cubic(Point::new(c1x, c1y), Point::new(c2x, c2y), self.current));
        self
    }

    pub fn close(mut self) -> Self {
        self.verbs.push(PathVerb::Close);
        self
    }

    pub fn verbs(&self) -> &[PathVerb] {
        &self.verbs
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::default(),
            join: LineJoin::default(),
            miter: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PaintStyle {
    /// Fill with the nonzero winding rule.
    #[default]
    Fill,
    EvenOddFill,
    Stroke(Stroke),
}

/// Separable and non-separable blend modes of PDF 1.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Name of the mode without the leading `/`.
    pub fn pdf_name(self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// Unpremultiplied RGBA.
    pub color: [u8; 4],
    pub style: PaintStyle,
    pub blend: BlendMode,
    /// The color comes from a shader, which can't be serialized.
    pub shader: bool,
}

impl Paint {
    pub fn fill(color: [u8; 4]) -> Self {
        Self {
            color,
            style: PaintStyle::Fill,
            blend: BlendMode::Normal,
            shader: false,
        }
    }

    pub fn stroke(color: [u8; 4], width: f32) -> Self {
        Self {
            style: PaintStyle::Stroke(Stroke {
                width,
                ..Stroke::default()
            }),
            ..Self::fill(color)
        }
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// The external graphics state this paint needs, if any.
    pub fn graphic_state(&self) -> Option<GraphicState> {
        let state = GraphicState {
            alpha: self.color[3],
            blend: self.blend,
        };
        if state.is_default() {
            None
        } else {
            Some(state)
        }
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::fill([0, 0, 0, 255])
    }
}

/// Constant alpha and blend mode, written as an `/ExtGState` resource.
///
/// Equal states share one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicState {
    pub alpha: u8,
    pub blend: BlendMode,
}

impl GraphicState {
    pub fn is_default(&self) -> bool {
        self.alpha == u8::MAX && self.blend == BlendMode::Normal
    }
}

/// The 14 fonts every PDF reader provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl StandardFont {
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
            StandardFont::Symbol => "Symbol",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Symbolic fonts use their built-in encoding.
    pub fn is_symbolic(self) -> bool {
        matches!(self, StandardFont::Symbol | StandardFont::ZapfDingbats)
    }
}

/// Everything that can be drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        paint: Paint,
    },
    Path {
        path: Path,
        paint: Paint,
    },
    /// Draw `bitmap` into the unit square transformed by `matrix`, scaled to
    /// the bitmap's pixel size.
    Image {
        bitmap: Bitmap,
        matrix: Matrix,
    },
    Text {
        text: String,
        origin: Point,
        font: StandardFont,
        size: f32,
        paint: Paint,
    },
    Oval {
        rect: Rect,
        paint: Paint,
    },
    RoundRect {
        rect: Rect,
        radii: (f32, f32),
        paint: Paint,
    },
    Points {
        points: Vec<Point>,
        paint: Paint,
    },
    Vertices {
        positions: Vec<Point>,
        colors: Vec<[u8; 4]>,
        paint: Paint,
    },
}

impl DrawCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DrawCommand::Rect { .. } => "rect",
            DrawCommand::Path { .. } => "path",
            DrawCommand::Image { .. } => "image",
            DrawCommand::Text { .. } => "text",
            DrawCommand::Oval { .. } => "oval",
            DrawCommand::RoundRect { .. } => "round rect",
            DrawCommand::Points { .. } => "points",
            DrawCommand::Vertices { .. } => "vertices",
        }
    }

    /// The paint of the command, images are drawn without one.
    pub fn paint(&self) -> Option<&Paint> {
        match self {
            DrawCommand::Image { .. } => None,
            DrawCommand::Rect { paint, .. }
            | DrawCommand::Path { paint, .. }
            | DrawCommand::Text { paint, .. }
            | DrawCommand::Oval { paint, .. }
            | DrawCommand::RoundRect { paint, .. }
            | DrawCommand::Points { paint, .. }
            | DrawCommand::Vertices { paint, .. } => Some(paint),
        }
    }

    /// Reject commands and paints that have no serialization.
    pub fn check_supported(&self) -> Result<()> {
        match self {
            DrawCommand::Oval { .. }
            | DrawCommand::RoundRect { .. }
            | DrawCommand::Points { .. }
            | DrawCommand::Vertices { .. } => return Err(Error::Unsupported(self.name())),
            _ => {}
        }
        if self.paint().map_or(false, |p| p.shader) {
            return Err(Error::Unsupported("shader"));
        }
        Ok(())
    }
}

/// Recording surface of one page: content stream operators.
#[derive(Debug)]
pub(crate) struct ContentStream {
    tok: TokenWriter<Vec<u8>>,
}

impl ContentStream {
    pub fn new(config: &Config) -> Self {
        Self {
            tok: TokenWriter::new(Vec::new(), config),
        }
    }

    fn op(&mut self, operator: &str) -> io::Result<()> {
        self.tok.write_str(operator)
    }

    fn scalars(&mut self, values: &[f32]) -> io::Result<()> {
        for &v in values {
            self.tok.write_scalar(v)?;
        }
        Ok(())
    }

    pub fn save(&mut self) -> io::Result<()> {
        self.op("q")
    }

    pub fn restore(&mut self) -> io::Result<()> {
        self.op("Q")
    }

    pub fn concat(&mut self, matrix: &Matrix) -> io::Result<()> {
        self.scalars(&matrix.0)?;
        self.op("cm")
    }

    pub fn clip_rect(&mut self, rect: &Rect) -> io::Result<()> {
        self.rect(rect)?;
        self.op("W")?;
        self.op("n")
    }

    pub fn rect(&mut self, rect: &Rect) -> io::Result<()> {
        self.scalars(&[rect.x, rect.y, rect.width, rect.height])?;
        self.op("re")
    }

    pub fn path(&mut self, path: &Path) -> io::Result<()> {
        for verb in path.verbs() {
            match *verb {
                PathVerb::Move(p) => {
                    self.scalars(&[p.x, p.y])?;
                    self.op("m")?;
                }
                PathVerb::Line(p) => {
                    self.scalars(&[p.x, p.y])?;
                    self.op("l")?;
                }
                PathVerb::Cubic(c1, c2, p) => {
                    self.scalars(&[c1.x, c1.y, c2.x, c2.y, p.x, p.y])?;
                    self.op("c")?;
                }
                PathVerb::Close => self.op("h")?,
            }
        }
        Ok(())
    }

    /// Set the color and line parameters of `paint`.
    pub fn paint_state(&mut self, paint: &Paint) -> io::Result<()> {
        let [r, g, b, _] = paint.color;
        self.scalars(&[unit(r), unit(g), unit(b)])?;
        match paint.style {
            PaintStyle::Fill | PaintStyle::EvenOddFill => self.op("rg"),
            PaintStyle::Stroke(stroke) => {
                self.op("RG")?;
                self.tok.write_scalar(stroke.width)?;
                self.op("w")?;
                self.tok.write_int(stroke.cap as i64)?;
                self.op("J")?;
                self.tok.write_int(stroke.join as i64)?;
                self.op("j")?;
                if stroke.join == LineJoin::Miter {
                    self.tok.write_scalar(stroke.miter)?;
                    self.op("M")?;
                }
                Ok(())
            }
        }
    }

    /// Fill or stroke the current path.
    pub fn paint_path(&mut self, style: &PaintStyle) -> io::Result<()> {
        match style {
            PaintStyle::Fill => self.op("f"),
            PaintStyle::EvenOddFill => self.op("f*"),
            PaintStyle::Stroke(_) => self.op("S"),
        }
    }

    pub fn set_graphic_state(&mut self, name: ResourceName) -> io::Result<()> {
        self.tok.write_name(name)?;
        self.op("gs")
    }

    pub fn draw_xobject(&mut self, name: ResourceName) -> io::Result<()> {
        self.tok.write_name(name)?;
        self.op("Do")
    }

    /// Show `text` at `origin`. Glyphs are flipped back since the page is
    /// drawn with the y axis pointing down.
    pub fn text(&mut self, font: ResourceName, size: f32, origin: Point, text: &[u8]) -> io::Result<()> {
        self.op("BT")?;
        self.tok.write_name(font)?;
        self.tok.write_scalar(size)?;
        self.op("Tf")?;
        self.scalars(&[1.0, 0.0, 0.0, -1.0, origin.x, origin.y])?;
        self.op("Tm")?;
        self.tok.write_string(text)?;
        self.op("Tj")?;
        self.op("ET")
    }

    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        self.tok.comment(text)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.tok.into_inner()
    }
}

fn unit(component: u8) -> f32 {
    f32::from(component) / 255.0
}

/// Characters WinAnsiEncoding places in 0x80..=0x9F, where Latin-1 has its
/// C1 controls. 0x81, 0x8D, 0x8F, 0x90 and 0x9D are unassigned.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

fn win_ansi(c: char) -> Option<u8> {
    match u32::from(c) {
        0x80..=0x9F => None,
        code @ 0..=0xFF => u8::try_from(code).ok(),
        _ => WIN_ANSI_HIGH.iter().find(|&&(chr, _)| chr == c).map(|&(_, code)| code),
    }
}

/// Encode text for a standard font, which declares `/WinAnsiEncoding`.
/// Characters the encoding lacks are replaced by `?`.
pub(crate) fn encode_text(text: &str) -> Vec<u8> {
    text.chars().map(|c| win_ansi(c).unwrap_or(b'?')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::ResourceKind;

    fn content() -> ContentStream {
        ContentStream::new(&Config::compact())
    }

    fn text(c: ContentStream) -> String {
        String::from_utf8(c.into_bytes()).unwrap()
    }

    #[test]
    fn pre_transforms() {
        let m = Matrix::translate(10.0, 20.0).pre_translate(0.0, 5.0).pre_scale(4.0, -5.0);
        assert_eq!(m, Matrix([4.0, 0.0, 0.0, -5.0, 10.0, 25.0]));
        assert_eq!(m.map(Point::new(0.0, 0.0)), Point::new(10.0, 25.0));
        assert_eq!(m.map(Point::new(1.0, 1.0)), Point::new(14.0, 20.0));
    }

    #[test]
    fn filled_rect() {
        let mut c = content();
        c.save().unwrap();
        c.paint_state(&Paint::fill([255, 0, 0, 255])).unwrap();
        c.rect(&Rect::new(10.0, 10.0, 100.0, 50.0)).unwrap();
        c.paint_path(&PaintStyle::Fill).unwrap();
        c.restore().unwrap();
        assert_eq!(text(c), "q 1 0 0 rg 10 10 100 50 re f Q");
    }

    #[test]
    fn stroked_path() {
        let path = Path::new().move_to(0.0, 0.0).line_to(10.0, 0.0).close();
        let paint = Paint::stroke([0, 0, 0, 255], 2.5);
        let mut c = content();
        c.paint_state(&paint).unwrap();
        c.path(&path).unwrap();
        c.paint_path(&paint.style).unwrap();
        assert_eq!(text(c), "0 0 0 RG 2.5 w 0 J 0 j 4 M 0 0 m 10 0 l h S");
    }

    #[test]
    fn quad_becomes_cubic() {
        let path = Path::new().move_to(0.0, 0.0).quad_to(3.0, 3.0, 6.0, 0.0);
        assert_eq!(
            path.verbs()[1],
            PathVerb::Cubic(Point::new(2.0, 2.0), Point::new(4.0, 2.0), Point::new(6.0, 0.0))
        );
    }

    #[test]
    fn image_and_text() {
        let mut c = content();
        c.draw_xobject(ResourceName::new(ResourceKind::XObject, 1).unwrap()).unwrap();
        c.text(
            ResourceName::new(ResourceKind::Font, 2).unwrap(),
            12.0,
            Point::new(72.0, 100.0),
            b"Hi",
        )
        .unwrap();
        assert_eq!(text(c), "/X1 Do BT/F2 12 Tf 1 0 0 -1 72 100 Tm(Hi)Tj ET");
    }

    #[test]
    fn paint_graphic_state() {
        assert_eq!(Paint::fill([1, 2, 3, 255]).graphic_state(), None);
        assert_eq!(
            Paint::fill([1, 2, 3, 128]).graphic_state(),
            Some(GraphicState {
                alpha: 128,
                blend: BlendMode::Normal
            })
        );
        assert_eq!(
            Paint::fill([1, 2, 3, 255])
                .with_blend(BlendMode::Multiply)
                .graphic_state()
                .map(|s| s.blend),
            Some(BlendMode::Multiply)
        );
    }

    #[test]
    fn unsupported_commands() {
        let oval = DrawCommand::Oval {
            rect: Rect::default(),
            paint: Paint::default(),
        };
        assert!(matches!(oval.check_supported(), Err(Error::Unsupported("oval"))));

        let shaded = DrawCommand::Rect {
            rect: Rect::default(),
            paint: Paint {
                shader: true,
                ..Paint::default()
            },
        };
        assert!(matches!(shaded.check_supported(), Err(Error::Unsupported("shader"))));

        let rect = DrawCommand::Rect {
            rect: Rect::default(),
            paint: Paint::default(),
        };
        assert!(rect.check_supported().is_ok());
    }

    #[test]
    fn text_is_win_ansi() {
        assert_eq!(encode_text("Grüße €"), b"Gr\xFC\xDFe \x80".to_vec());
        assert_eq!(encode_text("\u{201C}Œuvre\u{201D}\u{2026}"), b"\x93\x8Cuvre\x94\x85".to_vec());
        // C1 controls have no glyph, and neither has anything past U+00FF
        // that the table lacks
        assert_eq!(encode_text("\u{80}\u{9D}ÿ\u{3B1}"), b"??\xFF?".to_vec());
    }
}
