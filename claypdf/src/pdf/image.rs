use crate::{
    error::{Error, Result},
    pdf::ImageKey,
};

/// Pixel storage of a [`Bitmap`].
///
/// Every row starts `row_bytes` after the previous one, bytes past the
/// visible width are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pixels {
    /// RGBA, color components premultiplied by alpha.
    Premultiplied32 { data: Vec<u8>, row_bytes: usize },
    /// One byte per pixel, indexing premultiplied RGBA palette entries.
    Indexed8 {
        indices: Vec<u8>,
        row_bytes: usize,
        palette: Vec<[u8; 4]>,
    },
    /// RGBA, not premultiplied.
    Rgba8 { data: Vec<u8>, row_bytes: usize },
    Gray8 { data: Vec<u8>, row_bytes: usize },
    Unknown,
}

/// An image as handed over by the drawing side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Pixels,
    /// The file the pixels were decoded from, if it is still around.
    pub encoded: Option<Vec<u8>>,
    /// Identifies the pixel content. Bitmaps sharing a buffer share the id.
    pub generation_id: u32,
    /// Position of this bitmap in the shared pixel buffer.
    pub origin: (i32, i32),
    /// The bitmap shows only part of the shared pixel buffer.
    pub subset: bool,
}

impl Bitmap {
    pub fn new(generation_id: u32, width: u32, height: u32, pixels: Pixels) -> Self {
        Self {
            width,
            height,
            pixels,
            encoded: None,
            generation_id,
            origin: (0, 0),
            subset: false,
        }
    }

    pub fn with_encoded(mut self, encoded: Vec<u8>) -> Self {
        self.encoded = Some(encoded);
        self
    }

    pub fn key(&self) -> ImageKey {
        ImageKey {
            generation_id: self.generation_id,
            origin: self.origin,
            dimensions: (self.width, self.height),
        }
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Transparency of a decomposed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mask {
    /// One byte of alpha per pixel, embedded as `/SMask`.
    Alpha(Vec<u8>),
    /// One bit per pixel, 1 means transparent. Rows are padded to whole
    /// bytes. Embedded as `/Mask`.
    Stencil(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlanes {
    /// Three bytes per pixel, or one palette index per pixel if `palette` is
    /// set.
    pub color: Vec<u8>,
    pub mask: Option<Mask>,
    /// Unpremultiplied RGB triples.
    pub palette: Option<Vec<u8>>,
}

impl ImagePlanes {
    /// Number of palette entries.
    pub fn palette_len(&self) -> usize {
        self.palette.as_ref().map_or(0, |p| p.len() / 3)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecomposedImage {
    /// A JFIF file that can be embedded as it is.
    Jpeg(Vec<u8>),
    Planes(ImagePlanes),
}

const JPEG_SOI_APP0: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
const JFIF_ID: &[u8; 5] = b"JFIF\0";

/// Returns the encoded bytes if they are a JFIF file describing exactly this
/// bitmap.
pub fn extract_jpeg(bitmap: &Bitmap) -> Option<&[u8]> {
    if bitmap.subset || bitmap.origin != (0, 0) {
        return None;
    }
    let data = bitmap.encoded.as_deref()?;
    if data.len() < 11 || data[..4] != JPEG_SOI_APP0 || &data[6..11] != JFIF_ID {
        return None;
    }
    Some(data)
}

/// Split a bitmap into the planes a PDF image XObject is made of.
pub fn decompose(bitmap: &Bitmap) -> Result<DecomposedImage> {
    if let Some(jpeg) = extract_jpeg(bitmap) {
        return Ok(DecomposedImage::Jpeg(jpeg.to_vec()));
    }
    if bitmap.width == 0 || bitmap.height == 0 {
        return Err(Error::UnsupportedImage("bitmap is empty"));
    }

    let planes = match &bitmap.pixels {
        Pixels::Unknown => return Err(Error::UnsupportedImage("unknown pixel format")),
        Pixels::Premultiplied32 { data, row_bytes } => {
            let rows = rows(bitmap, data, *row_bytes, 4)?;
            premultiplied_planes(bitmap, rows)
        }
        Pixels::Indexed8 {
            indices,
            row_bytes,
            palette,
        } => {
            let rows = rows(bitmap, indices, *row_bytes, 1)?;
            indexed_planes(bitmap, rows, palette)?
        }
        Pixels::Rgba8 { data, row_bytes } => {
            let rows = rows(bitmap, data, *row_bytes, 4)?;
            rgba_planes(bitmap, rows)
        }
        Pixels::Gray8 { data, row_bytes } => {
            let rows = rows(bitmap, data, *row_bytes, 1)?;
            let mut color = Vec::with_capacity(3 * bitmap.pixel_count());
            for row in rows {
                for &gray in row {
                    color.extend_from_slice(&[gray, gray, gray]);
                }
            }
            ImagePlanes {
                color,
                mask: None,
                palette: None,
            }
        }
    };
    Ok(DecomposedImage::Planes(planes))
}

/// Iterate over the visible part of every row.
fn rows<'a>(
    bitmap: &Bitmap,
    data: &'a [u8],
    row_bytes: usize,
    bytes_per_pixel: usize,
) -> Result<impl Iterator<Item = &'a [u8]> + Clone> {
    let width_bytes = bitmap.width as usize * bytes_per_pixel;
    let height = bitmap.height as usize;
    if row_bytes < width_bytes {
        return Err(Error::UnsupportedImage("rows are shorter than the width"));
    }
    let needed = row_bytes
        .checked_mul(height)
        .ok_or(Error::UnsupportedImage("pixel buffer size overflows"))?;
    if data.len() < needed {
        return Err(Error::UnsupportedImage("pixel buffer is too short"));
    }
    Ok(data.chunks(row_bytes).take(height).map(move |row| &row[..width_bytes]))
}

/// Fixed point factor that undoes premultiplication by `alpha`.
fn unpremul_scale(alpha: u8) -> u32 {
    match alpha {
        0 => 0,
        a => {
            let a = u32::from(a);
            ((255 << 24) + a / 2) / a
        }
    }
}

fn unpremul(scale: u32, component: u8) -> u8 {
    let value = (u64::from(scale) * u64::from(component) + (1 << 23)) >> 24;
    value.min(255) as u8
}

fn unpremul_rgb(pixel: [u8; 4], out: &mut Vec<u8>) {
    let scale = unpremul_scale(pixel[3]);
    out.extend(pixel[..3].iter().map(|&c| unpremul(scale, c)));
}

fn alpha_mask(alpha: Vec<u8>) -> Option<Mask> {
    if alpha.iter().all(|&a| a == u8::MAX) {
        None
    } else {
        Some(Mask::Alpha(alpha))
    }
}

fn premultiplied_planes<'a>(bitmap: &Bitmap, rows: impl Iterator<Item = &'a [u8]>) -> ImagePlanes {
    let mut color = Vec::with_capacity(3 * bitmap.pixel_count());
    let mut alpha = Vec::with_capacity(bitmap.pixel_count());
    for row in rows {
        for pixel in row.chunks_exact(4) {
            unpremul_rgb([pixel[0], pixel[1], pixel[2], pixel[3]], &mut color);
            alpha.push(pixel[3]);
        }
    }
    ImagePlanes {
        color,
        mask: alpha_mask(alpha),
        palette: None,
    }
}

fn rgba_planes<'a>(bitmap: &Bitmap, rows: impl Iterator<Item = &'a [u8]>) -> ImagePlanes {
    let mut color = Vec::with_capacity(3 * bitmap.pixel_count());
    let mut alpha = Vec::with_capacity(bitmap.pixel_count());
    for row in rows {
        for pixel in row.chunks_exact(4) {
            color.extend_from_slice(&pixel[..3]);
            alpha.push(pixel[3]);
        }
    }
    ImagePlanes {
        color,
        mask: alpha_mask(alpha),
        palette: None,
    }
}

fn indexed_planes<'a>(
    bitmap: &Bitmap,
    rows: impl Iterator<Item = &'a [u8]> + Clone,
    palette: &[[u8; 4]],
) -> Result<ImagePlanes> {
    if palette.is_empty() || palette.len() > 256 {
        return Err(Error::UnsupportedImage("palette needs 1 to 256 entries"));
    }

    let mut color = Vec::with_capacity(bitmap.pixel_count());
    for row in rows.clone() {
        if row.iter().any(|&i| usize::from(i) >= palette.len()) {
            return Err(Error::UnsupportedImage("palette index out of range"));
        }
        color.extend_from_slice(row);
    }

    let mut rgb = Vec::with_capacity(3 * palette.len());
    for &entry in palette {
        unpremul_rgb(entry, &mut rgb);
    }

    let alpha = |index: u8| palette[usize::from(index)][3];
    let used_alpha = || color.iter().map(|&i| alpha(i));
    let mask = if used_alpha().all(|a| a == u8::MAX) {
        None
    } else if used_alpha().all(|a| a == 0 || a == u8::MAX) {
        Some(Mask::Stencil(stencil(bitmap, rows, alpha)))
    } else {
        Some(Mask::Alpha(used_alpha().collect()))
    };

    Ok(ImagePlanes {
        color,
        mask,
        palette: Some(rgb),
    })
}

/// Pack binary alpha into rows of bits, most significant bit first.
fn stencil<'a>(bitmap: &Bitmap, rows: impl Iterator<Item = &'a [u8]>, alpha: impl Fn(u8) -> u8) -> Vec<u8> {
    let row_len = (bitmap.width as usize + 7) / 8;
    let mut out = Vec::with_capacity(row_len * bitmap.height as usize);
    for row in rows {
        for pixels in row.chunks(8) {
            let byte = pixels
                .iter()
                .enumerate()
                .filter(|&(_, &index)| alpha(index) == 0)
                .fold(0u8, |acc, (bit, _)| acc | (0x80 >> bit));
            out.push(byte);
        }
    }
    out
}
