use std::{fs::File, io::Read};

pub use config::{Config, ScalarRange, MAX_LINE_LENGTH};
pub use error::{Error, Result};
pub use parse::{read_structure, FileStructure};
pub use pdf::{
    BlendMode, Bitmap, Document, DocumentInfo, DrawCommand, GraphicState, LineCap, LineJoin, Matrix, Paint,
    PaintStyle, Path, Pixels, Point, Rect, ResourceName, StandardFont, Stroke,
};
pub use writer::{IoWriter, Writer};

mod config;
mod error;
pub mod parse;
pub mod pdf;
pub mod writer;

/// Read a file written by a [`Document`] and return where its objects are.
pub fn read_file(file_path: &std::path::Path) -> Result<(Vec<u8>, FileStructure)> {
    let mut input_file = File::open(file_path)?;
    let mut buf = Vec::new();
    input_file.read_to_end(&mut buf)?;

    let structure = read_structure(&buf)?;
    Ok((buf, structure))
}
