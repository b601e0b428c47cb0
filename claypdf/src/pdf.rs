pub use self::{
    content::{
        BlendMode, DrawCommand, GraphicState, LineCap, LineJoin, Matrix, Paint, PaintStyle, Path, PathVerb, Point,
        Rect, StandardFont, Stroke,
    },
    document::{Document, DocumentInfo},
    image::{decompose, extract_jpeg, Bitmap, DecomposedImage, ImagePlanes, Mask, Pixels},
    resource::{ImageKey, ResourceKind, ResourceMap, ResourceName},
    stream::{Filters, Stream},
    xref::{CrossReferenceTable, UsedObject, MAX_OBJECT_NUMBER},
};

mod content;
mod document;
mod image;
mod resource;
mod stream;
mod xref;
