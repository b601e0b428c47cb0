use claypdf::{
    Bitmap, Config, Document, DocumentInfo, DrawCommand, IoWriter, Matrix, Paint, Path, Pixels, Point, Rect,
    ScalarRange, StandardFont, Writer,
};
use std::{fs::File, io::BufWriter, path::PathBuf};
use structopt::StructOpt;

/// Write a PDF with a few pages of shapes, text and images.
#[derive(StructOpt, Debug)]
#[structopt(name = "claypdf-write-pages")]
struct Opt {
    /// Output file
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Number of pages
    #[structopt(short, long, default_value = "3")]
    pages: u32,

    /// Commented, uncompressed, 7-bit clean output
    #[structopt(long)]
    readable: bool,

    /// Allow reals beyond the 16.16 fixed point range
    #[structopt(long)]
    wide: bool,
}

fn checkerboard(size: u32) -> Bitmap {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let on = (x / 4 + y / 4) % 2 == 0;
            data.extend_from_slice(if on { &[40, 40, 160, 255] } else { &[0, 0, 0, 0] });
        }
    }
    Bitmap::new(
        1,
        size,
        size,
        Pixels::Premultiplied32 {
            data,
            row_bytes: size as usize * 4,
        },
    )
}

fn write(opt: &Opt) -> claypdf::Result<()> {
    let mut config = if opt.readable {
        Config::human_readable()
    } else {
        Config::compact()
    };
    if opt.wide {
        config = config.with_scalar_range(ScalarRange::Wide);
    }

    let file = File::create(&opt.output)?;
    let mut doc = Document::new(IoWriter::new(BufWriter::new(file)), config)?;
    doc.set_info(DocumentInfo {
        title: Some("claypdf sample".to_string()),
        creator: Some("write_pages".to_string()),
        ..Default::default()
    })?;

    let image = checkerboard(32);
    for page in 0..opt.pages {
        doc.begin_page(612.0, 792.0, Some(Rect::new(36.0, 36.0, 540.0, 720.0)))?;
        doc.draw(&DrawCommand::Text {
            text: format!("Page {}", page + 1),
            origin: Point::new(0.0, 24.0),
            font: StandardFont::HelveticaBold,
            size: 18.0,
            paint: Paint::fill([0, 0, 0, 255]),
        })?;
        doc.draw(&DrawCommand::Rect {
            rect: Rect::new(0.0, 40.0, 200.0, 100.0),
            paint: Paint::fill([220, 60, 40, 160]),
        })?;
        doc.draw(&DrawCommand::Path {
            path: Path::new()
                .move_to(0.0, 200.0)
                .cubic_to(100.0, 150.0, 200.0, 250.0, 300.0, 200.0)
                .line_to(300.0, 300.0)
                .close(),
            paint: Paint::stroke([20, 120, 20, 255], 3.0),
        })?;
        doc.draw(&DrawCommand::Image {
            bitmap: image.clone(),
            matrix: Matrix::translate(320.0, 40.0).pre_scale(4.0, 4.0),
        })?;
        doc.end_page()?;
    }

    let sink = doc.finish()?;
    log::info!("wrote {} bytes to {:?}", sink.position(), opt.output);
    Ok(())
}

pub fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    if let Err(e) = write(&opt) {
        log::error!("Error while writing: {:?}", e);
    }
}
