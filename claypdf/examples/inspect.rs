use std::path::PathBuf;
use structopt::StructOpt;

/// Print the cross-reference table and trailer of a PDF file.
#[derive(StructOpt, Debug)]
#[structopt(name = "claypdf-inspect")]
struct Opt {
    /// Input file
    #[structopt(short, long, parse(from_os_str))]
    input: PathBuf,
}

pub fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    let (buf, structure) = match claypdf::read_file(opt.input.as_path()) {
        Ok(read) => read,
        Err(e) => {
            log::error!("Error while parsing: {:?}", e);
            return;
        }
    };

    println!("PDF {}.{}", structure.version.0, structure.version.1);
    println!("Trailer: {:#?}", structure.trailer);
    for entry in structure.used_objects() {
        let expected = format!("{} 0 obj", entry.object);
        let found = buf
            .get(entry.byte_offset..)
            .map_or(false, |rest| rest.starts_with(expected.as_bytes()));
        println!(
            "{:>6} at {:>10} {}",
            entry.object,
            entry.byte_offset,
            if found { "ok" } else { "MISMATCH" }
        );
    }
}
