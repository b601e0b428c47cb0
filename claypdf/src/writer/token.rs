use std::io;

use crate::{
    config::{Config, ScalarRange},
    pdf::ResourceName,
    writer::{name, number, string, Writer},
};

/// Columns a tab counts for when continuation lines are indented.
const INDENT_WIDTH: usize = 8;

fn is_self_delimiting(chr: u8) -> bool {
    name::is_delimiter(chr) || name::is_whitespace(chr)
}

/// Writes one token at a time and inserts a space between two tokens only if
/// they would otherwise merge into one.
///
/// If `max_columns` is non-zero, lines are wrapped before a token that would
/// exceed it. Lines that are not part of stream data must not exceed 255
/// bytes, shorter lines make the output easier to read.
#[derive(Debug)]
pub struct TokenWriter<W> {
    out: W,
    column: usize,
    last: Option<u8>,
    max_columns: usize,
    indent: bool,
    comments: bool,
    scalar_range: ScalarRange,
}

impl<W: Writer> TokenWriter<W> {
    pub fn new(out: W, config: &Config) -> Self {
        Self {
            out,
            column: 0,
            last: None,
            max_columns: config.max_columns,
            indent: config.indent,
            comments: config.comments,
            scalar_range: config.scalar_range,
        }
    }

    /// Write a single token, preceded by a separator or line break if needed.
    pub fn write(&mut self, token: &[u8]) -> io::Result<()> {
        let (first, last) = match (token.first(), token.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Ok(()),
        };

        let mut space_needed = match self.last {
            Some(prev) => !is_self_delimiting(prev) && !is_self_delimiting(first),
            None => false,
        };

        let pending = token.len() + usize::from(space_needed);
        let wrap = self.max_columns > 0
            && first != b'\n'
            && self.column > self.line_start()
            && self.column + pending > self.max_columns;
        if wrap {
            if self.indent {
                self.out.write(b"\n\t")?;
                self.column = INDENT_WIDTH;
            } else {
                self.out.write(b"\n")?;
                self.column = 0;
            }
            // the line break separates the tokens
            space_needed = false;
        }

        if space_needed {
            self.out.write(b" ")?;
            self.column += 1;
        }

        self.out.write(token)?;
        self.advance(token);
        self.last = Some(last);
        Ok(())
    }

    pub fn write_str(&mut self, token: &str) -> io::Result<()> {
        self.write(token.as_bytes())
    }

    /// Write bytes as they are, without separators or line wrapping. Used for
    /// stream data.
    pub fn raw(&mut self, data: &[u8]) -> io::Result<()> {
        if let Some(&last) = data.last() {
            self.out.write(data)?;
            self.advance(data);
            self.last = Some(last);
        }
        Ok(())
    }

    fn line_start(&self) -> usize {
        if self.indent {
            INDENT_WIDTH
        } else {
            0
        }
    }

    fn advance(&mut self, written: &[u8]) {
        match written.iter().rposition(|&c| c == b'\n') {
            Some(newline) => self.column = written.len() - newline - 1,
            None => self.column += written.len(),
        }
    }

    /// Start a new line unless the output already is at the start of one.
    pub fn ensure_line_start(&mut self) -> io::Result<()> {
        match self.last {
            None | Some(b'\n') => Ok(()),
            Some(_) => self.raw(b"\n"),
        }
    }

    pub fn write_int(&mut self, value: i64) -> io::Result<()> {
        self.write(value.to_string().as_bytes())
    }

    pub fn write_size(&mut self, value: usize, min_digits: usize) -> io::Result<()> {
        self.write(number::format_size(value, min_digits).as_bytes())
    }

    pub fn write_scalar(&mut self, value: f32) -> io::Result<()> {
        self.write(number::format_scalar(value, self.scalar_range).as_bytes())
    }

    pub fn write_name(&mut self, name: ResourceName) -> io::Result<()> {
        self.write(name.to_string().as_bytes())
    }

    /// Prepend `/` to `identifier` to make a name token.
    pub fn write_as_name(&mut self, identifier: &str) -> io::Result<()> {
        self.write(&name::encode(identifier.as_bytes()))
    }

    /// Write `s` as a literal or hex string, whichever is shorter.
    pub fn write_string(&mut self, s: &[u8]) -> io::Result<()> {
        self.write(&string::encode(s))
    }

    /// `n 0 R` as a single token, a line break never splits it.
    pub fn write_indirect_reference(&mut self, number: u32) -> io::Result<()> {
        self.write(format!("{} 0 R", number).as_bytes())
    }

    /// Start `n 0 obj` at the beginning of a line. The header is one token
    /// so the object's offset always points at `n 0 obj`.
    pub fn begin_indirect_object(&mut self, number: u32) -> io::Result<()> {
        self.ensure_line_start()?;
        self.write(format!("{} 0 obj", number).as_bytes())
    }

    /// Open a dictionary, optionally with a `/Type` entry. `ty` is the type
    /// name without the leading `/`.
    pub fn begin_dict(&mut self, ty: Option<&str>) -> io::Result<()> {
        self.write(b"<<")?;
        if let Some(ty) = ty {
            self.write(b"/Type")?;
            self.write_as_name(ty)?;
        }
        Ok(())
    }

    pub fn end_dict(&mut self) -> io::Result<()> {
        self.write(b">>")
    }

    /// Write `% text` on its own line if comments are enabled.
    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        if !self.comments {
            return Ok(());
        }
        self.ensure_line_start()?;
        let line: String = format!("% {}\n", text)
            .chars()
            .map(|c| if c == '\r' { ' ' } else { c })
            .collect();
        self.raw(line.as_bytes())
    }

    pub fn comments_enabled(&self) -> bool {
        self.comments
    }

    /// Bytes written to the underlying sink.
    pub fn position(&self) -> usize {
        self.out.position()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Lets whole sections, like the cross-reference table, be written as raw
/// bytes while keeping track of the line state.
impl<W: Writer> Writer for TokenWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.raw(buf)
    }

    fn position(&self) -> usize {
        self.out.position()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
