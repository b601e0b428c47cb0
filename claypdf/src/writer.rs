use std::io;

pub mod name;
pub mod number;
pub mod string;
pub mod token;

pub use token::TokenWriter;

/// Append-only byte sink that knows how many bytes it received.
pub trait Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Number of bytes written to this sink so far.
    fn position(&self) -> usize;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Writer for Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn position(&self) -> usize {
        self.len()
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write(buf)
    }

    fn position(&self) -> usize {
        (**self).position()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Adapts any [`io::Write`] and counts the bytes passed through.
#[derive(Debug)]
pub struct IoWriter<W> {
    inner: W,
    written: usize,
}

impl<W: io::Write> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Writer for IoWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.written += buf.len();
        Ok(())
    }

    fn position(&self) -> usize {
        self.written
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Full;

    impl io::Write for Full {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_writer_counts_bytes() {
        let mut w = IoWriter::new(Vec::new());
        w.write(b"%PDF-").unwrap();
        w.write(b"1.4\n").unwrap();
        assert_eq!(w.position(), 9);
        assert_eq!(w.into_inner(), b"%PDF-1.4\n".to_vec());
    }

    #[test]
    fn failed_write_is_not_counted() {
        let mut w = IoWriter::new(Full);
        assert!(w.write(b"abc").is_err());
        assert_eq!(w.position(), 0);
    }
}
