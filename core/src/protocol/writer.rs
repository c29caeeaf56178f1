use std::io::{self, BufWriter, Write};

use super::ERROR_TAG;

const CRLF: &[u8] = b"\r\n";

/// Buffered reply encoder owned by one connection.
///
/// Nothing reaches the transport until [`RespWriter::flush`], so several
/// pipelined replies can share one write.
#[derive(Debug)]
pub struct RespWriter<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> RespWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
        }
    }

    /// Writes `+<text>\r\n`.
    pub fn write_simple_string(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(b"+")?;
        self.write_line_text(text)?;
        self.inner.write_all(CRLF)
    }

    /// Writes `-ERR <message>\r\n`.
    pub fn write_error(&mut self, message: &str) -> io::Result<()> {
        self.inner.write_all(b"-")?;
        self.inner.write_all(ERROR_TAG.as_bytes())?;
        self.inner.write_all(b" ")?;
        self.write_line_text(message)?;
        self.inner.write_all(CRLF)
    }

    /// Writes `:<value>\r\n`.
    pub fn write_integer(&mut self, value: i64) -> io::Result<()> {
        write!(self.inner, ":{value}\r\n")
    }

    /// Writes `$<len>\r\n<bytes>\r\n`.
    pub fn write_bulk_string(&mut self, value: &str) -> io::Result<()> {
        write!(self.inner, "${}\r\n", value.len())?;
        self.inner.write_all(value.as_bytes())?;
        self.inner.write_all(CRLF)
    }

    /// Writes `$-1\r\n`.
    pub fn write_null_bulk_string(&mut self) -> io::Result<()> {
        self.inner.write_all(b"$-1\r\n")
    }

    /// Writes an array of bulk strings; this is also the request encoding.
    pub fn write_array<S: AsRef<str>>(&mut self, elements: &[S]) -> io::Result<()> {
        write!(self.inner, "*{}\r\n", elements.len())?;
        for element in elements {
            self.write_bulk_string(element.as_ref())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    // Line frames cannot carry CR or LF.
    fn write_line_text(&mut self, text: &str) -> io::Result<()> {
        if text.contains(['\r', '\n']) {
            self.inner
                .write_all(text.replace(['\r', '\n'], " ").as_bytes())
        } else {
            self.inner.write_all(text.as_bytes())
        }
    }
}
