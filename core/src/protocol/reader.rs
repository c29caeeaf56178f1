use std::io::{self, BufRead, BufReader, Read};

use super::{ProtocolError, ERROR_TAG};

/// Largest accepted bulk string payload.
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;
/// Largest accepted number of array elements.
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;
/// Largest accepted line (simple string, error, integer or length header).
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Payload bytes reserved before a bulk string has actually arrived.
const BULK_PREALLOCATION: usize = 64 * 1024;

/// Buffered request decoder owned by one connection.
#[derive(Debug)]
pub struct RespReader<R> {
    inner: BufReader<R>,
    line: Vec<u8>,
}

impl<R: Read> RespReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            line: Vec::with_capacity(64),
        }
    }

    /// True when bytes of a further request are already buffered, so the
    /// caller can keep answering pipelined requests before flushing.
    pub fn has_buffered_data(&self) -> bool {
        !self.inner.buffer().is_empty()
    }

    /// Reads one request as an ordered list of strings.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before a new frame
    /// starts. After an error the stream position is undefined.
    pub fn read_command(&mut self) -> Result<Option<Vec<String>>, ProtocolError> {
        let Some(kind) = self.read_type_byte()? else {
            return Ok(None);
        };

        match kind {
            b'*' => self.read_array().map(Some),
            b'$' | b'+' | b'-' | b':' => self.read_value(kind).map(|value| Some(vec![value])),
            other => Err(ProtocolError::UnexpectedType(other)),
        }
    }

    fn read_array(&mut self) -> Result<Vec<String>, ProtocolError> {
        let count = match self.read_length()? {
            Some(count) if count <= MAX_ARRAY_LEN => count,
            _ => return Err(self.invalid_length()),
        };

        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let kind = self
                .read_type_byte()?
                .ok_or(ProtocolError::UnexpectedEof)?;
            if kind == b'*' {
                return Err(ProtocolError::NestedArray);
            }
            items.push(self.read_value(kind)?);
        }
        Ok(items)
    }

    fn read_value(&mut self, kind: u8) -> Result<String, ProtocolError> {
        match kind {
            b'$' => self.read_bulk_string(),
            b'+' => self.read_text_line(),
            b':' => {
                let line = self.read_text_line()?;
                if line.parse::<i64>().is_err() {
                    return Err(ProtocolError::InvalidInteger(line));
                }
                Ok(line)
            }
            b'-' => {
                let line = self.read_text_line()?;
                let message = line
                    .strip_prefix(ERROR_TAG)
                    .map(str::trim_start)
                    .unwrap_or(&line);
                Err(ProtocolError::ErrorReply(message.to_string()))
            }
            other => Err(ProtocolError::UnexpectedType(other)),
        }
    }

    fn read_bulk_string(&mut self) -> Result<String, ProtocolError> {
        let len = match self.read_length()? {
            // `$-1` is the null bulk string.
            None => return Ok(String::new()),
            Some(len) if len <= MAX_BULK_LEN => len,
            Some(_) => return Err(self.invalid_length()),
        };

        let framed_len = len + 2;
        let mut payload = Vec::with_capacity(framed_len.min(BULK_PREALLOCATION));
        (&mut self.inner)
            .take(framed_len as u64)
            .read_to_end(&mut payload)?;
        if payload.len() < framed_len {
            return Err(ProtocolError::UnexpectedEof);
        }
        if !payload.ends_with(b"\r\n") {
            return Err(ProtocolError::MissingCrlf);
        }

        payload.truncate(len);
        String::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Parses a length header. `-1` maps to `None`; other negatives fail.
    fn read_length(&mut self) -> Result<Option<usize>, ProtocolError> {
        let line = self.read_line()?;
        let parsed = std::str::from_utf8(line)
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok());
        match parsed {
            Some(-1) => Ok(None),
            Some(value) if value >= 0 => {
                usize::try_from(value).map(Some).map_err(|_| self.invalid_length())
            }
            _ => Err(self.invalid_length()),
        }
    }

    fn invalid_length(&self) -> ProtocolError {
        ProtocolError::InvalidLength(String::from_utf8_lossy(self.current_line()).into_owned())
    }

    fn read_text_line(&mut self) -> Result<String, ProtocolError> {
        let line = self.read_line()?;
        std::str::from_utf8(line)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Reads one CRLF-terminated line and returns it without the terminator.
    fn read_line(&mut self) -> Result<&[u8], ProtocolError> {
        self.line.clear();
        let limit = (MAX_LINE_LEN + 2) as u64;
        let read = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.line)?;

        if !self.line.ends_with(b"\n") {
            if read as u64 >= limit {
                return Err(ProtocolError::LineTooLong);
            }
            return Err(ProtocolError::UnexpectedEof);
        }
        if !self.line.ends_with(b"\r\n") {
            return Err(ProtocolError::MissingCrlf);
        }
        Ok(self.current_line())
    }

    fn current_line(&self) -> &[u8] {
        let end = if self.line.ends_with(b"\r\n") {
            self.line.len() - 2
        } else {
            self.line.len()
        };
        &self.line[..end]
    }

    fn read_type_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        loop {
            match self.inner.fill_buf() {
                Ok([]) => return Ok(None),
                Ok(buffer) => {
                    let byte = buffer[0];
                    self.inner.consume(1);
                    return Ok(Some(byte));
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error.into()),
            }
        }
    }
}
