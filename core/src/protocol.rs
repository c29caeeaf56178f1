//! RESP-style wire codec.
//!
//! Requests are arrays of bulk strings (`*2\r\n$4\r\nVGET\r\n$4\r\nvec1\r\n`);
//! bare scalar frames are accepted as single-element requests. Replies use the
//! same framing. A framing error means the byte position of the next frame is
//! unknown, so callers close the connection instead of resynchronizing.

use std::error::Error;
use std::fmt;
use std::io;

mod literal;
mod reader;
mod writer;

pub use literal::{format_vector, parse_vector, VectorLiteralError};
pub use reader::{RespReader, MAX_ARRAY_LEN, MAX_BULK_LEN, MAX_LINE_LEN};
pub use writer::RespWriter;

/// Prefix written in front of every error reply.
pub const ERROR_TAG: &str = "ERR";

#[derive(Debug)]
pub enum ProtocolError {
    /// The transport failed.
    Io(io::Error),
    /// The stream ended in the middle of a frame.
    UnexpectedEof,
    UnexpectedType(u8),
    InvalidLength(String),
    MissingCrlf,
    LineTooLong,
    InvalidInteger(String),
    NestedArray,
    InvalidUtf8,
    /// The peer sent an error frame; carries its message.
    ErrorReply(String),
}

impl ProtocolError {
    /// True when the transport hit its read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(error)
                if matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "i/o error: {error}"),
            Self::UnexpectedEof => write!(f, "unexpected EOF while reading RESP"),
            Self::UnexpectedType(byte) => write!(
                f,
                "invalid RESP protocol format: unexpected type byte '{}'",
                byte.escape_ascii()
            ),
            Self::InvalidLength(raw) => write!(f, "invalid length in RESP message: '{raw}'"),
            Self::MissingCrlf => {
                write!(f, "invalid RESP protocol format: missing CRLF terminator")
            }
            Self::LineTooLong => write!(f, "invalid RESP protocol format: line too long"),
            Self::InvalidInteger(raw) => {
                write!(f, "invalid RESP protocol format: invalid integer '{raw}'")
            }
            Self::NestedArray => {
                write!(f, "invalid RESP protocol format: nested arrays are not supported")
            }
            Self::InvalidUtf8 => write!(f, "invalid RESP protocol format: payload is not UTF-8"),
            Self::ErrorReply(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ProtocolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof
        } else {
            Self::Io(error)
        }
    }
}
