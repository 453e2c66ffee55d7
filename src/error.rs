/*! Error types for the Wireworld engine, codec, protocol, and frame buffer.

Follows the library's existing style: a small hand-rolled `Error` enum with
manual `Display`/`std::error::Error` impls and `From` conversions, rather
than a derive-macro error crate.
*/

/// Errors raised while decoding the wire protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// An unrecognized message id was read where a message header was
    /// expected.
    UnknownMessageId(u32),

    /// The connection was closed (or returned less data than declared)
    /// partway through a message.
    Truncated {
        /// What we were trying to read when the truncation happened.
        context: &'static str,
    },

    /// A`A_RECT_UPDATE`/frame rectangle violated the bounds invariant
    /// `x1 < x2 <= width, y1 < y2 <= height`.
    BadRectangle {
        /// Rectangle as received, `(x1, y1, x2, y2)`.
        rect: (u32, u32, u32, u32),
        /// Declared map size, `(width, height)`.
        map: (u32, u32),
    },

    /// The server emitted `A_FRAME_END` without the client having issued a
    /// matching `R_FRAME` credit.
    CreditOverflow,

    /// A message was well-formed but illegal in the session's current
    /// state (e.g. a second `R_INIT`, or `R_FRAME` before any `R_INIT`).
    UnexpectedMessage {
        /// What the session was doing when the message arrived.
        context: &'static str,
    },

    /// `R_INIT` declared a width, height, or sampling factor that can't
    /// back a real grid (zero in either dimension, or zero sampling).
    InvalidInit {
        /// Declared map size, `(width, height)`.
        map: (u32, u32),
        /// Declared generations-per-frame sub-sampling factor.
        sampling: u32,
    },
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ProtocolError::UnknownMessageId(id) => write!(f, "unknown message id {id}"),
            ProtocolError::Truncated { context } => {
                write!(f, "truncated message while reading {context}")
            }
            ProtocolError::BadRectangle { rect, map } => write!(
                f,
                "rectangle ({}, {}, {}, {}) out of bounds for map {}x{}",
                rect.0, rect.1, rect.2, rect.3, map.0, map.1
            ),
            ProtocolError::CreditOverflow => {
                write!(f, "server sent a frame without a prior R_FRAME credit")
            }
            ProtocolError::UnexpectedMessage { context } => {
                write!(f, "unexpected message: {context}")
            }
            ProtocolError::InvalidInit { map, sampling } => write!(
                f,
                "invalid R_INIT: map {}x{}, sampling {sampling}",
                map.0, map.1
            ),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Wireworld error.
#[derive(Debug)]
pub enum Error {
    /// Underlying I/O failure (socket, file).
    Io(std::io::Error),

    /// Wire protocol violation.
    Protocol(ProtocolError),

    /// Image loading/quantization failure.
    Image(String),

    /// Bit-packing codec failure (malformed frame dimensions).
    Codec(String),
}

impl Error {
    /// Create a new codec error with a message.
    pub fn codec(msg: impl Into<String>) -> Self {
        Error::Codec(msg.into())
    }

    /// Create a new image-adapter error with a message.
    pub fn image(msg: impl Into<String>) -> Self {
        Error::Image(msg.into())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Protocol(e) => write!(f, "protocol error: {e}"),
            Error::Image(msg) => write!(f, "image error: {msg}"),
            Error::Codec(msg) => write!(f, "codec error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            other => std::io::Error::other(other.to_string()),
        }
    }
}
