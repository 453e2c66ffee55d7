/*! Wire Protocol.

All messages are sequences of 32-bit big-endian words; there is no
textual framing and no magic prefix — message length is implied by the
message id and any header fields already read. See spec §4.3.

Word-level (de)serialization is hand-rolled over `u32::from_be_bytes` /
`to_be_bytes`, the same manual-byte-parsing style the teacher crate uses
in `tcp_source.rs`, rather than pulling in an external framing crate.
*/

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::words_for;
use crate::{Error, ProtocolError};

async fn try_read_word<R: AsyncRead + Unpin>(r: &mut R) -> Result<Option<u32>, Error> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::Truncated {
                context: "message id",
            }
            .into());
        }
        filled += n;
    }
    Ok(Some(u32::from_be_bytes(buf)))
}

async fn read_word<R: AsyncRead + Unpin>(r: &mut R, context: &'static str) -> Result<u32, Error> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::from(ProtocolError::Truncated { context })
        } else {
            Error::from(e)
        }
    })?;
    Ok(u32::from_be_bytes(buf))
}

async fn read_words<R: AsyncRead + Unpin>(
    r: &mut R,
    n: usize,
    context: &'static str,
) -> Result<Vec<u32>, Error> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(read_word(r, context).await?);
    }
    Ok(out)
}

async fn write_word<W: AsyncWrite + Unpin>(w: &mut W, word: u32) -> Result<(), Error> {
    w.write_all(&word.to_be_bytes()).await?;
    Ok(())
}

async fn write_words<W: AsyncWrite + Unpin>(w: &mut W, words: &[u32]) -> Result<(), Error> {
    for &word in words {
        write_word(w, word).await?;
    }
    Ok(())
}

/// Client -> Server messages.
pub mod client {
    use super::*;

    /// `R_INIT`: initialize the simulation (width, height, sampling, first frame).
    pub const R_INIT: u32 = 0;
    /// `R_FRAME`: request the next frame (spends one flow-control credit).
    pub const R_FRAME: u32 = 1;
    /// `R_STOP`: end the simulation (optional; TCP close also terminates).
    pub const R_STOP: u32 = 2;

    /// A message sent from client to server.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Message {
        /// Initialize the session with a map size, sub-sampling factor, and
        /// the first frame's packed cells.
        Init {
            /// Map width in cells.
            width: u32,
            /// Map height in cells.
            height: u32,
            /// Generations to compute per emitted frame.
            sampling: u32,
            /// Packed initial frame, `words_for(width, height)` words.
            frame: Vec<u32>,
        },
        /// Request the next frame.
        Frame,
        /// End the session.
        Stop,
    }

    impl Message {
        /// Read one message, or `Ok(None)` on a clean EOF before any bytes
        /// of a new message arrived.
        ///
        /// # Errors
        ///
        /// Returns a [`ProtocolError`] on an unknown message id or a short
        /// read partway through a message.
        pub async fn read<R: AsyncRead + Unpin>(r: &mut R) -> Result<Option<Message>, Error> {
            let Some(id) = try_read_word(r).await? else {
                return Ok(None);
            };
            match id {
                R_INIT => {
                    let header = read_words(r, 3, "R_INIT header").await?;
                    let (width, height, sampling) = (header[0], header[1], header[2]);
                    let n = words_for(width, height);
                    let frame = read_words(r, n, "R_INIT frame").await?;
                    Ok(Some(Message::Init {
                        width,
                        height,
                        sampling,
                        frame,
                    }))
                }
                R_FRAME => Ok(Some(Message::Frame)),
                R_STOP => Ok(Some(Message::Stop)),
                other => Err(ProtocolError::UnknownMessageId(other).into()),
            }
        }

        /// Serialize and write this message.
        pub async fn write<W: AsyncWrite + Unpin>(&self, w: &mut W) -> Result<(), Error> {
            match self {
                Message::Init {
                    width,
                    height,
                    sampling,
                    frame,
                } => {
                    write_word(w, R_INIT).await?;
                    write_word(w, *width).await?;
                    write_word(w, *height).await?;
                    write_word(w, *sampling).await?;
                    write_words(w, frame).await
                }
                Message::Frame => write_word(w, R_FRAME).await,
                Message::Stop => write_word(w, R_STOP).await,
            }
        }
    }
}

/// Server -> Client messages.
pub mod server {
    use super::*;

    /// `A_RECT_UPDATE`: a rectangular slice of the frame.
    pub const A_RECT_UPDATE: u32 = 0;
    /// `A_FRAME_END`: marks the end of a logical frame.
    pub const A_FRAME_END: u32 = 1;

    /// A message sent from server to client.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Message {
        /// A rectangular slice of packed cells, `(x1,y1)..(x2,y2)` in
        /// target-map coordinates.
        RectUpdate {
            /// Left edge, inclusive.
            x1: u32,
            /// Top edge, inclusive.
            y1: u32,
            /// Right edge, exclusive.
            x2: u32,
            /// Bottom edge, exclusive.
            y2: u32,
            /// Packed cells for the rectangle, row-major.
            frame: Vec<u32>,
        },
        /// Marks the end of a logical frame (one or more rect updates).
        FrameEnd,
    }

    impl Message {
        /// Read one message, validating any rectangle against the known
        /// map size. `Ok(None)` on a clean EOF before any bytes of a new
        /// message arrived.
        ///
        /// # Errors
        ///
        /// Returns a [`ProtocolError`] on an unknown message id, a short
        /// read, or an out-of-bounds rectangle.
        pub async fn read<R: AsyncRead + Unpin>(
            r: &mut R,
            map_width: u32,
            map_height: u32,
        ) -> Result<Option<Message>, Error> {
            let Some(id) = try_read_word(r).await? else {
                return Ok(None);
            };
            match id {
                A_RECT_UPDATE => {
                    let header = read_words(r, 4, "A_RECT_UPDATE header").await?;
                    let (x1, y1, x2, y2) = (header[0], header[1], header[2], header[3]);
                    if !(x1 < x2 && y1 < y2 && x2 <= map_width && y2 <= map_height) {
                        return Err(ProtocolError::BadRectangle {
                            rect: (x1, y1, x2, y2),
                            map: (map_width, map_height),
                        }
                        .into());
                    }
                    let n = words_for(x2 - x1, y2 - y1);
                    let frame = read_words(r, n, "A_RECT_UPDATE frame").await?;
                    Ok(Some(Message::RectUpdate {
                        x1,
                        y1,
                        x2,
                        y2,
                        frame,
                    }))
                }
                A_FRAME_END => Ok(Some(Message::FrameEnd)),
                other => Err(ProtocolError::UnknownMessageId(other).into()),
            }
        }

        /// Serialize and write this message.
        pub async fn write<W: AsyncWrite + Unpin>(&self, w: &mut W) -> Result<(), Error> {
            match self {
                Message::RectUpdate {
                    x1,
                    y1,
                    x2,
                    y2,
                    frame,
                } => {
                    write_word(w, A_RECT_UPDATE).await?;
                    write_word(w, *x1).await?;
                    write_word(w, *y1).await?;
                    write_word(w, *x2).await?;
                    write_word(w, *y2).await?;
                    write_words(w, frame).await
                }
                Message::FrameEnd => write_word(w, A_FRAME_END).await,
            }
        }
    }
}
