/*! Simulator server: accepts client connections, runs the
`R_INIT`/`R_FRAME`/`R_STOP` session state machine on its own task per
connection, and computes generations with [`crate::grid`].
*/

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;

use crate::cell::Cell;
use crate::codec;
use crate::grid::{DoubleBuffer, Grid};
use crate::proto::{client, server};
use crate::{Error, ProtocolError};

/// Bind a listener on `port`, preferring the dual-stack `[::]:port` and
/// falling back to `0.0.0.0:port` if the host has no IPv6 stack.
///
/// # Errors
///
/// Returns the IPv4 bind error if both attempts fail.
pub async fn bind(port: u16) -> Result<TcpListener, Error> {
    match TcpListener::bind(("::", port)).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            warn!("IPv6 bind failed ({e}), falling back to 0.0.0.0:{port}");
            Ok(TcpListener::bind(("0.0.0.0", port)).await?)
        }
    }
}

/// Accept and serve connections until `shutdown` fires. Each connection
/// is driven to completion on its own task, so a panic or protocol
/// error in one session can't take down the accept loop or any other
/// session — only that session's task ends, and its outcome is logged.
pub async fn serve(listener: TcpListener, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("shutdown requested, no longer accepting connections");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        info!("accepted connection from {addr}");
                        tokio::spawn(async move {
                            match run_session(stream).await {
                                Ok(()) => info!("session with {addr} closed cleanly"),
                                Err(e) => warn!("session with {addr} ended: {e}"),
                            }
                        });
                    }
                    Err(e) => warn!("accept failed: {e}"),
                }
            }
        }
    }
}

/// Run one client session to completion over an already-accepted
/// stream. Exposed separately from [`serve`] so it can be driven over a
/// plain duplex stream in tests.
pub async fn run_session<S>(mut stream: S) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(msg) = client::Message::read(&mut stream).await? else {
        debug!("client disconnected before sending R_INIT");
        return Ok(());
    };
    let (width, height, sampling, frame_words) = match msg {
        client::Message::Init {
            width,
            height,
            sampling,
            frame,
        } => (width, height, sampling, frame),
        _ => {
            return Err(ProtocolError::UnexpectedMessage {
                context: "awaiting R_INIT",
            }
            .into());
        }
    };

    if width == 0 || height == 0 || sampling == 0 {
        return Err(ProtocolError::InvalidInit {
            map: (width, height),
            sampling,
        }
        .into());
    }

    let cells = codec::unpack(&frame_words, (width as usize) * (height as usize))?;
    let grid = Grid::from_row_major(width, height, &cells);
    let mut dbuf = DoubleBuffer::from_initial(grid);
    debug!("session initialized: {width}x{height}, sampling={sampling}");

    loop {
        match client::Message::read(&mut stream).await? {
            None => {
                debug!("client closed connection");
                return Ok(());
            }
            Some(client::Message::Stop) => {
                debug!("client sent R_STOP");
                return Ok(());
            }
            Some(client::Message::Frame) => {
                dbuf.advance(sampling);
                send_full_frame(&mut stream, dbuf.current()).await?;
            }
            Some(client::Message::Init { .. }) => {
                return Err(ProtocolError::UnexpectedMessage {
                    context: "mid-session, already initialized",
                }
                .into());
            }
        }
    }
}

async fn send_full_frame<S: AsyncWrite + Unpin>(stream: &mut S, grid: &Grid) -> Result<(), Error> {
    let cells: Vec<Cell> = grid.iter_row_major().collect();
    let words = codec::pack(&cells);
    server::Message::RectUpdate {
        x1: 0,
        y1: 0,
        x2: grid.width(),
        y2: grid.height(),
        frame: words,
    }
    .write(stream)
    .await?;
    server::Message::FrameEnd.write(stream).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[tokio::test]
    async fn serves_one_frame_then_honors_stop() {
        let (mut client_side, server_side) = tokio::io::duplex(8192);
        let session = tokio::spawn(run_session(server_side));

        let frame = codec::pack(&[Cell::Wire, Cell::Head, Cell::Wire]);
        client::Message::Init {
            width: 3,
            height: 1,
            sampling: 1,
            frame,
        }
        .write(&mut client_side)
        .await
        .unwrap();

        client::Message::Frame.write(&mut client_side).await.unwrap();

        let rect = server::Message::read(&mut client_side, 3, 1)
            .await
            .unwrap()
            .unwrap();
        let server::Message::RectUpdate {
            x1,
            y1,
            x2,
            y2,
            frame,
        } = rect
        else {
            panic!("expected RectUpdate");
        };
        assert_eq!((x1, y1, x2, y2), (0, 0, 3, 1));
        let cells = codec::unpack(&frame, 3).unwrap();
        assert_eq!(cells, vec![Cell::Head, Cell::Tail, Cell::Head]);

        let end = server::Message::read(&mut client_side, 3, 1).await.unwrap();
        assert_eq!(end, Some(server::Message::FrameEnd));

        client::Message::Stop.write(&mut client_side).await.unwrap();
        session.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn a_second_init_mid_session_is_a_protocol_error() {
        let (mut client_side, server_side) = tokio::io::duplex(8192);
        let session = tokio::spawn(run_session(server_side));

        let frame = codec::pack(&[Cell::Wire]);
        client::Message::Init {
            width: 1,
            height: 1,
            sampling: 1,
            frame,
        }
        .write(&mut client_side)
        .await
        .unwrap();

        client::Message::Init {
            width: 1,
            height: 1,
            sampling: 1,
            frame: codec::pack(&[Cell::Wire]),
        }
        .write(&mut client_side)
        .await
        .unwrap();

        drop(client_side);
        let result = session.await.unwrap();
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::UnexpectedMessage { .. }))
        ));
    }

    #[tokio::test]
    async fn clean_disconnect_before_init_is_not_an_error() {
        let (client_side, server_side) = tokio::io::duplex(64);
        drop(client_side);
        run_session(server_side).await.unwrap();
    }

    #[tokio::test]
    async fn zero_width_init_is_rejected_without_panicking() {
        let (mut client_side, server_side) = tokio::io::duplex(8192);
        let session = tokio::spawn(run_session(server_side));

        client::Message::Init {
            width: 0,
            height: 4,
            sampling: 1,
            frame: Vec::new(),
        }
        .write(&mut client_side)
        .await
        .unwrap();
        drop(client_side);

        let result = session.await.unwrap();
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::InvalidInit { .. }))
        ));
    }

    #[tokio::test]
    async fn zero_sampling_init_is_rejected_without_panicking() {
        let (mut client_side, server_side) = tokio::io::duplex(8192);
        let session = tokio::spawn(run_session(server_side));

        client::Message::Init {
            width: 2,
            height: 2,
            sampling: 0,
            frame: codec::pack(&[Cell::Wire; 4]),
        }
        .write(&mut client_side)
        .await
        .unwrap();
        drop(client_side);

        let result = session.await.unwrap();
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::InvalidInit { .. }))
        ));
    }
}
