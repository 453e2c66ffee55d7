//! End-to-end session tests over a real loopback TCP socket.

use wireworld::cell::Cell;
use wireworld::codec;
use wireworld::frame_buffer::{FrameBuffer, Mode};
use wireworld::proto::{client, server};

async fn spawn_server() -> (tokio::task::JoinHandle<()>, std::net::SocketAddr) {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ = wireworld::server::run_session(stream).await;
    });
    (handle, addr)
}

#[tokio::test]
async fn handshake_and_one_frame_over_a_real_socket() {
    let (server_task, addr) = spawn_server().await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let frame = codec::pack(&[Cell::Wire, Cell::Head, Cell::Wire]);
    client::Message::Init {
        width: 3,
        height: 1,
        sampling: 1,
        frame,
    }
    .write(&mut stream)
    .await
    .unwrap();

    client::Message::Frame.write(&mut stream).await.unwrap();

    let rect = server::Message::read(&mut stream, 3, 1)
        .await
        .unwrap()
        .unwrap();
    let server::Message::RectUpdate { frame, .. } = rect else {
        panic!("expected a rect update");
    };
    let cells = codec::unpack(&frame, 3).unwrap();
    assert_eq!(cells, vec![Cell::Head, Cell::Tail, Cell::Head]);

    let end = server::Message::read(&mut stream, 3, 1).await.unwrap();
    assert_eq!(end, Some(server::Message::FrameEnd));

    client::Message::Stop.write(&mut stream).await.unwrap();
    server_task.await.unwrap();
}

#[tokio::test]
async fn multiple_frame_requests_each_advance_one_sampling_period() {
    let (server_task, addr) = spawn_server().await;
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();

    let frame = codec::pack(&[Cell::Wire, Cell::Head, Cell::Wire]);
    client::Message::Init {
        width: 3,
        height: 1,
        sampling: 1,
        frame,
    }
    .write(&mut stream)
    .await
    .unwrap();

    let mut generations = Vec::new();
    for _ in 0..3 {
        client::Message::Frame.write(&mut stream).await.unwrap();
        let rect = server::Message::read(&mut stream, 3, 1)
            .await
            .unwrap()
            .unwrap();
        let server::Message::RectUpdate { frame, .. } = rect else {
            panic!("expected a rect update");
        };
        generations.push(codec::unpack(&frame, 3).unwrap());
        let end = server::Message::read(&mut stream, 3, 1).await.unwrap();
        assert_eq!(end, Some(server::Message::FrameEnd));
    }

    assert_eq!(generations[0], vec![Cell::Head, Cell::Tail, Cell::Head]);
    assert_eq!(generations[1], vec![Cell::Tail, Cell::Wire, Cell::Tail]);
    assert_eq!(generations[2], vec![Cell::Wire, Cell::Head, Cell::Wire]);

    client::Message::Stop.write(&mut stream).await.unwrap();
    server_task.await.unwrap();
}

/// Scenario 5 from the spec: with `maxCredit=2`, a producer completing a
/// third frame without an intervening `R_FRAME` credit is a protocol
/// violation and the client-side buffer refuses the enqueue.
#[test]
fn credit_cap_triggers_abort_on_the_third_uncredited_frame() {
    use wireworld::grid::Grid;

    let mut buf = FrameBuffer::new(Mode::Paced, 2);
    assert!(buf.spend_credit());
    assert!(buf.spend_credit());
    assert!(!buf.spend_credit());

    buf.enqueue(Grid::new(1, 1)).unwrap();
    buf.enqueue(Grid::new(1, 1)).unwrap();
    let err = buf.enqueue(Grid::new(1, 1)).unwrap_err();
    assert!(matches!(
        err,
        wireworld::Error::Protocol(wireworld::ProtocolError::CreditOverflow)
    ));
}
