//! TCP plumbing. Each accepted socket gets a reader task and a writer task;
//! everything else happens on the connection handler's single task, which
//! hears about sockets only through [`NetEvent`]s.

use std::net::SocketAddr;

use bytes::Bytes;
use mcc_rs_game::SessionId;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};

const READ_BUFFER_SIZE: usize = 4096;

/// Socket activity delivered to the connection handler.
#[derive(Debug)]
pub enum NetEvent {
    Connected {
        id: SessionId,
        addr: SocketAddr,
        /// Encoded packets pushed here are written to the socket in order.
        outbound: mpsc::Sender<Bytes>,
    },
    Data {
        id: SessionId,
        data: Bytes,
    },
    Closed {
        id: SessionId,
    },
}

pub async fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accept connections until shutdown is signalled.
pub async fn accept_loop(
    listener: TcpListener,
    events: mpsc::Sender<NetEvent>,
    send_queue_len: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut next_id: u64 = 1;
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        let id = SessionId(next_id);
                        next_id += 1;
                        debug!(session = %id, %addr, "Accepted connection");
                        if !start_connection(id, stream, addr, &events, send_queue_len).await {
                            break;
                        }
                    }
                    Err(e) => warn!("Accept failed: {e}"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    debug!("Accept loop stopped");
}

/// Announce the socket, then spawn its tasks. Returns false once the
/// handler has gone away.
async fn start_connection(
    id: SessionId,
    stream: TcpStream,
    addr: SocketAddr,
    events: &mpsc::Sender<NetEvent>,
    send_queue_len: usize,
) -> bool {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(session = %id, "set_nodelay failed: {e}");
    }
    let (reader, writer) = stream.into_split();
    let (outbound_tx, outbound_rx) = mpsc::channel(send_queue_len.max(1));

    // Connected must reach the handler before any Data for this id.
    let connected = NetEvent::Connected {
        id,
        addr,
        outbound: outbound_tx,
    };
    if events.send(connected).await.is_err() {
        return false;
    }

    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(write_loop(id, writer, outbound_rx, done_tx));
    tokio::spawn(read_loop(id, reader, events.clone(), done_rx));
    true
}

async fn read_loop(
    id: SessionId,
    mut reader: OwnedReadHalf,
    events: mpsc::Sender<NetEvent>,
    mut writer_done: oneshot::Receiver<()>,
) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        tokio::select! {
            result = reader.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!(session = %id, "Peer closed connection");
                        break;
                    }
                    Ok(n) => {
                        trace!(session = %id, bytes = n, "Received");
                        let data = Bytes::copy_from_slice(&buf[..n]);
                        if events.send(NetEvent::Data { id, data }).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        debug!(session = %id, "Read failed: {e}");
                        break;
                    }
                }
            }
            // Writer finished: the handler dropped the session or the socket broke.
            _ = &mut writer_done => break,
        }
    }
    let _ = events.send(NetEvent::Closed { id }).await;
}

async fn write_loop(
    id: SessionId,
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<Bytes>,
    done: oneshot::Sender<()>,
) {
    while let Some(bytes) = outbound.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            debug!(session = %id, "Write failed: {e}");
            break;
        }
    }
    let _ = writer.shutdown().await;
    let _ = done.send(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn next(rx: &mut mpsc::Receiver<NetEvent>) -> NetEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn connection_lifecycle() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let local = listener.local_addr().unwrap();
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(accept_loop(listener, events_tx, 8, shutdown_rx));

        let mut client = TcpStream::connect(local).await.unwrap();
        let (id, outbound) = match next(&mut events_rx).await {
            NetEvent::Connected { id, outbound, .. } => (id, outbound),
            other => panic!("expected Connected, got {other:?}"),
        };
        assert_eq!(id, SessionId(1));

        client.write_all(&[0x00, 0x07]).await.unwrap();
        let mut received = Vec::new();
        while received.len() < 2 {
            match next(&mut events_rx).await {
                NetEvent::Data { id: from, data } => {
                    assert_eq!(from, id);
                    received.extend_from_slice(&data);
                }
                other => panic!("expected Data, got {other:?}"),
            }
        }
        assert_eq!(received, vec![0x00, 0x07]);

        outbound.send(Bytes::from_static(&[0x01])).await.unwrap();
        let mut byte = [0u8; 1];
        client.read_exact(&mut byte).await.unwrap();
        assert_eq!(byte, [0x01]);

        // Dropping the queue ends the writer, which closes the socket and
        // ends the reader.
        drop(outbound);
        let mut rest = Vec::new();
        let n = timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);
        assert!(matches!(next(&mut events_rx).await, NetEvent::Closed { id: closed } if closed == id));
    }

    #[tokio::test]
    async fn peer_hangup_reports_closed() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let local = listener.local_addr().unwrap();
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(accept_loop(listener, events_tx, 8, shutdown_rx));

        let client = TcpStream::connect(local).await.unwrap();
        let (id, _outbound) = match next(&mut events_rx).await {
            NetEvent::Connected { id, outbound, .. } => (id, outbound),
            other => panic!("expected Connected, got {other:?}"),
        };
        drop(client);
        assert!(matches!(next(&mut events_rx).await, NetEvent::Closed { id: closed } if closed == id));
    }
}
