// CLASSIFICATION: COMMUNITY
// Filename: tcp.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Line oriented TCP transport.
//!
//! Each accepted socket is one connection. Providers write one JSON
//! envelope per line. A line longer than [`MAX_FRAME_BYTES`] drops the
//! connection.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{Connection, IncomingConnection, INBOUND_CAPACITY};
use crate::error::TransportError;
use crate::lifeline::Lifeline;

/// Longest accepted line, newline excluded.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;
/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listening TCP endpoint.
#[derive(Debug)]
pub struct TcpEndpoint {
    listener: TcpListener,
}

impl TcpEndpoint {
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Start accepting. Connections are delivered on the returned channel
    /// until the receiver is dropped.
    pub fn serve(self) -> (mpsc::Receiver<IncomingConnection>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
        let handle = tokio::spawn(accept_loop(self.listener, tx));
        (rx, handle)
    }
}

async fn accept_loop(listener: TcpListener, accepted: mpsc::Sender<IncomingConnection>) {
    let mut next_id: u64 = 0;
    loop {
        let (stream, peer) = tokio::select! {
            result = listener.accept() => match result {
                Ok(pair) => pair,
                Err(err) => {
                    warn!("tcp accept failed: {err}");
                    if back_off(&accepted).await {
                        continue;
                    }
                    break;
                }
            },
            () = accepted.closed() => break,
        };
        next_id += 1;
        let incoming = open(format!("tcp-{next_id}"), stream);
        info!("accepted {} from {peer}", incoming.connection.id());
        if accepted.send(incoming).await.is_err() {
            break;
        }
    }
    debug!("tcp accept loop stopped");
}

/// Wait out [`ACCEPT_BACKOFF`]. Returns `false` if the receiver went away.
async fn back_off(accepted: &mpsc::Sender<IncomingConnection>) -> bool {
    tokio::select! {
        () = tokio::time::sleep(ACCEPT_BACKOFF) => true,
        () = accepted.closed() => false,
    }
}

fn open(id: String, stream: TcpStream) -> IncomingConnection {
    let (reader, writer) = stream.into_split();
    let (tx, inbound) = mpsc::channel(INBOUND_CAPACITY);
    let connection = Arc::new(TcpConnection {
        id,
        writer: Mutex::new(Some(writer)),
        closer: Lifeline::new(),
    });
    tokio::spawn(read_lines(connection.clone(), reader, tx));
    IncomingConnection {
        connection,
        inbound,
    }
}

async fn read_lines(
    connection: Arc<TcpConnection>,
    reader: OwnedReadHalf,
    frames: mpsc::Sender<String>,
) {
    let id = connection.id.as_str();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let closed = connection.closer.subscribe().wait();
    tokio::pin!(closed);
    loop {
        buf.clear();
        // One byte past the cap tells an overlong line from a full one.
        let limit = (MAX_FRAME_BYTES + 1) as u64;
        let mut limited = (&mut reader).take(limit);
        let read = tokio::select! {
            read = limited.read_until(b'\n', &mut buf) => read,
            () = &mut closed => break,
        };
        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                debug!("{id} read failed: {err}");
                break;
            }
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > MAX_FRAME_BYTES {
            warn!("{id} sent a frame over {MAX_FRAME_BYTES} bytes, disconnecting");
            connection.disconnect();
            break;
        }
        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(err) => {
                debug!("{id} sent invalid utf-8: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if frames.send(line).await.is_err() {
            break;
        }
    }
}

#[derive(Debug)]
struct TcpConnection {
    id: String,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closer: Lifeline,
}

impl Connection for TcpConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn disconnect(&self) {
        if self.closer.kill() {
            debug!("disconnecting {}", self.id);
            if let Ok(mut writer) = self.writer.lock() {
                writer.take();
            }
        }
    }
}
