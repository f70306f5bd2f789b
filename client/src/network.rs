//! Client side of the UDP transport.
//!
//! A reader task unframes every datagram into the inbound queue and a
//! writer task drains the outbound command queue, pinging the server when
//! the player is idle. Both queues drop their oldest entry when full.

use log::{debug, error, info, warn};
use shared::codec::{is_handshake_response, unframe};
use shared::{
    Command, LatestQueue, CLIENT_COMMAND_QUEUE, CLIENT_STATE_QUEUE, CONNECT_ATTEMPTS,
    CONNECT_BACKOFF, HANDSHAKE_REQUEST, KEEPALIVE_INTERVAL, MAX_FRAME_SIZE,
};
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid server address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("server did not answer the handshake after {attempts} attempts")]
    HandshakeTimeout { attempts: u32 },
    #[error("connection attempt cancelled")]
    Cancelled,
}

pub struct UdpClient {
    server_addr: SocketAddr,
    inbound: LatestQueue<Vec<u8>>,
    outbound: LatestQueue<Command>,
    tasks: Vec<JoinHandle<()>>,
}

impl UdpClient {
    /// Handshakes with `server`, giving up after `CONNECT_ATTEMPTS` tries.
    pub async fn connect(server: &str) -> Result<Self, ClientError> {
        Self::connect_with_cancel(server, std::future::pending::<()>()).await
    }

    /// Like [`UdpClient::connect`], but abandons the attempt as soon as
    /// `cancel` completes.
    pub async fn connect_with_cancel(
        server: &str,
        cancel: impl Future<Output = ()>,
    ) -> Result<Self, ClientError> {
        let server_addr: SocketAddr = server.parse()?;
        let bind_addr = if server_addr.is_ipv6() {
            "[::]:0"
        } else {
            "0.0.0.0:0"
        };
        let socket = Arc::new(UdpSocket::bind(bind_addr).await?);
        socket.connect(server_addr).await?;
        info!("Connecting to {} from {}", server_addr, socket.local_addr()?);

        let inbound = LatestQueue::new(CLIENT_STATE_QUEUE);
        let outbound = LatestQueue::new(CLIENT_COMMAND_QUEUE);
        let accepted = Arc::new(Notify::new());

        let mut client = UdpClient {
            server_addr,
            inbound: inbound.clone(),
            outbound: outbound.clone(),
            tasks: vec![spawn_reader(
                Arc::clone(&socket),
                inbound,
                Arc::clone(&accepted),
            )],
        };

        tokio::pin!(cancel);
        for attempt in 1..=CONNECT_ATTEMPTS {
            send_datagram(&socket, &[HANDSHAKE_REQUEST]).await?;

            tokio::select! {
                _ = &mut cancel => {
                    info!("Connection attempt cancelled");
                    return Err(ClientError::Cancelled);
                }
                _ = accepted.notified() => {
                    info!("Connected to {} after {} attempt(s)", server_addr, attempt);
                    client.tasks.push(spawn_writer(socket, outbound));
                    return Ok(client);
                }
                _ = sleep(CONNECT_BACKOFF) => {
                    debug!("Handshake attempt {} unanswered", attempt);
                }
            }
        }

        warn!("Giving up on {}", server_addr);
        Err(ClientError::HandshakeTimeout {
            attempts: CONNECT_ATTEMPTS,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Queues the command bound to `key`. Keys outside the command alphabet
    /// are ignored and return false.
    pub fn press_key(&self, key: char) -> bool {
        match Command::from_key(key) {
            Some(command) => {
                self.outbound.push(command);
                true
            }
            None => false,
        }
    }

    /// The oldest unframed message still queued, without waiting.
    pub fn read(&self) -> Option<Vec<u8>> {
        self.inbound.try_pop()
    }

    /// Handles to the inbound message queue and the outbound command queue.
    pub fn queues(&self) -> (LatestQueue<Vec<u8>>, LatestQueue<Command>) {
        (self.inbound.clone(), self.outbound.clone())
    }

    pub fn disconnect(&mut self) {
        self.outbound.close();
        self.inbound.close();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("Disconnected from {}", self.server_addr);
    }
}

impl Drop for UdpClient {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// A refused send only means nobody listens yet on a connected socket.
async fn send_datagram(socket: &UdpSocket, data: &[u8]) -> Result<(), ClientError> {
    match socket.send(data).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
            debug!("Server refused datagram: {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn spawn_reader(
    socket: Arc<UdpSocket>,
    inbound: LatestQueue<Vec<u8>>,
    accepted: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buffer = vec![0u8; MAX_FRAME_SIZE];

        loop {
            match socket.recv(&mut buffer).await {
                Ok(len) => match unframe(&buffer[..len]) {
                    Ok(message) => {
                        if is_handshake_response(&message) {
                            debug!("Handshake answered");
                        }
                        // A state broadcast also proves we are registered.
                        accepted.notify_one();
                        inbound.push(message);
                    }
                    Err(e) => warn!("Dropping malformed datagram: {}", e),
                },
                Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                    debug!("Server not reachable: {}", e);
                    sleep(Duration::from_millis(10)).await;
                }
                Err(e) => {
                    error!("Error receiving datagram: {}", e);
                    break;
                }
            }
        }
        inbound.close();
    })
}

/// Sends queued commands; after `KEEPALIVE_INTERVAL` of silence sends a
/// handshake ping instead so the server keeps the session alive.
fn spawn_writer(socket: Arc<UdpSocket>, outbound: LatestQueue<Command>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = [0u8; 4];

        loop {
            let key = match timeout(KEEPALIVE_INTERVAL, outbound.pop()).await {
                Ok(Some(command)) => command.key(),
                Ok(None) => break,
                Err(_) => char::from(HANDSHAKE_REQUEST),
            };

            if let Err(e) = send_datagram(&socket, key.encode_utf8(&mut buf).as_bytes()).await {
                error!("Failed to send {:?}: {}", key, e);
            }
        }
        debug!("Writer finished");
    })
}
