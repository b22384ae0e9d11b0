//! Server network layer: WebSocket gateway and the serialized event loop

use crate::client_manager::ConnectionId;
use crate::session::Session;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{decode, encode, Packet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        connection_id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Packet>,
    },
    PacketReceived {
        connection_id: ConnectionId,
        packet: Packet,
    },
    Disconnected {
        connection_id: ConnectionId,
    },
    Shutdown,
}

/// Stops a running [`Server`] from another task
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ShutdownHandle {
    /// Asks the main loop to stop after the event it is processing.
    pub fn shutdown(&self) {
        if self.server_tx.send(ServerMessage::Shutdown).is_err() {
            debug!("Server loop already stopped");
        }
    }
}

/// Accepts connections and feeds every event through a single [`Session`]
pub struct Server {
    listener: Arc<TcpListener>,
    session: Session,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    acceptor: Option<JoinHandle<()>>,
}

impl Server {
    pub async fn new(addr: &str) -> Result<Self, BoxError> {
        Self::with_session(addr, Session::new()).await
    }

    pub async fn with_session(addr: &str, session: Session) -> Result<Self, BoxError> {
        let listener = Arc::new(TcpListener::bind(addr).await?);
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            session,
            server_tx,
            server_rx,
            acceptor: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BoxError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    /// Spawns task that accepts TCP connections and hands each to its own task
    fn spawn_acceptor(&mut self) {
        let listener = Arc::clone(&self.listener);
        let server_tx = self.server_tx.clone();

        self.acceptor = Some(tokio::spawn(async move {
            let mut next_connection_id: ConnectionId = 0;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let connection_id = next_connection_id;
                        next_connection_id += 1;

                        tokio::spawn(Self::handle_connection(
                            stream,
                            addr,
                            connection_id,
                            server_tx.clone(),
                        ));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        }));
    }

    /// Runs one connection: handshake, writer task, then the read loop.
    ///
    /// Sends exactly one `Disconnected` for every `Connected` it sent.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        connection_id: ConnectionId,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        let websocket = match accept_async(stream).await {
            Ok(websocket) => websocket,
            Err(e) => {
                warn!("WebSocket handshake with {} failed: {}", addr, e);
                return;
            }
        };
        let (mut ws_sink, mut ws_stream) = websocket.split();
        let (sender, mut outbound) = mpsc::unbounded_channel::<Packet>();

        if server_tx
            .send(ServerMessage::Connected {
                connection_id,
                addr,
                sender,
            })
            .is_err()
        {
            return;
        }

        tokio::spawn(async move {
            while let Some(packet) = outbound.recv().await {
                let data = match encode(&packet) {
                    Ok(data) => data,
                    Err(e) => {
                        error!("Failed to encode packet for {}: {}", connection_id, e);
                        continue;
                    }
                };

                if let Err(e) = ws_sink.send(Message::binary(data)).await {
                    debug!("Failed to send to connection {}: {}", connection_id, e);
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        while let Some(frame) = ws_stream.next().await {
            match frame {
                Ok(Message::Binary(data)) => match decode(&data) {
                    Ok(packet) => {
                        let message = ServerMessage::PacketReceived {
                            connection_id,
                            packet,
                        };
                        if server_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to deserialize packet from {}: {}", addr, e);
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(_)) => {
                    warn!("Ignoring text frame from {}", addr);
                }
                // Ping/pong replies are handled by tungstenite
                Ok(_) => {}
                Err(e) => {
                    debug!("Connection {} read error: {}", connection_id, e);
                    break;
                }
            }
        }

        let _ = server_tx.send(ServerMessage::Disconnected { connection_id });
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected {
                connection_id,
                addr,
                sender,
            } => {
                info!("New connection {} from {}", connection_id, addr);
                self.session.on_connect(connection_id, addr, sender);
            }
            ServerMessage::PacketReceived {
                connection_id,
                packet,
            } => {
                if let Err(violation) = self.session.handle_packet(connection_id, packet) {
                    warn!("Dropped packet: {}", violation);
                }
            }
            ServerMessage::Disconnected { connection_id } => {
                self.session.on_disconnect(connection_id);
            }
            ServerMessage::Shutdown => {}
        }
    }

    /// Main server loop. Every event is handled to completion before the next.
    pub async fn run(&mut self) -> Result<(), BoxError> {
        self.spawn_acceptor();

        info!("Server started successfully");

        loop {
            match self.server_rx.recv().await {
                Some(ServerMessage::Shutdown) | None => {
                    info!("Server shutting down");
                    break;
                }
                Some(message) => self.handle_message(message),
            }
        }

        // No new connections once the loop is gone
        if let Some(acceptor) = self.acceptor.take() {
            acceptor.abort();
        }
        Ok(())
    }
}
