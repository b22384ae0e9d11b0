use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use shared::{decode, encode, Packet};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::BoxError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One WebSocket connection to the relay server
pub struct Client {
    stream: WsStream,
}

impl Client {
    pub async fn connect(url: &str) -> Result<Self, BoxError> {
        let (stream, _) = connect_async(url).await?;
        Ok(Client { stream })
    }

    pub async fn send(&mut self, packet: &Packet) -> Result<(), BoxError> {
        let data = encode(packet)?;
        self.stream.send(Message::binary(data)).await?;
        Ok(())
    }

    pub async fn join(&mut self) -> Result<(), BoxError> {
        self.send(&Packet::Join).await
    }

    pub async fn send_move(&mut self, x: i32, y: i32, anim: &str) -> Result<(), BoxError> {
        self.send(&Packet::Move {
            x,
            y,
            anim: anim.to_string(),
        })
        .await
    }

    pub async fn probe(&mut self) -> Result<(), BoxError> {
        self.send(&Packet::Probe).await
    }

    /// Waits up to `wait` for the next packet.
    ///
    /// Returns `Ok(None)` on timeout and an error once the server closed the
    /// connection.
    pub async fn recv(&mut self, wait: Duration) -> Result<Option<Packet>, BoxError> {
        match timeout(wait, self.next_packet()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    async fn next_packet(&mut self) -> Result<Packet, BoxError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Binary(data) => match decode(&data) {
                    Ok(packet) => return Ok(packet),
                    Err(e) => warn!("Failed to deserialize packet: {}", e),
                },
                Message::Close(_) => break,
                other => debug!("Skipping frame {:?}", other),
            }
        }
        Err("connection closed by server".into())
    }

    pub async fn close(mut self) -> Result<(), BoxError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
