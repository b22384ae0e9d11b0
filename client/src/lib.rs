//! # Relay Client Library
//!
//! Headless client for the position relay server. It connects over
//! WebSocket, joins the session, reports its own position and mirrors
//! everyone else's from the packets the server relays.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Owns the WebSocket connection:
//! - Connection establishment
//! - Packet encoding and decoding
//! - Receiving with a timeout so callers can poll
//!
//! ### View Module (`view`)
//! Keeps the client's picture of the session:
//! - Snapshot on join
//! - Peers appearing, moving and leaving
//! - Last animation tag per peer
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use client::view::PeerView;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), client::BoxError> {
//!     let mut client = Client::connect("ws://127.0.0.1:3001").await?;
//!     let mut view = PeerView::new();
//!
//!     client.join().await?;
//!     while let Some(packet) = client.recv(Duration::from_millis(500)).await? {
//!         view.apply(&packet);
//!     }
//!
//!     client.send_move(420, 1000, "walk").await?;
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod view;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
