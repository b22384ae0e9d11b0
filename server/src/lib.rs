//! # Position Relay Server Library
//!
//! This library provides the server side of a real-time position-sync
//! service for a multiplayer session. Clients hold a persistent WebSocket
//! connection, are assigned a player identity, and report their own position;
//! the server relays those reports to every other connected client.
//!
//! ## Core Responsibilities
//!
//! ### Connection Gateway
//! Accepts transport connections and binds each one to a freshly spawned
//! player. A connection starts in the `Connecting` state and only becomes
//! `Active` after it sends `Join`. Transport close, read errors and EOF all
//! count as a disconnect and retire the player exactly once.
//!
//! ### Player Registry
//! An append-only table of every player created by the process. Ids are
//! assigned as the table length, so `registry[i].id == i` always holds.
//! Disconnecting retires a player by resetting it to the origin; ids are
//! never reused.
//!
//! ### Broadcasting
//! | Inbound | Outbound | Audience |
//! |---|---|---|
//! | `Join` | `Snapshot` | the joining connection |
//! | `Join` | `PlayerJoined` | everyone else |
//! | `Move` | `PlayerMoved` | everyone else |
//! | `Probe` | `ProbeAck` | everyone, sender included |
//! | disconnect | `PlayerLeft` | everyone else |
//!
//! The server does not validate coordinates or rate-limit movement; it only
//! relays what clients report.
//!
//! ## Architecture Design
//!
//! ### Single Event Loop
//! Every connection task forwards its events over one channel to the main
//! loop, which owns the [`session::Session`] and processes events one at a
//! time. A registry mutation and the queueing of all packets it triggers
//! complete before the next event is looked at. Actual socket writes happen
//! afterwards on per-connection writer tasks.
//!
//! ### Protocol Violations
//! Packets that are malformed, arrive before `Join`, or are server-only are
//! logged and dropped. The connection stays open and nothing is broadcast.
//!
//! ## Module Organization
//!
//! - `registry`: the append-only player table
//! - `client_manager`: live connections, their state and outbound queues
//! - `session`: applies inbound events to the registry and fans out packets
//! - `network`: WebSocket gateway and the main loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut server = Server::new("127.0.0.1:3001").await?;
//!     let shutdown = server.shutdown_handle();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         shutdown.shutdown();
//!     });
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Scaling Limitations
//! The registry grows by one entry per connection for the lifetime of the
//! process. That is fine for a bounded session but not for a long-running
//! public server.
//!
//! Each connection's outbound queue is unbounded. The main loop never waits
//! on a socket write, so a client that stops reading while its peers keep
//! moving accumulates queued packets in server memory until its transport
//! errors out or closes.

pub mod client_manager;
pub mod network;
pub mod registry;
pub mod session;
