use clap::Parser;
use client::network::Client;
use client::view::PeerView;
use client::BoxError;
use log::{info, warn};
use rand::Rng;
use shared::{Packet, SPAWN_X_MIN, SPAWN_X_SPREAD, SPAWN_Y};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3001")]
    server: String,

    /// Number of random-walk steps to send
    #[arg(short = 'm', long, default_value = "10")]
    moves: u32,

    /// Delay between steps in milliseconds
    #[arg(short = 'i', long, default_value = "250")]
    interval_ms: u64,

    /// Animation tag attached to every move
    #[arg(short = 'a', long, default_value = "walk")]
    anim: String,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    let mut client = Client::connect(&args.server).await?;
    let mut view = PeerView::new();
    let interval = Duration::from_millis(args.interval_ms);

    client.join().await?;
    client.probe().await?;

    let mut position = (SPAWN_X_MIN + SPAWN_X_SPREAD / 2, SPAWN_Y);
    let mut rng = rand::thread_rng();

    for step in 0..args.moves {
        drain(&mut client, &mut view, interval).await?;

        if step == 0 {
            info!("Session has {} known players", view.len());
        }

        position.0 += rng.gen_range(-10..=10);
        client.send_move(position.0, position.1, &args.anim).await?;
    }

    drain(&mut client, &mut view, interval).await?;
    info!(
        "Done after {} moves, {} peers visible, {} probe acks",
        args.moves,
        view.len(),
        view.probe_acks()
    );

    client.close().await?;
    Ok(())
}

/// Applies every packet that arrives within `wait`.
async fn drain(client: &mut Client, view: &mut PeerView, wait: Duration) -> Result<(), BoxError> {
    while let Some(packet) = client.recv(wait).await? {
        match &packet {
            Packet::PlayerJoined { player } => info!("Player {} joined", player.id),
            Packet::PlayerLeft { id } => info!("Player {} left", id),
            Packet::ProbeAck => info!("Probe acknowledged"),
            _ => {}
        }
        if !view.apply(&packet) {
            warn!("Server sent unexpected packet {:?}", packet);
        }
    }
    Ok(())
}
