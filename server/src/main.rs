use clap::Parser;
use log::info;
use server::network::{BoxError, Server};
use server::session::Session;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Seed for spawn positions; random if omitted
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let session = match args.seed {
        Some(seed) => {
            info!("Using spawn seed {}", seed);
            Session::with_seed(seed)
        }
        None => Session::new(),
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::with_session(&address, session).await?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            shutdown.shutdown();
        }
    });

    server.run().await
}
