use clap::Parser;
use log::info;
use server::network::Server;
use shared::{RelayConfig, EVENT_BRUSH_LEAVE};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Event name broadcast when a session disconnects
    #[arg(long, default_value = EVENT_BRUSH_LEAVE)]
    departure_event: String,

    /// Disable per-session color assignment
    #[arg(long)]
    no_colors: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = RelayConfig {
        departure_event: args.departure_event,
        assign_colors: !args.no_colors,
        ..RelayConfig::default()
    };

    let address = format!("{}:{}", args.host, args.port);
    info!("Starting relay on {}", address);

    let server = Server::bind(&address, config).await?;
    server.run().await
}
