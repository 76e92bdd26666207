use clap::Parser;
use client::brush::Brush;
use client::network::Connection;
use client::roster::Roster;
use log::{info, warn};
use rand::Rng;
use serde_json::json;
use shared::{Event, EVENT_BRUSH, FIELD_HEIGHT, FIELD_WIDTH};
use std::time::Duration;
use tokio::time::interval;

/// Cruising speed of the scripted pilot, comfortably under the brush limit.
const CRUISE_SPEED: f32 = 10.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Updates per second
    #[arg(short, long, default_value = "30")]
    rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to {}", args.server);
    let (mut sink, mut source) = Connection::connect(&args.server).await?.into_split();

    // Start somewhere random on the field with a color of our own; the relay
    // may override the color right after connecting.
    let mut rng = rand::thread_rng();
    let own_color = format!(
        "#{:02X}{:02X}{:02X}",
        rng.gen::<u8>(),
        rng.gen::<u8>(),
        rng.gen::<u8>()
    );
    let start_x = rng.gen_range(0.0..FIELD_WIDTH);
    let start_y = rng.gen_range(0.0..FIELD_HEIGHT);
    let mut roster = Roster::new(Brush::new(start_x, start_y, own_color.clone()));

    info!("Starting at ({:.0}, {:.0}) as {}", start_x, start_y, own_color);

    // Headless stand-in for the webcam driver: fly a circle.
    let mut ticker = interval(Duration::from_secs_f32(1.0 / args.rate as f32));
    let mut angle: f32 = 0.0;

    loop {
        tokio::select! {
            event = source.recv() => {
                match event {
                    Some(event) => {
                        roster.apply(&event);
                        info!(
                            "{} ({} args), {} peers known",
                            event.name,
                            event.args.len(),
                            roster.peer_count()
                        );
                    }
                    None => {
                        info!("Relay closed the connection");
                        break;
                    }
                }
            },

            _ = ticker.tick() => {
                angle += 0.05;
                let dx = angle.cos() * CRUISE_SPEED;
                let dy = angle.sin() * CRUISE_SPEED;

                roster.me.set_direction(dx, dy);
                roster.step();

                let color = roster.assigned_color().unwrap_or(&own_color);
                let update = Event::new(
                    EVENT_BRUSH,
                    vec![
                        json!(dx),
                        json!(dy),
                        json!(roster.me.pos.x),
                        json!(roster.me.pos.y),
                        json!(color),
                    ],
                );

                if let Err(e) = sink.send(&update).await {
                    warn!("Failed to send update: {}", e);
                    break;
                }
            },

            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            },
        }
    }

    sink.close().await;
    Ok(())
}
