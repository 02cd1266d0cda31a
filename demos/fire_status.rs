//! Example: Reading fireplace status
//!
//! Run with: cargo run --example fire_status -- 192.168.1.27
//!
//! This example demonstrates:
//! - Creating a client with default settings
//! - Querying status
//! - Treating timeouts as "device unreachable"
//!
//! Set `RUST_LOG=escea_fire=debug` to see the frames on the wire.

use escea_fire::{Client, ClientConfig};
use std::net::IpAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> escea_fire::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ip: IpAddr = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(|| "192.168.1.27".parse().unwrap());

    let client = Client::new(ClientConfig::new().with_timeout(Duration::from_secs(2)));

    // =========================================================================
    // Poll a few times, the way a home-automation bridge would
    // =========================================================================

    for _ in 0..3 {
        match client.get_status(ip).await {
            Ok(status) => {
                println!("Fire:         {}", if status.power { "ON" } else { "OFF" });
                println!("Fan boost:    {}", status.fan_boost);
                println!("Flame effect: {}", status.flame_effect);
                println!("Desired:      {}°C", status.desired_temp);
                println!("Room:         {}°C", status.room_temp);
            }
            Err(e) if e.is_unreachable() => println!("{} is unreachable: {}", ip, e),
            Err(e) => return Err(e),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    client.close().await;
    Ok(())
}
