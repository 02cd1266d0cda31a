//! Example: Controlling a fireplace
//!
//! Run with: cargo run --example fire_control -- 192.168.1.27 on 22
//!
//! This example demonstrates:
//! - Powering the fire on and off
//! - Setting the target temperature
//! - Handling validation errors before anything is sent

use escea_fire::{Client, ClientConfig, FireError};
use std::net::IpAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> escea_fire::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let ip: IpAddr = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(|| "192.168.1.27".parse().unwrap());
    let power = args.next().unwrap_or_else(|| "on".to_string());
    let celsius: Option<f64> = args.next().and_then(|arg| arg.parse().ok());

    let client = Client::new(ClientConfig::default());
    let fire = client.device(ip);

    // =========================================================================
    // Power
    // =========================================================================

    fire.set_power(power == "on").await?;
    println!("Fire at {} switched {}", ip, power);

    // =========================================================================
    // Temperature
    // =========================================================================
    //
    // Fractional values are rounded up; anything outside 10..=31 is rejected
    // locally without touching the network.

    if let Some(celsius) = celsius {
        match fire.set_temperature(celsius).await {
            Ok(()) => println!("Target temperature set to {}°C", celsius.ceil()),
            Err(FireError::Validation { reason, .. }) => println!("Not sent: {}", reason),
            Err(e) => return Err(e),
        }
    }

    let status = fire.status().await?;
    println!("Now: {}", status);

    Ok(())
}
