//! # Escea Fireplace Protocol Library
//!
//! A Rust library for querying and commanding Escea gas fireplace controllers
//! over their local-network UDP protocol.
//!
//! This is a **protocol-only** library: no polling, schedulers or
//! home-automation adapters. Each call produces exactly 1 request and at most
//! 1 reply. No automatic retries or caching.
//!
//! ## Features
//!
//! - **Fixed frames**: every command and reply is exactly 16 bytes
//! - **Safe correlation**: one request window at a time, late replies dropped
//! - **Async**: built on tokio; waiting for a reply never blocks a thread
//! - **No panics**: all errors returned as `Result<T, FireError>`
//!
//! ## Quick Start
//!
//! ```no_run
//! use escea_fire::{Client, ClientConfig};
//! use std::net::Ipv4Addr;
//!
//! #[tokio::main]
//! async fn main() -> escea_fire::Result<()> {
//!     let client = Client::new(ClientConfig::default());
//!     let fire = Ipv4Addr::new(192, 168, 1, 27);
//!
//!     let status = client.get_status(fire).await?;
//!     println!("{}", status);
//!
//!     client.power_on(fire).await?;
//!     client.set_temperature(fire, 22.0).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Wire Format
//!
//! | Command | Frame |
//! |---------|-------|
//! | Status query | `47 31 00 00 00 00 00 00 00 00 00 00 00 00 31 46` |
//! | Power on | `47 39 00 00 00 00 00 00 00 00 00 00 00 00 31 46` |
//! | Power off | `47 3A 00 00 00 00 00 00 00 00 00 00 00 00 31 46` |
//! | Set 22°C | `47 57 01 16 00 00 00 00 00 00 00 00 00 00 31 46` |
//!
//! Replies carry power, fan boost, flame effect, desired and room temperature
//! at bytes 4 to 8. See [`DeviceStatus`].
//!
//! ## Error Handling
//!
//! ```no_run
//! use escea_fire::{Client, ClientConfig, FireError};
//! use std::net::Ipv4Addr;
//!
//! # async fn example() {
//! let client = Client::new(ClientConfig::default());
//!
//! match client.get_status(Ipv4Addr::new(192, 168, 1, 27)).await {
//!     Ok(status) => println!("{}", status),
//!     Err(e) if e.is_unreachable() => println!("Fireplace unreachable, keeping last state"),
//!     Err(FireError::TransportBusy { port }) => println!("Port {} is in use", port),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```
//! use escea_fire::{ClientConfig, ConcurrencyPolicy, TransportConfig};
//! use std::time::Duration;
//!
//! let config = ClientConfig::new()
//!     .with_timeout(Duration::from_secs(2))             // reply window (default: 1s)
//!     .with_transport(
//!         TransportConfig::default()
//!             .with_device_port(3300)                     // controller port
//!             .with_local_port(3300)                      // port replies arrive on
//!             .with_idle_timeout(Duration::from_secs(30)) // keep socket bound between polls
//!             .with_policy(ConcurrencyPolicy::Reject),    // fail overlapping requests
//!     );
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod command;
mod error;
mod frame;
mod response;
mod transport;
pub mod utils;

// Public re-exports
pub use client::{Client, ClientConfig, Fireplace};
pub use command::{Command, CommandFrame, Temperature};
pub use error::{FireError, Result};
pub use frame::{FRAME_SIZE, START_MARKER, TRAILER};
pub use response::{DeviceStatus, ReplyFrame};
pub use transport::{
    ConcurrencyPolicy, TransportConfig, UdpTransport, DEFAULT_DEVICE_PORT, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_LOCAL_PORT, DEFAULT_TIMEOUT, MAX_DATAGRAM_SIZE,
};
