//! High-level client for Escea fireplace controllers.
//!
//! This module provides the [`Client`] struct, the primary interface for
//! querying and commanding a fireplace.
//!
//! # Overview
//!
//! Each operation:
//! - validates its input and encodes a command frame
//! - sends it through the [`UdpTransport`] and waits for one reply
//! - decodes the reply where it carries meaning
//!
//! Each call produces exactly one request and at most one reply. There are no
//! automatic retries; pollers and other resilient callers layer on top.
//!
//! # Example
//!
//! ```no_run
//! use escea_fire::{Client, ClientConfig};
//! use std::net::Ipv4Addr;
//!
//! # async fn example() -> escea_fire::Result<()> {
//! let client = Client::new(ClientConfig::default());
//! let fire = Ipv4Addr::new(192, 168, 1, 27);
//!
//! let status = client.get_status(fire).await?;
//! println!("Room is {}°C", status.room_temp);
//!
//! client.set_power(fire, true).await?;
//! client.set_temperature(fire, 22.0).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! `Client` is `Send + Sync`. Overlapping requests are serialized by the
//! transport (or rejected, see [`ConcurrencyPolicy`](crate::ConcurrencyPolicy)),
//! because replies carry nothing that ties them to a request.

use std::net::IpAddr;
use std::time::Duration;

use tracing::debug;

use crate::command::CommandFrame;
use crate::error::Result;
use crate::response::{DeviceStatus, ReplyFrame};
use crate::transport::{TransportConfig, UdpTransport, DEFAULT_TIMEOUT};

/// Configuration for creating a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Transport settings (ports, idle close, concurrency policy).
    pub transport: TransportConfig,
    /// Reply window for each request.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with default ports and a 1 second timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reply window (default is 1 second).
    ///
    /// # Example
    ///
    /// ```
    /// use escea_fire::ClientConfig;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new().with_timeout(Duration::from_secs(2));
    /// assert_eq!(config.timeout, Duration::from_secs(2));
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the transport settings.
    ///
    /// # Example
    ///
    /// ```
    /// use escea_fire::{ClientConfig, ConcurrencyPolicy, TransportConfig};
    ///
    /// let config = ClientConfig::new().with_transport(
    ///     TransportConfig::default().with_policy(ConcurrencyPolicy::Reject),
    /// );
    /// ```
    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

/// Client for Escea fireplace controllers.
pub struct Client {
    transport: UdpTransport,
    timeout: Duration,
}

impl Client {
    /// Creates a new client. No socket is bound until the first request.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            transport: UdpTransport::new(config.transport),
            timeout: config.timeout,
        }
    }

    async fn request(&self, ip: IpAddr, frame: &CommandFrame) -> Result<ReplyFrame> {
        self.transport.send_and_await(ip, frame, self.timeout).await
    }

    /// Reads the current status of the fireplace at `ip`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No reply arrives in time (`FireError::Timeout`)
    /// - The reply is not a 16-byte frame (`FireError::MalformedReply`)
    /// - The transport fails (`FireError::TransportBusy`, `FireError::Network`)
    pub async fn get_status(&self, ip: impl Into<IpAddr>) -> Result<DeviceStatus> {
        let ip = ip.into();
        let reply = self.request(ip, &CommandFrame::status_query()).await?;
        let status = reply.status();
        debug!(%ip, %status, "Status decoded");
        Ok(status)
    }

    /// Turns the burner on or off.
    ///
    /// Any reply counts as acknowledgement; its contents are not interpreted.
    pub async fn set_power(&self, ip: impl Into<IpAddr>, on: bool) -> Result<()> {
        self.request(ip.into(), &CommandFrame::power(on)).await?;
        Ok(())
    }

    /// Turns the burner on.
    pub async fn power_on(&self, ip: impl Into<IpAddr>) -> Result<()> {
        self.set_power(ip, true).await
    }

    /// Turns the burner off.
    pub async fn power_off(&self, ip: impl Into<IpAddr>) -> Result<()> {
        self.set_power(ip, false).await
    }

    /// Sets the target temperature, rounding `celsius` up to a whole degree.
    ///
    /// # Errors
    ///
    /// Returns `FireError::Validation` without sending anything if the rounded
    /// value is outside 10..=31, and the transport errors otherwise.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use escea_fire::{Client, ClientConfig, FireError};
    /// use std::net::Ipv4Addr;
    ///
    /// # async fn example() {
    /// let client = Client::new(ClientConfig::default());
    /// let fire = Ipv4Addr::new(192, 168, 1, 27);
    ///
    /// let result = client.set_temperature(fire, 40.0).await;
    /// assert!(matches!(result, Err(FireError::Validation { .. })));
    /// # }
    /// ```
    pub async fn set_temperature(&self, ip: impl Into<IpAddr>, celsius: f64) -> Result<()> {
        let frame = CommandFrame::set_temperature(celsius)?;
        self.request(ip.into(), &frame).await?;
        Ok(())
    }

    /// Returns a handle bound to the fireplace at `ip`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use escea_fire::{Client, ClientConfig};
    /// use std::net::Ipv4Addr;
    ///
    /// # async fn example() -> escea_fire::Result<()> {
    /// let client = Client::new(ClientConfig::default());
    /// let lounge = client.device(Ipv4Addr::new(192, 168, 1, 27));
    ///
    /// if !lounge.status().await?.power {
    ///     lounge.power_on().await?;
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn device(&self, ip: impl Into<IpAddr>) -> Fireplace<'_> {
        Fireplace {
            client: self,
            ip: ip.into(),
        }
    }

    /// Releases the local port now instead of waiting for the idle timeout.
    pub async fn close(&self) {
        self.transport.close().await;
    }

    /// Returns the reply window used for each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &UdpTransport {
        &self.transport
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A single fireplace reached through a [`Client`].
#[derive(Debug, Clone, Copy)]
pub struct Fireplace<'a> {
    client: &'a Client,
    ip: IpAddr,
}

impl Fireplace<'_> {
    /// Returns the fireplace address.
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Reads the current status.
    pub async fn status(&self) -> Result<DeviceStatus> {
        self.client.get_status(self.ip).await
    }

    /// Turns the burner on or off.
    pub async fn set_power(&self, on: bool) -> Result<()> {
        self.client.set_power(self.ip, on).await
    }

    /// Turns the burner on.
    pub async fn power_on(&self) -> Result<()> {
        self.client.power_on(self.ip).await
    }

    /// Turns the burner off.
    pub async fn power_off(&self) -> Result<()> {
        self.client.power_off(self.ip).await
    }

    /// Sets the target temperature.
    pub async fn set_temperature(&self, celsius: f64) -> Result<()> {
        self.client.set_temperature(self.ip, celsius).await
    }
}
