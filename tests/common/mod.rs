//! Simulated fireplace controller on loopback UDP.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use escea_fire::{
    ClientConfig, DeviceStatus, TransportConfig, FRAME_SIZE, START_MARKER, TRAILER,
};
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// What the fake device does with one request.
pub enum Action {
    /// Send these bytes back after the delay.
    Reply { delay: Duration, bytes: Vec<u8> },
    /// Never answer.
    Ignore,
}

impl Action {
    pub fn now(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Reply {
            delay: Duration::ZERO,
            bytes: bytes.into(),
        }
    }

    pub fn after(delay: Duration, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Reply {
            delay,
            bytes: bytes.into(),
        }
    }
}

/// Builds the reply a controller in `status` would send.
pub fn reply_frame(status: DeviceStatus) -> [u8; FRAME_SIZE] {
    let mut bytes = [0u8; FRAME_SIZE];
    bytes[0] = START_MARKER;
    bytes[4] = status.power as u8;
    bytes[5] = status.fan_boost as u8;
    bytes[6] = status.flame_effect as u8;
    bytes[7] = status.desired_temp;
    bytes[8] = status.room_temp;
    bytes[FRAME_SIZE - 2..].copy_from_slice(&TRAILER);
    bytes
}

/// A reply whose room temperature identifies which answer it is.
pub fn tagged_reply(room_temp: u8) -> [u8; FRAME_SIZE] {
    reply_frame(DeviceStatus {
        power: true,
        room_temp,
        ..DeviceStatus::default()
    })
}

/// A reply that echoes the request's parameter byte as the desired temperature.
pub fn echo_reply(request: &[u8]) -> [u8; FRAME_SIZE] {
    reply_frame(DeviceStatus {
        desired_temp: request[3],
        ..DeviceStatus::default()
    })
}

type Script = Box<dyn Fn(usize, &[u8]) -> Action + Send + Sync>;

pub struct FakeDevice {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    task: JoinHandle<()>,
}

impl FakeDevice {
    /// Starts a device that answers request `n` (0-based) as `script` says.
    pub async fn start(script: impl Fn(usize, &[u8]) -> Action + Send + Sync + 'static) -> Self {
        let socket = Arc::new(UdpSocket::bind((LOCALHOST, 0)).await.unwrap());
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let script: Script = Box::new(script);

        let task = tokio::spawn({
            let requests = Arc::clone(&requests);
            async move {
                let mut buffer = [0u8; 512];
                loop {
                    let Ok((len, from)) = socket.recv_from(&mut buffer).await else {
                        break;
                    };
                    let request = buffer[..len].to_vec();
                    let index = {
                        let mut requests = requests.lock();
                        requests.push(request.clone());
                        requests.len() - 1
                    };

                    if let Action::Reply { delay, bytes } = script(index, &request) {
                        let socket = Arc::clone(&socket);
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = socket.send_to(&bytes, from).await;
                        });
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// Starts a device that always answers immediately with `status`.
    pub async fn answering(status: DeviceStatus) -> Self {
        let bytes = reply_frame(status);
        Self::start(move |_, _| Action::now(bytes)).await
    }

    /// Starts a device that never answers.
    pub async fn silent() -> Self {
        Self::start(|_, _| Action::Ignore).await
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().clone()
    }

    /// Transport settings that reach this device over loopback.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::default()
            .with_bind_ip(LOCALHOST)
            .with_local_port(0)
            .with_device_port(self.port())
    }

    /// Client settings that reach this device over loopback.
    pub fn client_config(&self, timeout: Duration) -> ClientConfig {
        ClientConfig::new()
            .with_transport(self.transport_config())
            .with_timeout(timeout)
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}
