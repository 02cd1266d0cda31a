//! UDP transport session for fireplace communication.
//!
//! This module provides [`UdpTransport`], which turns "send this frame to that
//! device" into "get a reply frame or a timeout". It only knows about sockets
//! and bytes; frame contents are the codec's business.
//!
//! # Design
//!
//! The controller replies to a fixed port rather than to the sender's source
//! port, so the transport binds that exact local port. The wire format has no
//! transaction identifier, so replies are correlated structurally:
//!
//! - **One window at a time** - a request holds the endpoint from send until
//!   its reply or timeout. A second caller either queues or is rejected,
//!   depending on [`ConcurrencyPolicy`].
//! - **Generation-tagged slot** - each window registers a single pending-reply
//!   slot. A timeout (or any other exit) retires it, so a datagram that shows
//!   up late is dropped instead of reaching the next request. Anything still
//!   queued on the socket when a window opens is discarded first.
//! - **Peer filter** - only datagrams from the addressed device fill the slot.
//!
//! A background task owns the receive side of the socket. When no window has
//! been open for [`TransportConfig::idle_timeout`] it closes the socket to
//! free the port; the next request binds it again.
//!
//! # Example
//!
//! ```no_run
//! use escea_fire::{CommandFrame, TransportConfig, UdpTransport};
//! use std::time::Duration;
//!
//! # async fn example() -> escea_fire::Result<()> {
//! let transport = UdpTransport::new(TransportConfig::default());
//!
//! let reply = transport
//!     .send_and_await(
//!         "192.168.1.27".parse().unwrap(),
//!         &CommandFrame::status_query(),
//!         Duration::from_secs(1),
//!     )
//!     .await?;
//! println!("{}", reply.status());
//! # Ok(())
//! # }
//! ```

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, trace, warn};

use crate::command::CommandFrame;
use crate::error::{FireError, Result};
use crate::response::ReplyFrame;
use crate::utils::format_frame;

/// UDP port the controller listens on.
pub const DEFAULT_DEVICE_PORT: u16 = 3300;

/// Local UDP port the controller sends its replies to.
pub const DEFAULT_LOCAL_PORT: u16 = 3300;

/// Default reply window.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default time an unused endpoint stays bound before it is closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive buffer size. Larger than a frame so oversized replies are seen as such.
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// What happens when a request arrives while another one is waiting for its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// Wait until the open window closes, then proceed.
    #[default]
    Queue,
    /// Fail immediately with `FireError::ConcurrentRequest`.
    Reject,
}

/// Configuration for a [`UdpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Local address to bind.
    pub bind_ip: IpAddr,
    /// Local port to bind; the controller replies to this port.
    pub local_port: u16,
    /// Port the controller listens on.
    pub device_port: u16,
    /// How long an endpoint with no open window stays bound.
    pub idle_timeout: Duration,
    /// Behaviour for overlapping requests.
    pub policy: ConcurrencyPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            local_port: DEFAULT_LOCAL_PORT,
            device_port: DEFAULT_DEVICE_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            policy: ConcurrencyPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Sets the local bind address (default `0.0.0.0`).
    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Sets the local port (default 3300).
    ///
    /// Port `0` binds an ephemeral port, which only works with devices that
    /// reply to the sender's source port.
    pub fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = port;
        self
    }

    /// Sets the controller port (default 3300).
    pub fn with_device_port(mut self, port: u16) -> Self {
        self.device_port = port;
        self
    }

    /// Sets the idle window after which the endpoint is closed (default 5s).
    ///
    /// `Duration::MAX` keeps the endpoint bound until [`UdpTransport::close`].
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Sets the policy for overlapping requests (default [`ConcurrencyPolicy::Queue`]).
    pub fn with_policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// The single reply the open window is waiting for.
struct PendingReply {
    generation: u64,
    peer: IpAddr,
    reply_tx: oneshot::Sender<Vec<u8>>,
}

/// State shared between request windows and the receive task.
struct EndpointState {
    socket: Option<Arc<UdpSocket>>,
    local_addr: SocketAddr,
    pending: Option<PendingReply>,
    last_activity: Instant,
}

impl EndpointState {
    fn is_closed(&self) -> bool {
        self.socket.is_none()
    }
}

/// A bound socket plus the task receiving on it.
struct Endpoint {
    state: Arc<Mutex<EndpointState>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Endpoint {
    /// Binds the endpoint with the first window already registered.
    async fn open(
        config: &TransportConfig,
        pending: PendingReply,
    ) -> Result<(Self, Arc<UdpSocket>)> {
        let bind_addr = SocketAddr::new(config.bind_ip, config.local_port);
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            if e.kind() == io::ErrorKind::AddrInUse {
                FireError::transport_busy(config.local_port)
            } else {
                FireError::Network(e)
            }
        })?;
        let local_addr = socket.local_addr()?;
        discard_queued(&socket);
        let socket = Arc::new(socket);

        let state = Arc::new(Mutex::new(EndpointState {
            socket: Some(Arc::clone(&socket)),
            local_addr,
            pending: Some(pending),
            last_activity: Instant::now(),
        }));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(Self::run_receive_loop(
            Arc::clone(&socket),
            Arc::clone(&state),
            shutdown_rx,
            config.idle_timeout,
        ));

        debug!(%local_addr, "Endpoint bound");

        Ok((
            Self {
                state,
                shutdown_tx: Some(shutdown_tx),
                task,
            },
            socket,
        ))
    }

    /// Registers a window on an open endpoint.
    ///
    /// Datagrams already queued on the socket predate this window and are
    /// discarded under the same lock that installs it. Hands the registration
    /// back if the receive task already closed the socket.
    fn register(
        &self,
        pending: PendingReply,
    ) -> std::result::Result<Arc<UdpSocket>, PendingReply> {
        let mut state = self.state.lock();
        let Some(socket) = state.socket.clone() else {
            return Err(pending);
        };
        discard_queued(&socket);
        state.pending = Some(pending);
        state.last_activity = Instant::now();
        Ok(socket)
    }

    /// Stops the receive task and waits until it has released the socket.
    async fn retire(mut self) {
        self.state.lock().socket = None;
        drop(self.shutdown_tx.take());
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "Receive task ended abnormally");
        }
    }

    async fn run_receive_loop(
        socket: Arc<UdpSocket>,
        state: Arc<Mutex<EndpointState>>,
        mut shutdown_rx: oneshot::Receiver<()>,
        idle_timeout: Duration,
    ) {
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        let mut failures = FailureStreak::default();

        loop {
            let idle_deadline = {
                let state = state.lock();
                let since = if state.pending.is_some() {
                    Instant::now()
                } else {
                    state.last_activity
                };
                since.checked_add(idle_timeout)
            };

            tokio::select! {
                _ = &mut shutdown_rx => {
                    debug!("Endpoint shut down");
                    break;
                }

                ready = socket.readable() => {
                    match ready {
                        Ok(()) => Self::receive_queued(&socket, &state, &mut buffer, &mut failures),
                        Err(e) => failures.note(&e),
                    }
                }

                _ = idle_expiry(idle_deadline) => {
                    let mut state = state.lock();
                    if state.pending.is_none() && idle_elapsed(state.last_activity, idle_timeout) {
                        state.socket = None;
                        debug!("Endpoint idle, closing");
                        break;
                    }
                }
            }
        }
    }

    /// Reads every queued datagram while holding the state lock, so a read
    /// can never interleave with a window being registered.
    fn receive_queued(
        socket: &UdpSocket,
        state: &Mutex<EndpointState>,
        buffer: &mut [u8],
        failures: &mut FailureStreak,
    ) {
        let mut state = state.lock();
        loop {
            match socket.try_recv_from(buffer) {
                Ok((len, from)) => {
                    failures.reset();
                    Self::dispatch(&buffer[..len], from, &mut state);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    failures.note(&e);
                    break;
                }
            }
        }
    }

    /// Hands a datagram to the open window, or drops it.
    fn dispatch(data: &[u8], from: SocketAddr, state: &mut EndpointState) {
        let expected = state
            .pending
            .as_ref()
            .is_some_and(|pending| same_host(pending.peer, from.ip()));
        if !expected {
            trace!(%from, len = data.len(), "Dropping unsolicited datagram");
            return;
        }

        if let Some(pending) = state.pending.take() {
            state.last_activity = Instant::now();
            debug!(
                %from,
                generation = pending.generation,
                frame = %format_frame(data),
                "Reply received"
            );
            // The window may have just timed out; the reply is then discarded.
            let _ = pending.reply_tx.send(data.to_vec());
        }
    }
}

/// Drops whatever is waiting in the socket's receive queue.
///
/// Reads through a duplicated std handle: tokio skips the syscall while its
/// cached readiness is clear, which hides datagrams the reactor has not seen yet.
fn discard_queued(socket: &UdpSocket) {
    let queue = match std_handle(socket).and_then(|queue| {
        queue.set_nonblocking(true)?;
        Ok(queue)
    }) {
        Ok(queue) => queue,
        Err(e) => {
            warn!(error = %e, "Could not inspect receive queue");
            return;
        }
    };
    let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
    loop {
        match queue.recv_from(&mut buffer) {
            Ok((len, from)) => trace!(%from, len, "Discarding stale datagram"),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => {
                trace!(error = %e, "Receive error while discarding stale datagrams");
                break;
            }
        }
    }
}

/// A non-blocking std socket sharing the tokio socket's receive queue.
#[cfg(unix)]
fn std_handle(socket: &UdpSocket) -> io::Result<std::net::UdpSocket> {
    use std::os::fd::AsFd;
    Ok(socket.as_fd().try_clone_to_owned()?.into())
}

#[cfg(windows)]
fn std_handle(socket: &UdpSocket) -> io::Result<std::net::UdpSocket> {
    use std::os::windows::io::AsSocket;
    Ok(socket.as_socket().try_clone_to_owned()?.into())
}

/// Completes at `deadline`, or never when there is none.
async fn idle_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn idle_elapsed(last_activity: Instant, idle_timeout: Duration) -> bool {
    last_activity
        .checked_add(idle_timeout)
        .is_some_and(|deadline| deadline <= Instant::now())
}

/// Consecutive receive failures. Only the first of a streak is worth a warning.
#[derive(Debug, Default)]
struct FailureStreak {
    count: u32,
}

impl FailureStreak {
    /// Counts a failure; returns `true` if it starts a new streak.
    fn record(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.count == 1
    }

    /// Logs a receive failure, warning only for the first one in a row.
    fn note(&mut self, error: &io::Error) {
        if self.record() {
            warn!(%error, "Receive failed");
        } else {
            trace!(%error, failures = self.count(), "Receive failed again");
        }
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}

fn same_host(a: IpAddr, b: IpAddr) -> bool {
    a.to_canonical() == b.to_canonical()
}

/// One open request window. Dropping it retires the pending-reply slot.
struct Window {
    socket: Arc<UdpSocket>,
    state: Arc<Mutex<EndpointState>>,
    generation: u64,
    reply_rx: oneshot::Receiver<Vec<u8>>,
}

impl Drop for Window {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        let current = state
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == self.generation);
        if current {
            state.pending = None;
            trace!(generation = self.generation, "Pending reply retired");
        }
        state.last_activity = Instant::now();
    }
}

/// UDP transport for fireplace communication.
///
/// At most one request window is open at any time. The endpoint is bound
/// lazily, reused across sequential requests and closed when idle or when the
/// transport is dropped.
pub struct UdpTransport {
    config: TransportConfig,
    endpoint: AsyncMutex<Option<Endpoint>>,
    current: Mutex<Option<Arc<Mutex<EndpointState>>>>,
    generation: AtomicU64,
}

impl UdpTransport {
    /// Creates a transport. No socket is bound until the first request.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            endpoint: AsyncMutex::new(None),
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Sends a frame to `ip` and waits for exactly one reply.
    ///
    /// # Errors
    ///
    /// - `FireError::TransportBusy` if the local port is owned by another socket
    /// - `FireError::ConcurrentRequest` if a window is open and the policy is
    ///   [`ConcurrencyPolicy::Reject`]
    /// - `FireError::Network` if the send fails
    /// - `FireError::Timeout` if no reply arrives within `window`; never earlier
    /// - `FireError::MalformedReply` if the reply is not exactly 16 bytes
    pub async fn send_and_await(
        &self,
        ip: IpAddr,
        frame: &CommandFrame,
        window: Duration,
    ) -> Result<ReplyFrame> {
        let mut slot = match self.config.policy {
            ConcurrencyPolicy::Queue => self.endpoint.lock().await,
            ConcurrencyPolicy::Reject => self
                .endpoint
                .try_lock()
                .map_err(|_| FireError::ConcurrentRequest)?,
        };

        let mut open = self.open_window(&mut slot, ip).await?;
        let target = SocketAddr::new(ip, self.config.device_port);

        debug!(
            command = %frame.command(),
            %target,
            generation = open.generation,
            frame = %format_frame(frame.as_bytes()),
            "Sending command"
        );
        open.socket.send_to(frame.as_bytes(), target).await?;

        let data = match timeout(window, &mut open.reply_rx).await {
            Ok(Ok(data)) => data,
            Ok(Err(_)) => {
                return Err(FireError::Network(io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    "endpoint closed while waiting for a reply",
                )))
            }
            Err(_) => {
                warn!(
                    %target,
                    generation = open.generation,
                    timeout_ms = window.as_millis() as u64,
                    "No reply before timeout"
                );
                return Err(FireError::timeout(window));
            }
        };
        drop(open);

        ReplyFrame::from_bytes(&data)
    }

    /// Registers a new window, binding the endpoint first if needed.
    async fn open_window(&self, slot: &mut Option<Endpoint>, peer: IpAddr) -> Result<Window> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (reply_tx, reply_rx) = oneshot::channel();
        let pending = PendingReply {
            generation,
            peer,
            reply_tx,
        };

        let pending = match slot.as_ref() {
            Some(endpoint) => match endpoint.register(pending) {
                Ok(socket) => {
                    return Ok(Window {
                        socket,
                        state: Arc::clone(&endpoint.state),
                        generation,
                        reply_rx,
                    })
                }
                Err(pending) => pending,
            },
            None => pending,
        };

        if let Some(stale) = slot.take() {
            *self.current.lock() = None;
            stale.retire().await;
        }

        let (endpoint, socket) = Endpoint::open(&self.config, pending).await?;
        let state = Arc::clone(&endpoint.state);
        *self.current.lock() = Some(Arc::clone(&state));
        *slot = Some(endpoint);

        Ok(Window {
            socket,
            state,
            generation,
            reply_rx,
        })
    }

    /// Returns the bound local address, or `None` if no endpoint is open.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        let current = self.current.lock();
        current.as_ref().and_then(|state| {
            let state = state.lock();
            (!state.is_closed()).then_some(state.local_addr)
        })
    }

    /// Returns `true` if an endpoint is currently bound.
    pub fn is_open(&self) -> bool {
        self.local_addr().is_some()
    }

    /// Closes the endpoint now and releases the local port.
    ///
    /// The next request binds it again.
    pub async fn close(&self) {
        let mut slot = self.endpoint.lock().await;
        if let Some(endpoint) = slot.take() {
            *self.current.lock() = None;
            endpoint.retire().await;
        }
    }

    /// Returns the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("config", &self.config)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}
