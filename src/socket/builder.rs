use crate::addr::{Endpoint, ResolveFlags, resolve_datagram, resolve_stream};
use crate::error::SocketError;
use super::factory::{Setup, open_candidates};
use super::{
	BoundDatagram, ConnectedStream, Listener, RawSocket,
	set_recv_buffer_size, set_reuse_addr, set_reuse_port, set_send_buffer_size, set_tcp_nodelay,
};

// ============================================================================
// Shared Configuration Structs
// ============================================================================

/// Buffer size configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferConfig {
	pub recv: Option<usize>,
	pub send: Option<usize>,
}

impl BufferConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn recv(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self
	}

	pub fn send(mut self, size: usize) -> Self {
		self.send = Some(size);
		self
	}

	pub fn both(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self.send = Some(size);
		self
	}

	fn apply(&self, socket: &RawSocket) -> Result<(), SocketError> {
		if let Some(size) = self.recv {
			set_recv_buffer_size(socket, size)?;
		}
		if let Some(size) = self.send {
			set_send_buffer_size(socket, size)?;
		}
		Ok(())
	}
}

/// Address reuse configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReuseConfig {
	pub addr: bool,
	pub port: bool,
}

impl ReuseConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn addr(mut self, enable: bool) -> Self {
		self.addr = enable;
		self
	}

	pub fn port(mut self, enable: bool) -> Self {
		self.port = enable;
		self
	}

	fn apply(&self, socket: &RawSocket) -> Result<(), SocketError> {
		if self.addr {
			set_reuse_addr(socket, true)?;
		}
		if self.port {
			set_reuse_port(socket, true)?;
		}
		Ok(())
	}
}

fn apply_nodelay(socket: &RawSocket, endpoint: &Endpoint, enable: bool) -> Result<(), SocketError> {
	let inet = endpoint.family() == libc::AF_INET || endpoint.family() == libc::AF_INET6;
	if enable && inet && endpoint.socktype() == libc::SOCK_STREAM {
		set_tcp_nodelay(socket, true)?;
	}
	Ok(())
}

// ============================================================================
// Listener Builder
// ============================================================================

/// Builder for passive stream sockets.
///
/// Options are applied to every candidate before `bind()`.
///
/// # Example
/// ```no_run
/// use cxsock::{ListenerBuilder, ReuseConfig};
///
/// let listener = ListenerBuilder::new()
///     .reuse(ReuseConfig::new().addr(true))
///     .backlog(1024)
///     .bind("8080")?;
/// # Ok::<(), cxsock::SocketError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ListenerBuilder {
	host: Option<String>,
	reuse: ReuseConfig,
	buffers: BufferConfig,
	nodelay: bool,
	backlog: i32,
}

impl Default for ListenerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ListenerBuilder {
	pub fn new() -> Self {
		Self {
			host: None,
			reuse: ReuseConfig { addr: true, port: false },
			buffers: BufferConfig::default(),
			nodelay: false,
			backlog: 128,
		}
	}

	/// Bind to a specific local host instead of the wildcard address.
	pub fn host(mut self, host: impl Into<String>) -> Self {
		self.host = Some(host.into());
		self
	}

	/// Set address reuse options. Default: `SO_REUSEADDR` on.
	pub fn reuse(mut self, config: ReuseConfig) -> Self {
		self.reuse = config;
		self
	}

	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	/// Set TCP_NODELAY, inherited by accepted connections.
	pub fn nodelay(mut self, enable: bool) -> Self {
		self.nodelay = enable;
		self
	}

	/// Set listen backlog. Default: 128.
	pub fn backlog(mut self, backlog: i32) -> Self {
		self.backlog = backlog;
		self
	}

	/// Resolves the passive endpoints for `port` and listens on the first
	/// that binds.
	pub fn bind(&self, port: &str) -> Result<Listener, SocketError> {
		let candidates = resolve_stream(self.host.as_deref(), port, ResolveFlags::PASSIVE)?;
		self.bind_candidates(&candidates)
	}

	/// Listens on the first of `candidates` that binds.
	pub fn bind_candidates(&self, candidates: &[Endpoint]) -> Result<Listener, SocketError> {
		let setup = Setup::BindListen { backlog: self.backlog };
		let (fd, _) = open_candidates(candidates, setup, |socket, endpoint| {
			self.reuse.apply(socket)?;
			self.buffers.apply(socket)?;
			apply_nodelay(socket, endpoint, self.nodelay)
		})?;
		Ok(Listener::from_fd(fd))
	}
}

// ============================================================================
// Connector Builder
// ============================================================================

/// Builder for outbound stream connections.
///
/// # Example
/// ```no_run
/// use cxsock::{BufferConfig, ConnectorBuilder};
///
/// let conn = ConnectorBuilder::new()
///     .nodelay(true)
///     .buffers(BufferConfig::new().both(65536))
///     .connect("localhost", "8080")?;
/// # Ok::<(), cxsock::SocketError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectorBuilder {
	buffers: BufferConfig,
	nodelay: bool,
}

impl ConnectorBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	/// Set TCP_NODELAY. Default: off.
	pub fn nodelay(mut self, enable: bool) -> Self {
		self.nodelay = enable;
		self
	}

	/// Resolves `host`:`port` and connects to the first candidate that accepts.
	pub fn connect(&self, host: &str, port: &str) -> Result<ConnectedStream, SocketError> {
		let candidates = resolve_stream(Some(host), port, ResolveFlags::empty())?;
		self.connect_candidates(&candidates)
	}

	pub fn connect_candidates(&self, candidates: &[Endpoint]) -> Result<ConnectedStream, SocketError> {
		let (fd, _) = open_candidates(candidates, Setup::Connect, |socket, endpoint| {
			self.buffers.apply(socket)?;
			apply_nodelay(socket, endpoint, self.nodelay)
		})?;
		Ok(ConnectedStream::from_fd(fd))
	}
}

// ============================================================================
// Datagram Builder
// ============================================================================

/// Builder for datagram sockets.
///
/// By default only `socket()` runs for each candidate and the chosen
/// endpoint is retained. Enable [`DatagramBuilder::bind`] to also bind it.
///
/// # Example
/// ```no_run
/// use cxsock::{BufferConfig, DatagramBuilder};
///
/// let socket = DatagramBuilder::new()
///     .bind(true)
///     .buffers(BufferConfig::new().recv(1 << 20))
///     .open("5353")?;
/// # Ok::<(), cxsock::SocketError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatagramBuilder {
	host: Option<String>,
	reuse: ReuseConfig,
	buffers: BufferConfig,
	bind: bool,
}

impl DatagramBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolve a specific local host instead of the wildcard address.
	pub fn host(mut self, host: impl Into<String>) -> Self {
		self.host = Some(host.into());
		self
	}

	/// Set address reuse options. Default: both off.
	pub fn reuse(mut self, config: ReuseConfig) -> Self {
		self.reuse = config;
		self
	}

	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	/// Bind each candidate as part of setup. Default: off.
	pub fn bind(mut self, enable: bool) -> Self {
		self.bind = enable;
		self
	}

	/// Resolves the passive endpoints for `port` and opens the first usable one.
	pub fn open(&self, port: &str) -> Result<BoundDatagram, SocketError> {
		let candidates = resolve_datagram(self.host.as_deref(), port, ResolveFlags::PASSIVE)?;
		self.open_candidates(&candidates)
	}

	pub fn open_candidates(&self, candidates: &[Endpoint]) -> Result<BoundDatagram, SocketError> {
		let setup = if self.bind { Setup::Bind } else { Setup::SocketOnly };
		let (fd, endpoint) = open_candidates(candidates, setup, |socket, _| {
			self.reuse.apply(socket)?;
			self.buffers.apply(socket)
		})?;
		Ok(BoundDatagram::from_parts(fd, endpoint))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::socket::recv_buffer_size;

	#[test]
	fn defaults() {
		let listener = ListenerBuilder::new();
		assert_eq!(listener.backlog, 128);
		assert!(listener.reuse.addr);
		assert!(!listener.reuse.port);

		let datagram = DatagramBuilder::new();
		assert!(!datagram.bind);
		assert!(!datagram.reuse.addr);
	}

	#[test]
	fn buffer_config_reaches_socket() {
		let socket = DatagramBuilder::new()
			.host("127.0.0.1")
			.buffers(BufferConfig::new().recv(128 * 1024))
			.open("0")
			.unwrap();
		assert!(recv_buffer_size(&socket).unwrap() >= 128 * 1024);
	}

	#[test]
	fn listener_on_loopback_host() {
		let listener = ListenerBuilder::new()
			.host("127.0.0.1")
			.nodelay(true)
			.backlog(4)
			.bind("0")
			.unwrap();
		let addr = listener.local_addr().unwrap();
		assert!(addr.ip().is_loopback());
		assert_ne!(addr.port(), 0);
	}
}
