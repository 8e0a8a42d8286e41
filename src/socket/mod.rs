mod builder;
mod datagram;
mod factory;
mod listener;
mod options;
mod raw;
mod stream;

pub use self::builder::{BufferConfig, ConnectorBuilder, DatagramBuilder, ListenerBuilder, ReuseConfig};
pub use self::datagram::BoundDatagram;
pub use self::factory::{Setup, Socket, connect_stream, make_datagram_socket, make_listener, make_socket};
pub use self::listener::Listener;
pub use self::options::{
	recv_buffer_size, send_buffer_size, set_nonblocking, set_recv_buffer_size, set_reuse_addr,
	set_reuse_port, set_send_buffer_size, set_tcp_nodelay,
};
pub use self::raw::RawSocket;
pub use self::stream::{ConnectedStream, Shutdown};

/// Socket type requested from the resolver and passed to `socket()`.
///
/// - `Stream`: reliable, ordered byte stream (TCP-like)
/// - `Datagram`: unreliable, message-oriented packets (UDP-like)
/// - `Unspecified`: let the resolver return any type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SockKind {
	Stream,
	Datagram,
	Unspecified,
}

impl SockKind {
	/// Returns the libc constant for this socket type.
	#[inline]
	pub fn raw(self) -> libc::c_int {
		match self {
			SockKind::Stream => libc::SOCK_STREAM,
			SockKind::Datagram => libc::SOCK_DGRAM,
			SockKind::Unspecified => 0,
		}
	}

	/// Maps a libc socket type back. Anything else is `Unspecified`.
	pub fn from_raw(raw: libc::c_int) -> Self {
		match raw {
			libc::SOCK_STREAM => SockKind::Stream,
			libc::SOCK_DGRAM => SockKind::Datagram,
			_ => SockKind::Unspecified,
		}
	}
}
