//! Minimal blocking socket toolkit.
//!
//! Resolve host/port strings into candidate endpoints, open the first one
//! that works as a connected stream, a listener or a datagram socket, move
//! whole buffers with `send_all`/`recv_all`/`recv_part`, and pack integers
//! into a fixed little-endian wire layout.

pub mod codec;
pub mod socket;
pub mod transfer;
mod addr;
mod error;

pub use self::addr::{Endpoint, ResolveFlags, ToSockAddr, resolve, resolve_datagram, resolve_stream};
pub use self::codec::{
	is_big_endian, pack32, pack32_into, pack64, pack64_into, unpack32, unpack32_from, unpack64,
	unpack64_from,
};
pub use self::error::{IoError, ResolveError, ResolveErrorKind, SocketError, errno};
pub use self::socket::{
	BoundDatagram, BufferConfig, ConnectedStream, ConnectorBuilder, DatagramBuilder, Listener,
	ListenerBuilder, RawSocket, ReuseConfig, Setup, Shutdown, SockKind, Socket, connect_stream,
	make_datagram_socket, make_listener, make_socket,
};
pub use self::transfer::{FdTransport, Transport, recv_all, recv_part, send_all};
