use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};
use crate::addr::{Endpoint, ResolveFlags, resolve};
use crate::error::SocketError;
use super::raw::close_fd;
use super::{
	BoundDatagram, ConnectedStream, ConnectorBuilder, DatagramBuilder, Listener, ListenerBuilder,
	RawSocket, SockKind,
};

/// Which setup steps follow `socket()` for each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setup {
	/// `socket()` only.
	SocketOnly,
	/// `socket()` then `bind()`.
	Bind,
	/// `socket()`, `bind()` then `listen()`.
	BindListen { backlog: i32 },
	/// `socket()` then `connect()`.
	Connect,
}

impl Setup {
	fn apply(self, socket: &RawSocket, endpoint: &Endpoint) -> Result<(), SocketError> {
		match self {
			Setup::SocketOnly => Ok(()),
			Setup::Bind => socket.bind(endpoint),
			Setup::BindListen { backlog } => {
				socket.bind(endpoint)?;
				socket.listen(backlog)
			}
			Setup::Connect => socket.connect(endpoint),
		}
	}

	fn exhausted(self, attempts: usize, last: Option<SocketError>) -> SocketError {
		let last = last.map(Box::new);
		match self {
			Setup::Connect => SocketError::ConnectFailed { attempts, last },
			_ => SocketError::BindFailed { attempts, last },
		}
	}
}

/// Tries `attempt` on each candidate in order and stops at the first success.
///
/// Whatever a failed attempt allocated must be released before it returns
/// its error. On exhaustion the last error is handed back.
pub(crate) fn first_success<'a, T, F>(
	candidates: &'a [Endpoint],
	mut attempt: F,
) -> Result<(T, &'a Endpoint), Option<SocketError>>
where
	F: FnMut(&Endpoint) -> Result<T, SocketError>,
{
	let mut last = None;
	for (index, endpoint) in candidates.iter().enumerate() {
		match attempt(endpoint) {
			Ok(value) => {
				tracing::debug!(%endpoint, index, "candidate accepted");
				return Ok((value, endpoint));
			}
			Err(error) => {
				tracing::debug!(%endpoint, index, %error, "candidate rejected");
				last = Some(error);
			}
		}
	}
	Err(last)
}

/// Opens the first candidate for which `socket()`, `configure` and `setup`
/// all succeed. Rejected sockets are closed before the next candidate.
pub(crate) fn open_candidates<C>(
	candidates: &[Endpoint],
	setup: Setup,
	configure: C,
) -> Result<(OwnedFd, Endpoint), SocketError>
where
	C: Fn(&RawSocket, &Endpoint) -> Result<(), SocketError>,
{
	first_success(candidates, |endpoint| {
		let socket = RawSocket::open(endpoint)?;
		configure(&socket, endpoint)?;
		setup.apply(&socket, endpoint)?;
		Ok(socket.into_fd())
	})
	.map(|(fd, endpoint)| (fd, endpoint.clone()))
	.map_err(|last| setup.exhausted(candidates.len(), last))
}

/// A live descriptor plus, when retention was requested, the endpoint it
/// was opened for.
#[derive(Debug)]
pub struct Socket {
	fd: OwnedFd,
	endpoint: Option<Endpoint>,
}

impl Socket {
	#[inline]
	pub fn as_raw_fd(&self) -> libc::c_int {
		self.fd.as_raw_fd()
	}

	pub fn endpoint(&self) -> Option<&Endpoint> {
		self.endpoint.as_ref()
	}

	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), SocketError> {
		super::set_nonblocking(self, nonblocking)
	}

	pub fn into_parts(self) -> (OwnedFd, Option<Endpoint>) {
		(self.fd, self.endpoint)
	}

	/// Closes the descriptor and releases the retained endpoint.
	pub fn close(self) -> Result<(), SocketError> {
		close_fd(self.fd)
	}
}

impl AsRawFd for Socket {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl AsFd for Socket {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl IntoRawFd for Socket {
	fn into_raw_fd(self) -> RawFd {
		self.fd.into_raw_fd()
	}
}

/// Resolves and opens the first usable candidate.
///
/// With `retain = false` only the descriptor is kept; the endpoint list is
/// released before returning either way.
pub fn make_socket(
	host: Option<&str>,
	port: &str,
	kind: SockKind,
	flags: ResolveFlags,
	setup: Setup,
	retain: bool,
) -> Result<Socket, SocketError> {
	let candidates = resolve(host, port, kind, flags)?;
	let (fd, endpoint) = open_candidates(&candidates, setup, |_, _| Ok(()))?;
	Ok(Socket { fd, endpoint: retain.then_some(endpoint) })
}

/// Connects a stream socket to `host`:`port`.
pub fn connect_stream(host: &str, port: &str) -> Result<ConnectedStream, SocketError> {
	ConnectorBuilder::new().connect(host, port)
}

/// Binds a passive stream socket on `port` and starts listening.
pub fn make_listener(port: &str, backlog: i32) -> Result<Listener, SocketError> {
	ListenerBuilder::new().backlog(backlog).bind(port)
}

/// Creates a datagram socket for the local passive endpoint on `port`.
///
/// The socket is not bound. The resolved endpoint is retained for
/// address-qualified sends and for a later [`BoundDatagram::bind_endpoint`].
pub fn make_datagram_socket(port: &str) -> Result<BoundDatagram, SocketError> {
	DatagramBuilder::new().open(port)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;
	use std::net::SocketAddr;

	fn loopback(port: u16, kind: SockKind) -> Endpoint {
		Endpoint::from_socket_addr(SocketAddr::from(([127, 0, 0, 1], port)), kind)
	}

	struct Guard<'a>(&'a Cell<usize>);

	impl Drop for Guard<'_> {
		fn drop(&mut self) {
			self.0.set(self.0.get() + 1);
		}
	}

	#[test]
	fn first_success_tries_in_order_and_releases_rejects() {
		let candidates = [1, 2, 3].map(|p| loopback(p, SockKind::Stream));
		let released = Cell::new(0);
		let mut seen = Vec::new();

		let (guard, chosen) = first_success(&candidates, |ep| {
			let port = ep.socket_addr().unwrap().port();
			seen.push(port);
			let guard = Guard(&released);
			if port < 3 {
				return Err(SocketError::Bind { errno: libc::EADDRINUSE, addr: ep.to_string() });
			}
			Ok(guard)
		})
		.unwrap();

		assert_eq!(seen, vec![1, 2, 3]);
		assert_eq!(released.get(), 2);
		assert_eq!(chosen, &candidates[2]);
		drop(guard);
		assert_eq!(released.get(), 3);
	}

	#[test]
	fn exhaustion_reports_last_error() {
		let candidates = [loopback(1, SockKind::Stream), loopback(2, SockKind::Stream)];
		let last = first_success(&candidates, |ep| -> Result<(), _> {
			Err(SocketError::Connect { errno: libc::ECONNREFUSED, addr: ep.to_string() })
		})
		.unwrap_err();
		match last {
			Some(SocketError::Connect { addr, .. }) => assert_eq!(addr, "127.0.0.1:2"),
			other => panic!("unexpected: {other:?}"),
		}
	}

	#[test]
	fn empty_candidate_list_fails_by_setup() {
		let err = open_candidates(&[], Setup::Connect, |_, _| Ok(())).unwrap_err();
		assert!(matches!(err, SocketError::ConnectFailed { attempts: 0, last: None }));

		let err = open_candidates(&[], Setup::BindListen { backlog: 1 }, |_, _| Ok(())).unwrap_err();
		assert!(matches!(err, SocketError::BindFailed { attempts: 0, last: None }));
	}

	#[test]
	fn configure_failure_rejects_candidate() {
		let candidates = [loopback(0, SockKind::Datagram)];
		let err = open_candidates(&candidates, Setup::SocketOnly, |_, _| {
			Err(SocketError::SetOption { errno: libc::EINVAL, option: "test" })
		})
		.unwrap_err();
		match err {
			SocketError::BindFailed { attempts: 1, last: Some(last) } => {
				assert!(matches!(*last, SocketError::SetOption { option: "test", .. }))
			}
			other => panic!("unexpected: {other:?}"),
		}
	}

	#[test]
	fn make_socket_retention() {
		let kept = make_socket(
			Some("127.0.0.1"),
			"0",
			SockKind::Datagram,
			ResolveFlags::NUMERIC_HOST,
			Setup::Bind,
			true,
		)
		.unwrap();
		assert_eq!(kept.endpoint().map(Endpoint::kind), Some(SockKind::Datagram));
		kept.close().unwrap();

		let bare = make_socket(None, "0", SockKind::Stream, ResolveFlags::PASSIVE, Setup::SocketOnly, false)
			.unwrap();
		assert!(bare.endpoint().is_none());
		let (fd, endpoint) = bare.into_parts();
		assert!(endpoint.is_none());
		close_fd(fd).unwrap();
	}
}
