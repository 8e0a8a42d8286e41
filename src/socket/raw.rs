use std::net::SocketAddr;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use crate::addr::{Endpoint, ToSockAddr, from_sockaddr};
use crate::error::{SocketError, errno};

/// A socket created for one endpoint but not yet bound, listening or connected.
///
/// Every setup step borrows the socket. If a later step fails the caller
/// drops it and the descriptor is closed.
#[derive(Debug)]
pub struct RawSocket {
	fd: OwnedFd,
}

impl RawSocket {
	/// Calls `socket()` with the endpoint's family, type and protocol.
	///
	/// The socket is created with `SOCK_CLOEXEC` (close on exec).
	pub fn open(endpoint: &Endpoint) -> Result<Self, SocketError> {
		let fd = unsafe {
			libc::socket(
				endpoint.family(),
				endpoint.socktype() | libc::SOCK_CLOEXEC,
				endpoint.protocol(),
			)
		};
		if fd == -1 {
			return Err(SocketError::Create { errno: errno() });
		}
		Ok(Self { fd: unsafe { OwnedFd::from_raw_fd(fd) } })
	}

	pub fn bind(&self, endpoint: &Endpoint) -> Result<(), SocketError> {
		let result = endpoint.with_raw(|ptr, len| unsafe { libc::bind(self.as_raw_fd(), ptr, len) });
		match result {
			Some(-1) => Err(SocketError::Bind { errno: errno(), addr: endpoint.to_string() }),
			Some(_) => Ok(()),
			None => Err(SocketError::InvalidAddress { reason: "empty endpoint" }),
		}
	}

	/// `backlog` is the maximum pending connection queue size.
	pub fn listen(&self, backlog: i32) -> Result<(), SocketError> {
		let result = unsafe { libc::listen(self.as_raw_fd(), backlog) };
		if result == -1 {
			return Err(SocketError::Listen { errno: errno(), backlog });
		}
		Ok(())
	}

	/// Blocking connect to the endpoint.
	pub fn connect(&self, endpoint: &Endpoint) -> Result<(), SocketError> {
		let result = endpoint.with_raw(|ptr, len| unsafe { libc::connect(self.as_raw_fd(), ptr, len) });
		match result {
			Some(-1) => Err(SocketError::Connect { errno: errno(), addr: endpoint.to_string() }),
			Some(_) => Ok(()),
			None => Err(SocketError::InvalidAddress { reason: "empty endpoint" }),
		}
	}

	pub(crate) fn into_fd(self) -> OwnedFd {
		self.fd
	}
}

impl AsRawFd for RawSocket {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl AsFd for RawSocket {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl IntoRawFd for RawSocket {
	fn into_raw_fd(self) -> RawFd {
		self.fd.into_raw_fd()
	}
}

/// Closes a descriptor and reports the result of `close()`.
pub(crate) fn close_fd(fd: OwnedFd) -> Result<(), SocketError> {
	let raw = fd.into_raw_fd();
	if unsafe { libc::close(raw) } == -1 {
		return Err(SocketError::Close { errno: errno() });
	}
	Ok(())
}

/// Returns the local address bound to `fd`.
pub(crate) fn local_addr_of(fd: RawFd) -> Result<SocketAddr, SocketError> {
	sockname(fd, libc::getsockname, "SO_SOCKNAME")
}

/// Returns the remote address `fd` is connected to.
pub(crate) fn peer_addr_of(fd: RawFd) -> Result<SocketAddr, SocketError> {
	sockname(fd, libc::getpeername, "SO_PEERNAME")
}

fn sockname(
	fd: RawFd,
	call: unsafe extern "C" fn(libc::c_int, *mut libc::sockaddr, *mut libc::socklen_t) -> libc::c_int,
	option: &'static str,
) -> Result<SocketAddr, SocketError> {
	let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
	let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

	let result = unsafe { call(fd, &mut storage as *mut _ as *mut libc::sockaddr, &mut len) };
	if result == -1 {
		return Err(SocketError::GetOption { errno: errno(), option });
	}

	unsafe { from_sockaddr(&storage as *const _ as *const libc::sockaddr, len) }
		.ok_or(SocketError::InvalidAddress { reason: "not an internet address" })
}
