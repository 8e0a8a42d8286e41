use std::net::SocketAddr;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};
use crate::addr::{Endpoint, ToSockAddr, from_sockaddr};
use crate::error::{IoError, SocketError, errno};
use super::raw::{close_fd, local_addr_of};

/// A datagram socket plus the endpoint it was opened for.
///
/// Datagrams don't connect: each send names a destination and each
/// receive reports the source. The retained endpoint can be passed back
/// to [`BoundDatagram::send_to`] or bound with [`BoundDatagram::bind_endpoint`].
#[derive(Debug)]
pub struct BoundDatagram {
	fd: OwnedFd,
	endpoint: Endpoint,
}

impl BoundDatagram {
	pub(crate) fn from_parts(fd: OwnedFd, endpoint: Endpoint) -> Self {
		Self { fd, endpoint }
	}

	#[inline]
	pub fn as_raw_fd(&self) -> libc::c_int {
		self.fd.as_raw_fd()
	}

	/// The endpoint chosen during candidate iteration.
	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}

	/// Binds the socket to its retained endpoint.
	pub fn bind_endpoint(&self) -> Result<(), SocketError> {
		let result = self
			.endpoint
			.with_raw(|ptr, len| unsafe { libc::bind(self.as_raw_fd(), ptr, len) });
		match result {
			Some(-1) => Err(SocketError::Bind { errno: errno(), addr: self.endpoint.to_string() }),
			Some(_) => Ok(()),
			None => Err(SocketError::InvalidAddress { reason: "empty endpoint" }),
		}
	}

	/// Sends one datagram to `addr`. Returns the number of bytes sent.
	pub fn send_to<A: ToSockAddr>(&self, buf: &[u8], addr: &A) -> Result<usize, SocketError> {
		self.send_to_with_flags(buf, addr, 0)
	}

	pub fn send_to_with_flags<A: ToSockAddr>(
		&self,
		buf: &[u8],
		addr: &A,
		flags: i32,
	) -> Result<usize, SocketError> {
		let result = addr.with_raw(|ptr, len| unsafe {
			libc::sendto(
				self.as_raw_fd(),
				buf.as_ptr() as *const libc::c_void,
				buf.len(),
				flags,
				ptr,
				len,
			)
		});

		match result {
			Some(n) if n >= 0 => Ok(n as usize),
			Some(_) => Err(SocketError::Io(IoError::from_errno(errno(), true))),
			None => Err(SocketError::InvalidAddress { reason: "empty endpoint" }),
		}
	}

	/// Receives one datagram, returning its length and sender.
	pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
		self.recv_from_with_flags(buf, 0)
	}

	pub fn recv_from_with_flags(
		&self,
		buf: &mut [u8],
		flags: i32,
	) -> Result<(usize, SocketAddr), SocketError> {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let n = unsafe {
			libc::recvfrom(
				self.as_raw_fd(),
				buf.as_mut_ptr() as *mut libc::c_void,
				buf.len(),
				flags,
				&mut storage as *mut _ as *mut libc::sockaddr,
				&mut len,
			)
		};

		if n == -1 {
			return Err(SocketError::Io(IoError::from_errno(errno(), false)));
		}

		let addr = unsafe { from_sockaddr(&storage as *const _ as *const libc::sockaddr, len) }
			.ok_or(SocketError::InvalidAddress { reason: "invalid sender address" })?;

		Ok((n as usize, addr))
	}

	pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
		local_addr_of(self.as_raw_fd())
	}

	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), SocketError> {
		super::set_nonblocking(self, nonblocking)
	}

	pub fn into_parts(self) -> (OwnedFd, Endpoint) {
		(self.fd, self.endpoint)
	}

	/// Closes the descriptor and releases the retained endpoint.
	pub fn close(self) -> Result<(), SocketError> {
		close_fd(self.fd)
	}
}

impl AsRawFd for BoundDatagram {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl AsFd for BoundDatagram {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl IntoRawFd for BoundDatagram {
	fn into_raw_fd(self) -> RawFd {
		self.fd.into_raw_fd()
	}
}
