use std::net::SocketAddr;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use crate::addr::from_sockaddr;
use crate::error::{SocketError, errno};
use super::raw::{close_fd, local_addr_of};
use super::stream::ConnectedStream;

/// A listening stream socket ready to accept connections.
#[derive(Debug)]
pub struct Listener {
	fd: OwnedFd,
}

impl Listener {
	pub(crate) fn from_fd(fd: OwnedFd) -> Self {
		Self { fd }
	}

	/// Returns the raw file descriptor.
	#[inline]
	pub fn as_raw_fd(&self) -> libc::c_int {
		self.fd.as_raw_fd()
	}

	/// Accepts an incoming connection, blocking until one arrives.
	pub fn accept(&self) -> Result<ConnectedStream, SocketError> {
		let fd = unsafe {
			libc::accept4(
				self.as_raw_fd(),
				std::ptr::null_mut(),
				std::ptr::null_mut(),
				libc::SOCK_CLOEXEC,
			)
		};

		if fd == -1 {
			return Err(SocketError::Accept { errno: errno() });
		}

		let fd = unsafe { OwnedFd::from_raw_fd(fd) };
		Ok(ConnectedStream::from_fd(fd))
	}

	/// Accepts a connection, returning the client's address.
	pub fn accept_with_addr(&self) -> Result<(ConnectedStream, SocketAddr), SocketError> {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let fd = unsafe {
			libc::accept4(
				self.as_raw_fd(),
				&mut storage as *mut _ as *mut libc::sockaddr,
				&mut len,
				libc::SOCK_CLOEXEC,
			)
		};

		if fd == -1 {
			return Err(SocketError::Accept { errno: errno() });
		}

		let stream = ConnectedStream::from_fd(unsafe { OwnedFd::from_raw_fd(fd) });
		let addr = unsafe { from_sockaddr(&storage as *const _ as *const libc::sockaddr, len) }
			.ok_or(SocketError::InvalidAddress { reason: "invalid client address" })?;

		Ok((stream, addr))
	}

	pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
		local_addr_of(self.as_raw_fd())
	}

	/// Sets or clears `O_NONBLOCK`; a non-blocking `accept()` fails with
	/// `EAGAIN` when nothing is pending.
	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), SocketError> {
		super::set_nonblocking(self, nonblocking)
	}

	pub fn close(self) -> Result<(), SocketError> {
		close_fd(self.fd)
	}
}

impl AsRawFd for Listener {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl AsFd for Listener {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl FromRawFd for Listener {
	unsafe fn from_raw_fd(fd: RawFd) -> Self {
		unsafe { Self::from_fd(OwnedFd::from_raw_fd(fd)) }
	}
}

impl IntoRawFd for Listener {
	fn into_raw_fd(self) -> RawFd {
		self.fd.into_raw_fd()
	}
}
