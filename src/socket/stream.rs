use std::net::SocketAddr;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use crate::error::{IoError, SocketError, errno};
use crate::transfer::{self, Transport};
use super::raw::{close_fd, local_addr_of, peer_addr_of};

/// A connected stream socket.
///
/// Created by `Listener::accept()` (server) or `connect_stream()` (client).
/// `send`/`recv` are single attempts that may move fewer bytes than asked;
/// `send_all`/`recv_all`/`recv_part` loop until done.
#[derive(Debug)]
pub struct ConnectedStream {
	fd: OwnedFd,
}

impl ConnectedStream {
	pub(crate) fn from_fd(fd: OwnedFd) -> Self {
		Self { fd }
	}

	/// Returns the raw file descriptor.
	#[inline]
	pub fn as_raw_fd(&self) -> libc::c_int {
		self.fd.as_raw_fd()
	}

	pub fn send(&self, buf: &[u8]) -> Result<usize, IoError> {
		self.send_with_flags(buf, 0)
	}

	pub fn send_with_flags(&self, buf: &[u8], flags: i32) -> Result<usize, IoError> {
		let n = unsafe {
			libc::send(
				self.as_raw_fd(),
				buf.as_ptr() as *const libc::c_void,
				buf.len(),
				flags | libc::MSG_NOSIGNAL,
			)
		};

		if n == -1 {
			Err(IoError::from_errno(errno(), true))
		} else {
			Ok(n as usize)
		}
	}

	/// Single receive. `Ok(0)` means the peer shut down its side.
	pub fn recv(&self, buf: &mut [u8]) -> Result<usize, IoError> {
		self.recv_with_flags(buf, 0)
	}

	pub fn recv_with_flags(&self, buf: &mut [u8], flags: i32) -> Result<usize, IoError> {
		let n = unsafe {
			libc::recv(
				self.as_raw_fd(),
				buf.as_mut_ptr() as *mut libc::c_void,
				buf.len(),
				flags,
			)
		};

		if n == -1 {
			Err(IoError::from_errno(errno(), false))
		} else {
			Ok(n as usize)
		}
	}

	/// Blocks until all of `buf` has been sent.
	pub fn send_all(&self, buf: &[u8]) -> Result<usize, IoError> {
		transfer::send_all(&mut &*self, buf)
	}

	/// Blocks until `buf` is full. See [`transfer::recv_all`].
	pub fn recv_all(&self, buf: &mut [u8]) -> Result<usize, IoError> {
		transfer::recv_all(&mut &*self, buf)
	}

	/// Blocks until at least `target` bytes are in `buf`. See [`transfer::recv_part`].
	pub fn recv_part(&self, buf: &mut [u8], target: usize) -> Result<usize, IoError> {
		transfer::recv_part(&mut &*self, buf, target)
	}

	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), SocketError> {
		super::set_nonblocking(self, nonblocking)
	}

	pub fn shutdown(&self, how: Shutdown) -> Result<(), SocketError> {
		let how = match how {
			Shutdown::Read => libc::SHUT_RD,
			Shutdown::Write => libc::SHUT_WR,
			Shutdown::ReadWrite => libc::SHUT_RDWR,
		};

		let result = unsafe { libc::shutdown(self.as_raw_fd(), how) };

		if result == -1 {
			Err(SocketError::SetOption { errno: errno(), option: "shutdown" })
		} else {
			Ok(())
		}
	}

	/// Returns the remote address of this connection.
	pub fn peer_addr(&self) -> Result<SocketAddr, SocketError> {
		peer_addr_of(self.as_raw_fd())
	}

	/// Returns the local address of this connection.
	pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
		local_addr_of(self.as_raw_fd())
	}

	pub fn close(self) -> Result<(), SocketError> {
		close_fd(self.fd)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
	Read,      // SHUT_RD
	Write,     // SHUT_WR
	ReadWrite, // SHUT_RDWR
}

impl Transport for &ConnectedStream {
	fn send_once(&mut self, buf: &[u8], flags: i32) -> Result<usize, IoError> {
		self.send_with_flags(buf, flags)
	}

	fn recv_once(&mut self, buf: &mut [u8], flags: i32) -> Result<usize, IoError> {
		self.recv_with_flags(buf, flags)
	}
}

impl Transport for ConnectedStream {
	fn send_once(&mut self, buf: &[u8], flags: i32) -> Result<usize, IoError> {
		self.send_with_flags(buf, flags)
	}

	fn recv_once(&mut self, buf: &mut [u8], flags: i32) -> Result<usize, IoError> {
		self.recv_with_flags(buf, flags)
	}
}

impl std::io::Read for ConnectedStream {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		Ok(self.recv(buf)?)
	}
}

impl std::io::Write for ConnectedStream {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		Ok(self.send(buf)?)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(()) // nothing buffered in userspace
	}
}

impl AsRawFd for ConnectedStream {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl AsFd for ConnectedStream {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl FromRawFd for ConnectedStream {
	unsafe fn from_raw_fd(fd: RawFd) -> Self {
		unsafe { Self::from_fd(OwnedFd::from_raw_fd(fd)) }
	}
}

impl IntoRawFd for ConnectedStream {
	fn into_raw_fd(self) -> RawFd {
		self.fd.into_raw_fd()
	}
}
