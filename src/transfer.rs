//! Blocking full-buffer transfers over a stream.
//!
//! A single `send()`/`recv()` may move fewer bytes than asked for. The
//! loops here repeat the call until the buffer is done, the primitive
//! reports an error, or the peer shuts down.
//!
//! There is no timeout. Configure one on the descriptor (`SO_RCVTIMEO`,
//! `SO_SNDTIMEO`) before calling if you need a bound; the loop then
//! surfaces `WouldBlock` when it expires.

use std::os::fd::{AsRawFd, BorrowedFd};
use crate::error::{IoError, errno};

/// One-shot, possibly partial, send and receive.
///
/// `recv_once` returning `Ok(0)` for a non-empty buffer means orderly
/// shutdown by the peer.
pub trait Transport {
	fn send_once(&mut self, buf: &[u8], flags: i32) -> Result<usize, IoError>;

	fn recv_once(&mut self, buf: &mut [u8], flags: i32) -> Result<usize, IoError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
	fn send_once(&mut self, buf: &[u8], flags: i32) -> Result<usize, IoError> {
		(**self).send_once(buf, flags)
	}

	fn recv_once(&mut self, buf: &mut [u8], flags: i32) -> Result<usize, IoError> {
		(**self).recv_once(buf, flags)
	}
}

/// [`Transport`] over any borrowed stream descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FdTransport<'fd> {
	fd: BorrowedFd<'fd>,
}

impl<'fd> FdTransport<'fd> {
	pub fn new(fd: BorrowedFd<'fd>) -> Self {
		Self { fd }
	}
}

impl Transport for FdTransport<'_> {
	fn send_once(&mut self, buf: &[u8], flags: i32) -> Result<usize, IoError> {
		let n = unsafe {
			libc::send(
				self.fd.as_raw_fd(),
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

	fn recv_once(&mut self, buf: &mut [u8], flags: i32) -> Result<usize, IoError> {
		let n = unsafe {
			libc::recv(
				self.fd.as_raw_fd(),
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
}

/// Sends all of `buf`, returning `buf.len()`.
///
/// Stops at the first error from the underlying send. An empty buffer
/// completes without any call.
pub fn send_all<T: Transport + ?Sized>(transport: &mut T, buf: &[u8]) -> Result<usize, IoError> {
	send_all_with_flags(transport, buf, 0)
}

pub fn send_all_with_flags<T: Transport + ?Sized>(
	transport: &mut T,
	buf: &[u8],
	flags: i32,
) -> Result<usize, IoError> {
	let mut sent = 0;
	while sent < buf.len() {
		let n = transport.send_once(&buf[sent..], flags)?;
		if n == 0 {
			// a zero-byte send for a non-empty slice would loop forever
			return Err(IoError::Write { errno: libc::EPIPE });
		}
		sent += n;
		tracing::trace!(n, sent, total = buf.len(), "partial send");
	}
	Ok(sent)
}

/// Fills `buf` completely, returning `buf.len()`.
///
/// If the peer shuts down first this returns [`IoError::Closed`] with the
/// number of bytes that did arrive; a short fill is never reported as
/// success.
pub fn recv_all<T: Transport + ?Sized>(transport: &mut T, buf: &mut [u8]) -> Result<usize, IoError> {
	recv_all_with_flags(transport, buf, 0)
}

pub fn recv_all_with_flags<T: Transport + ?Sized>(
	transport: &mut T,
	buf: &mut [u8],
	flags: i32,
) -> Result<usize, IoError> {
	let len = buf.len();
	recv_until(transport, buf, len, flags)
}

/// Receives into `buf` until at least `target` bytes have arrived.
///
/// Each call may read up to the full remaining capacity, so the result can
/// exceed `target`. Fails with [`IoError::InvalidArgument`] before any I/O
/// when `target > buf.len()`.
pub fn recv_part<T: Transport + ?Sized>(
	transport: &mut T,
	buf: &mut [u8],
	target: usize,
) -> Result<usize, IoError> {
	recv_part_with_flags(transport, buf, target, 0)
}

pub fn recv_part_with_flags<T: Transport + ?Sized>(
	transport: &mut T,
	buf: &mut [u8],
	target: usize,
	flags: i32,
) -> Result<usize, IoError> {
	if target > buf.len() {
		return Err(IoError::InvalidArgument { requested: target, capacity: buf.len() });
	}
	recv_until(transport, buf, target, flags)
}

fn recv_until<T: Transport + ?Sized>(
	transport: &mut T,
	buf: &mut [u8],
	target: usize,
	flags: i32,
) -> Result<usize, IoError> {
	let mut received = 0;
	while received < target {
		let n = transport.recv_once(&mut buf[received..], flags)?;
		if n == 0 {
			tracing::debug!(received, target, "peer closed mid-transfer");
			return Err(IoError::Closed { received });
		}
		received += n;
		tracing::trace!(n, received, target, "partial recv");
	}
	Ok(received)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque;

	/// Accepts at most `chunk` bytes per call and scripts the receive side.
	struct Script {
		chunk: usize,
		sent: Vec<u8>,
		incoming: VecDeque<Result<Vec<u8>, IoError>>,
		calls: usize,
	}

	impl Script {
		fn new(chunk: usize) -> Self {
			Self { chunk, sent: Vec::new(), incoming: VecDeque::new(), calls: 0 }
		}

		fn feed(mut self, data: &[u8]) -> Self {
			self.incoming.push_back(Ok(data.to_vec()));
			self
		}

		fn fail(mut self, err: IoError) -> Self {
			self.incoming.push_back(Err(err));
			self
		}
	}

	impl Transport for Script {
		fn send_once(&mut self, buf: &[u8], _flags: i32) -> Result<usize, IoError> {
			self.calls += 1;
			let n = buf.len().min(self.chunk);
			self.sent.extend_from_slice(&buf[..n]);
			Ok(n)
		}

		fn recv_once(&mut self, buf: &mut [u8], _flags: i32) -> Result<usize, IoError> {
			self.calls += 1;
			match self.incoming.pop_front() {
				None => Ok(0),
				Some(Err(err)) => Err(err),
				Some(Ok(mut data)) => {
					let n = data.len().min(buf.len()).min(self.chunk);
					buf[..n].copy_from_slice(&data[..n]);
					if n < data.len() {
						self.incoming.push_front(Ok(data.split_off(n)));
					}
					Ok(n)
				}
			}
		}
	}

	#[test]
	fn send_all_survives_one_byte_sends() {
		let mut t = Script::new(1);
		let payload = b"hello, world";
		assert_eq!(send_all(&mut t, payload).unwrap(), payload.len());
		assert_eq!(t.sent, payload);
		assert_eq!(t.calls, payload.len());
	}

	#[test]
	fn send_all_empty_makes_no_call() {
		let mut t = Script::new(1);
		assert_eq!(send_all(&mut t, &[]).unwrap(), 0);
		assert_eq!(t.calls, 0);
	}

	#[test]
	fn send_all_stops_on_first_error() {
		struct Broken(usize);
		impl Transport for Broken {
			fn send_once(&mut self, _buf: &[u8], _flags: i32) -> Result<usize, IoError> {
				self.0 += 1;
				if self.0 == 1 { Ok(2) } else { Err(IoError::Write { errno: libc::EPIPE }) }
			}
			fn recv_once(&mut self, _buf: &mut [u8], _flags: i32) -> Result<usize, IoError> {
				unreachable!()
			}
		}

		let mut t = Broken(0);
		let err = send_all(&mut t, &[0; 8]).unwrap_err();
		assert!(matches!(err, IoError::Write { errno } if errno == libc::EPIPE));
		assert_eq!(t.0, 2);
	}

	#[test]
	fn recv_all_reassembles_fragments() {
		let mut t = Script::new(3).feed(b"abcdefgh");
		let mut buf = [0u8; 8];
		assert_eq!(recv_all(&mut t, &mut buf).unwrap(), 8);
		assert_eq!(&buf, b"abcdefgh");
	}

	#[test]
	fn recv_all_reports_early_close() {
		let mut t = Script::new(64).feed(b"abc");
		let mut buf = [0u8; 8];
		let err = recv_all(&mut t, &mut buf).unwrap_err();
		assert!(matches!(err, IoError::Closed { received: 3 }));
		assert_eq!(&buf[..3], b"abc");
	}

	#[test]
	fn recv_all_surfaces_errors() {
		let mut t = Script::new(64).feed(b"ab").fail(IoError::Read { errno: libc::ECONNRESET });
		let mut buf = [0u8; 8];
		let err = recv_all(&mut t, &mut buf).unwrap_err();
		assert!(matches!(err, IoError::Read { errno } if errno == libc::ECONNRESET));
	}

	#[test]
	fn recv_part_returns_at_threshold() {
		// the remaining bytes are never queued: reading past 4 would see a close
		let mut t = Script::new(2).feed(b"abcd");
		let mut buf = [0u8; 8];
		assert_eq!(recv_part(&mut t, &mut buf, 4).unwrap(), 4);
		assert_eq!(&buf[..4], b"abcd");
		assert_eq!(t.calls, 2);
	}

	#[test]
	fn recv_part_may_overshoot_target() {
		let mut t = Script::new(64).feed(b"abcdef");
		let mut buf = [0u8; 8];
		assert_eq!(recv_part(&mut t, &mut buf, 4).unwrap(), 6);
	}

	#[test]
	fn recv_part_rejects_oversized_target_without_io() {
		let mut t = Script::new(64).feed(b"abcdefgh");
		let mut buf = [0u8; 4];
		let err = recv_part(&mut t, &mut buf, 8).unwrap_err();
		assert!(matches!(err, IoError::InvalidArgument { requested: 8, capacity: 4 }));
		assert_eq!(t.calls, 0);
	}

	#[test]
	fn recv_part_zero_target_is_immediate() {
		let mut t = Script::new(64);
		let mut buf = [0u8; 4];
		assert_eq!(recv_part(&mut t, &mut buf, 0).unwrap(), 0);
		assert_eq!(t.calls, 0);
	}
}
