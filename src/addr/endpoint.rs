use std::fmt;
use std::net::SocketAddr;
use crate::addr::{ToSockAddr, from_sockaddr};
use crate::socket::SockKind;

/// One resolved, attemptable network address.
///
/// Holds everything `socket()` and `bind()`/`connect()`/`sendto()` need:
/// family, socket type, protocol and the raw sockaddr bytes.
#[derive(Clone)]
pub struct Endpoint {
	family: libc::c_int,
	socktype: libc::c_int,
	protocol: libc::c_int,
	storage: libc::sockaddr_storage,
	len: libc::socklen_t,
}

impl Endpoint {
	/// Builds an endpoint for a known internet address.
	///
	/// Protocol is left at 0 so the kernel picks the default for the type.
	pub fn from_socket_addr(addr: SocketAddr, kind: SockKind) -> Self {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let len = addr
			.with_raw(|ptr, len| {
				unsafe {
					std::ptr::copy_nonoverlapping(
						ptr as *const u8,
						&mut storage as *mut _ as *mut u8,
						len as usize,
					);
				}
				len
			})
			.unwrap_or(0);
		let family = match addr {
			SocketAddr::V4(_) => libc::AF_INET,
			SocketAddr::V6(_) => libc::AF_INET6,
		};
		Self { family, socktype: kind.raw(), protocol: 0, storage, len }
	}

	/// Copies one `getaddrinfo()` result.
	///
	/// # Safety
	/// `ai.ai_addr` must be null or point to `ai.ai_addrlen` readable bytes.
	pub(crate) unsafe fn from_addrinfo(ai: &libc::addrinfo) -> Option<Self> {
		let size = ai.ai_addrlen as usize;
		if ai.ai_addr.is_null() || size > std::mem::size_of::<libc::sockaddr_storage>() {
			return None;
		}
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		unsafe {
			std::ptr::copy_nonoverlapping(
				ai.ai_addr as *const u8,
				&mut storage as *mut _ as *mut u8,
				size,
			);
		}
		Some(Self {
			family: ai.ai_family,
			socktype: ai.ai_socktype,
			protocol: ai.ai_protocol,
			storage,
			len: ai.ai_addrlen,
		})
	}

	/// Address family (`AF_INET`, `AF_INET6`, ...).
	#[inline]
	pub fn family(&self) -> libc::c_int {
		self.family
	}

	/// Raw socket type (`SOCK_STREAM`, `SOCK_DGRAM`, ...).
	#[inline]
	pub fn socktype(&self) -> libc::c_int {
		self.socktype
	}

	#[inline]
	pub fn protocol(&self) -> libc::c_int {
		self.protocol
	}

	pub fn kind(&self) -> SockKind {
		SockKind::from_raw(self.socktype)
	}

	/// Returns the address as a std socket address, if it is an internet one.
	pub fn socket_addr(&self) -> Option<SocketAddr> {
		unsafe { from_sockaddr(&self.storage as *const _ as *const libc::sockaddr, self.len) }
	}
}

impl ToSockAddr for Endpoint {
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		if self.len == 0 {
			return None;
		}
		Some(f(&self.storage as *const _ as *const libc::sockaddr, self.len))
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.socket_addr() {
			Some(addr) => write!(f, "{}", addr),
			None => write!(f, "<family {}>", self.family),
		}
	}
}

impl fmt::Debug for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Endpoint")
			.field("family", &self.family)
			.field("socktype", &self.socktype)
			.field("protocol", &self.protocol)
			.field("addr", &self.socket_addr())
			.finish()
	}
}

impl PartialEq for Endpoint {
	fn eq(&self, other: &Self) -> bool {
		self.family == other.family
			&& self.socktype == other.socktype
			&& self.protocol == other.protocol
			&& self.socket_addr() == other.socket_addr()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn from_socket_addr_keeps_metadata() {
		let addr: SocketAddr = "[::1]:5353".parse().unwrap();
		let ep = Endpoint::from_socket_addr(addr, SockKind::Datagram);
		assert_eq!(ep.family(), libc::AF_INET6);
		assert_eq!(ep.socktype(), libc::SOCK_DGRAM);
		assert_eq!(ep.kind(), SockKind::Datagram);
		assert_eq!(ep.protocol(), 0);
		assert_eq!(ep.socket_addr(), Some(addr));
		assert_eq!(ep.to_string(), "[::1]:5353");
	}

	#[test]
	fn raw_length_matches_family() {
		let ep = Endpoint::from_socket_addr("127.0.0.1:1".parse().unwrap(), SockKind::Stream);
		let len = ep.with_raw(|_, len| len).unwrap();
		assert_eq!(len as usize, std::mem::size_of::<libc::sockaddr_in>());
	}
}
