use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use crate::addr::ToSockAddr;

/// Converts to the raw sockaddr_in for syscalls.
fn v4_to_raw(addr: &SocketAddrV4) -> libc::sockaddr_in {
	let mut raw: libc::sockaddr_in = unsafe { std::mem::zeroed() };
	raw.sin_family = libc::AF_INET as libc::sa_family_t;
	raw.sin_port = addr.port().to_be();
	// octets are already in network order
	raw.sin_addr.s_addr = u32::from_ne_bytes(addr.ip().octets());
	raw
}

/// Converts to the raw sockaddr_in6 for syscalls.
fn v6_to_raw(addr: &SocketAddrV6) -> libc::sockaddr_in6 {
	let mut raw: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
	raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
	raw.sin6_port = addr.port().to_be();
	raw.sin6_flowinfo = addr.flowinfo();
	raw.sin6_addr.s6_addr = addr.ip().octets();
	raw.sin6_scope_id = addr.scope_id();
	raw
}

impl ToSockAddr for SocketAddr {
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		match self {
			SocketAddr::V4(v4) => {
				let raw = v4_to_raw(v4);
				let len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
				Some(f(&raw as *const _ as *const libc::sockaddr, len))
			}
			SocketAddr::V6(v6) => {
				let raw = v6_to_raw(v6);
				let len = std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t;
				Some(f(&raw as *const _ as *const libc::sockaddr, len))
			}
		}
	}
}

/// Reads an internet address out of a raw sockaddr.
///
/// Returns `None` for non-internet families or a truncated length.
///
/// # Safety
/// `addr` must point to at least `len` readable bytes.
pub(crate) unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<SocketAddr> {
	if addr.is_null() || (len as usize) < std::mem::size_of::<libc::sa_family_t>() {
		return None;
	}
	let family = unsafe { (*addr).sa_family } as libc::c_int;
	match family {
		libc::AF_INET if len as usize >= std::mem::size_of::<libc::sockaddr_in>() => {
			let raw = unsafe { &*(addr as *const libc::sockaddr_in) };
			let ip = Ipv4Addr::from(raw.sin_addr.s_addr.to_ne_bytes());
			Some(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(raw.sin_port))))
		}
		libc::AF_INET6 if len as usize >= std::mem::size_of::<libc::sockaddr_in6>() => {
			let raw = unsafe { &*(addr as *const libc::sockaddr_in6) };
			Some(SocketAddr::V6(SocketAddrV6::new(
				Ipv6Addr::from(raw.sin6_addr.s6_addr),
				u16::from_be(raw.sin6_port),
				raw.sin6_flowinfo,
				raw.sin6_scope_id,
			)))
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn round_trip(addr: SocketAddr) -> Option<SocketAddr> {
		addr.with_raw(|ptr, len| unsafe { from_sockaddr(ptr, len) }).flatten()
	}

	#[test]
	fn v4_port_is_network_order() {
		let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
		let raw = match addr {
			SocketAddr::V4(v4) => v4_to_raw(&v4),
			SocketAddr::V6(_) => unreachable!(),
		};
		assert_eq!(raw.sin_port.to_ne_bytes(), [0x1f, 0x90]);
		assert_eq!(raw.sin_addr.s_addr.to_ne_bytes(), [127, 0, 0, 1]);
		assert_eq!(round_trip(addr), Some(addr));
	}

	#[test]
	fn v6_keeps_scope() {
		let addr = SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::LOCALHOST, 9000, 0, 3));
		assert_eq!(round_trip(addr), Some(addr));
	}

	#[test]
	fn truncated_sockaddr_is_rejected() {
		let addr: SocketAddr = "10.0.0.1:1".parse().unwrap();
		let got = addr.with_raw(|ptr, _| unsafe { from_sockaddr(ptr, 4) }).flatten();
		assert_eq!(got, None);
	}
}
