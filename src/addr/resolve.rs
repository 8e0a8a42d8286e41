use std::ffi::CString;
use crate::addr::Endpoint;
use crate::error::{ResolveError, SocketError};
use crate::socket::SockKind;

bitflags::bitflags! {
	/// `getaddrinfo()` hint flags. `ResolveFlags::empty()` is the automatic default.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct ResolveFlags: libc::c_int {
		/// Resolve a local bind address when no host is given.
		const PASSIVE = libc::AI_PASSIVE;
		const NUMERIC_HOST = libc::AI_NUMERICHOST;
		const NUMERIC_SERV = libc::AI_NUMERICSERV;
		const ADDR_CONFIG = libc::AI_ADDRCONFIG;
		const V4_MAPPED = libc::AI_V4MAPPED;
		const ALL = libc::AI_ALL;
	}
}

/// Owns a `getaddrinfo()` result list and frees it once.
struct AddrInfoList(*mut libc::addrinfo);

impl AddrInfoList {
	fn endpoints(&self) -> Vec<Endpoint> {
		let mut out = Vec::new();
		let mut cur = self.0;
		while !cur.is_null() {
			let ai = unsafe { &*cur };
			if let Some(ep) = unsafe { Endpoint::from_addrinfo(ai) } {
				out.push(ep);
			}
			cur = ai.ai_next;
		}
		out
	}
}

impl Drop for AddrInfoList {
	fn drop(&mut self) {
		if !self.0.is_null() {
			unsafe { libc::freeaddrinfo(self.0) };
		}
	}
}

/// Resolves `host`/`port` into candidate endpoints, in resolver order.
///
/// `host = None` together with [`ResolveFlags::PASSIVE`] asks for a local
/// bind address. `SockKind::Unspecified` lets the resolver mix socket types.
/// Callers must try the returned endpoints in order.
pub fn resolve(
	host: Option<&str>,
	port: &str,
	kind: SockKind,
	flags: ResolveFlags,
) -> Result<Vec<Endpoint>, SocketError> {
	let c_host = host
		.map(CString::new)
		.transpose()
		.map_err(|_| SocketError::InvalidAddress { reason: "host contains a NUL byte" })?;
	let c_port = CString::new(port)
		.map_err(|_| SocketError::InvalidAddress { reason: "port contains a NUL byte" })?;

	let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
	hints.ai_family = libc::AF_UNSPEC;
	hints.ai_socktype = kind.raw();
	hints.ai_flags = flags.bits();

	let mut res: *mut libc::addrinfo = std::ptr::null_mut();
	let status = unsafe {
		libc::getaddrinfo(
			c_host.as_ref().map_or(std::ptr::null(), |h| h.as_ptr()),
			c_port.as_ptr(),
			&hints,
			&mut res,
		)
	};
	let list = AddrInfoList(res);

	if status != 0 {
		let err = ResolveError::new(status);
		tracing::warn!(host = ?host, port, error = %err, "address resolution failed");
		return Err(err.into());
	}

	let endpoints = list.endpoints();
	tracing::trace!(host = ?host, port, count = endpoints.len(), "resolved candidates");
	Ok(endpoints)
}

/// [`resolve`] fixed to stream sockets.
pub fn resolve_stream(host: Option<&str>, port: &str, flags: ResolveFlags) -> Result<Vec<Endpoint>, SocketError> {
	resolve(host, port, SockKind::Stream, flags)
}

/// [`resolve`] fixed to datagram sockets.
pub fn resolve_datagram(host: Option<&str>, port: &str, flags: ResolveFlags) -> Result<Vec<Endpoint>, SocketError> {
	resolve(host, port, SockKind::Datagram, flags)
}
