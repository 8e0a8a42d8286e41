//! Address resolution and raw socket addresses.
//!
//! - `resolve` turns host/port strings into an ordered list of [`Endpoint`]s
//! - `Endpoint` is one attemptable family/type/protocol/sockaddr tuple
//! - `ToSockAddr` lends a raw `sockaddr` pointer to a syscall

mod endpoint;
mod inet;
mod resolve;

pub use self::endpoint::Endpoint;
pub use self::resolve::{ResolveFlags, resolve, resolve_datagram, resolve_stream};
pub(crate) use self::inet::from_sockaddr;

/// Trait for address types that can be converted to raw sockaddr for syscalls.
pub trait ToSockAddr {
	/// Calls the provided closure with a pointer to the raw sockaddr and its size.
	/// Returns None if the address cannot be expressed as a sockaddr.
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R;
}

impl<A: ToSockAddr + ?Sized> ToSockAddr for &A {
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		(**self).with_raw(f)
	}
}
