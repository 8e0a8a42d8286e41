use std::os::fd::AsRawFd;
use crate::error::{SocketError, errno};

fn set_int_option<S: AsRawFd>(
	socket: &S,
	level: libc::c_int,
	name: libc::c_int,
	value: libc::c_int,
	option: &'static str,
) -> Result<(), SocketError> {
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			level,
			name,
			&value as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::c_int>() as libc::socklen_t,
		)
	};
	if result == -1 {
		Err(SocketError::SetOption { errno: errno(), option })
	} else {
		Ok(())
	}
}

fn get_int_option<S: AsRawFd>(
	socket: &S,
	level: libc::c_int,
	name: libc::c_int,
	option: &'static str,
) -> Result<libc::c_int, SocketError> {
	let mut value: libc::c_int = 0;
	let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
	let result = unsafe {
		libc::getsockopt(
			socket.as_raw_fd(),
			level,
			name,
			&mut value as *mut _ as *mut libc::c_void,
			&mut len,
		)
	};
	if result == -1 {
		Err(SocketError::GetOption { errno: errno(), option })
	} else {
		Ok(value)
	}
}

/// Sets SO_REUSEADDR on a socket.
///
/// Allows binding to an address that's in TIME_WAIT state.
/// Essential for server restarts.
pub fn set_reuse_addr<S: AsRawFd>(socket: &S, enable: bool) -> Result<(), SocketError> {
	set_int_option(socket, libc::SOL_SOCKET, libc::SO_REUSEADDR, enable as libc::c_int, "SO_REUSEADDR")
}

/// Sets SO_REUSEPORT on a socket.
///
/// Allows multiple sockets to bind the same port.
pub fn set_reuse_port<S: AsRawFd>(socket: &S, enable: bool) -> Result<(), SocketError> {
	set_int_option(socket, libc::SOL_SOCKET, libc::SO_REUSEPORT, enable as libc::c_int, "SO_REUSEPORT")
}

/// Sets TCP_NODELAY on a socket.
///
/// Disables Nagle's algorithm, small writes go out immediately.
pub fn set_tcp_nodelay<S: AsRawFd>(socket: &S, enable: bool) -> Result<(), SocketError> {
	set_int_option(socket, libc::IPPROTO_TCP, libc::TCP_NODELAY, enable as libc::c_int, "TCP_NODELAY")
}

/// Sets receive buffer size (SO_RCVBUF).
///
/// Kernel typically doubles this value internally.
pub fn set_recv_buffer_size<S: AsRawFd>(socket: &S, size: usize) -> Result<(), SocketError> {
	set_int_option(socket, libc::SOL_SOCKET, libc::SO_RCVBUF, size as libc::c_int, "SO_RCVBUF")
}

/// Sets send buffer size (SO_SNDBUF).
pub fn set_send_buffer_size<S: AsRawFd>(socket: &S, size: usize) -> Result<(), SocketError> {
	set_int_option(socket, libc::SOL_SOCKET, libc::SO_SNDBUF, size as libc::c_int, "SO_SNDBUF")
}

/// Returns the effective receive buffer size.
pub fn recv_buffer_size<S: AsRawFd>(socket: &S) -> Result<usize, SocketError> {
	get_int_option(socket, libc::SOL_SOCKET, libc::SO_RCVBUF, "SO_RCVBUF").map(|v| v as usize)
}

/// Returns the effective send buffer size.
pub fn send_buffer_size<S: AsRawFd>(socket: &S) -> Result<usize, SocketError> {
	get_int_option(socket, libc::SOL_SOCKET, libc::SO_SNDBUF, "SO_SNDBUF").map(|v| v as usize)
}

/// Sets or clears `O_NONBLOCK`.
///
/// The transfer loops surface `WouldBlock` on a non-blocking socket
/// instead of waiting.
pub fn set_nonblocking<S: AsRawFd>(socket: &S, nonblocking: bool) -> Result<(), SocketError> {
	let flags = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_GETFL) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFL" });
	}
	let new_flags = if nonblocking {
		flags | libc::O_NONBLOCK
	} else {
		flags & !libc::O_NONBLOCK
	};
	let result = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_SETFL, new_flags) };
	if result == -1 {
		return Err(SocketError::SetOption { errno: errno(), option: "O_NONBLOCK" });
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::os::unix::net::UnixDatagram;

	#[test]
	fn recv_buffer_round_trip() {
		let (a, _b) = UnixDatagram::pair().unwrap();
		set_recv_buffer_size(&a, 64 * 1024).unwrap();
		// Linux doubles the requested value
		assert!(recv_buffer_size(&a).unwrap() >= 64 * 1024);
	}

	#[test]
	fn nonblocking_toggles_flag() {
		let (a, _b) = UnixDatagram::pair().unwrap();
		set_nonblocking(&a, true).unwrap();
		let flags = unsafe { libc::fcntl(a.as_raw_fd(), libc::F_GETFL) };
		assert_ne!(flags & libc::O_NONBLOCK, 0);
		set_nonblocking(&a, false).unwrap();
		let flags = unsafe { libc::fcntl(a.as_raw_fd(), libc::F_GETFL) };
		assert_eq!(flags & libc::O_NONBLOCK, 0);
	}

	#[test]
	fn tcp_option_on_unix_socket_fails() {
		let (a, _b) = UnixDatagram::pair().unwrap();
		let err = set_tcp_nodelay(&a, true).unwrap_err();
		assert!(matches!(err, SocketError::SetOption { option: "TCP_NODELAY", .. }));
	}
}
