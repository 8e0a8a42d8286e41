use std::ffi::CStr;

/// Address resolution failure reported by `getaddrinfo()`.
///
/// `code` is the raw `EAI_*` value. When it is `EAI_SYSTEM` the
/// underlying cause lives in `errno`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("getaddrinfo() failed: {}", gai_to_str(*.code, *.errno))]
pub struct ResolveError {
    pub code: i32,
    pub errno: i32,
}

/// Coarse classification of a [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    /// Host or service is unknown.
    NoName,
    /// Service is not available for the requested socket type.
    Service,
    /// Address family is not supported.
    Family,
    /// Socket type is not supported.
    SockType,
    /// Temporary failure, the query may succeed later.
    Again,
    /// Non-recoverable resolver failure.
    Fail,
    Memory,
    /// System error, see `ResolveError::errno`.
    System,
    Other(i32),
}

impl ResolveError {
    pub(crate) fn new(code: i32) -> Self {
        let errno = if code == libc::EAI_SYSTEM { errno() } else { 0 };
        Self { code, errno }
    }

    pub fn kind(&self) -> ResolveErrorKind {
        match self.code {
            libc::EAI_NONAME => ResolveErrorKind::NoName,
            libc::EAI_SERVICE => ResolveErrorKind::Service,
            libc::EAI_FAMILY => ResolveErrorKind::Family,
            libc::EAI_SOCKTYPE => ResolveErrorKind::SockType,
            libc::EAI_AGAIN => ResolveErrorKind::Again,
            libc::EAI_FAIL => ResolveErrorKind::Fail,
            libc::EAI_MEMORY => ResolveErrorKind::Memory,
            libc::EAI_SYSTEM => ResolveErrorKind::System,
            other => ResolveErrorKind::Other(other),
        }
    }
}

/// Socket creation/configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("socket() failed: {}", errno_to_str(*.errno))]
    Create { errno: i32 },

    #[error("bind({addr}) failed: {}", errno_to_str(*.errno))]
    Bind { errno: i32, addr: String },

    #[error("listen(backlog={backlog}) failed: {}", errno_to_str(*.errno))]
    Listen { errno: i32, backlog: i32 },

    #[error("connect({addr}) failed: {}", errno_to_str(*.errno))]
    Connect { errno: i32, addr: String },

    #[error("accept() failed: {}", errno_to_str(*.errno))]
    Accept { errno: i32 },

    #[error("close() failed: {}", errno_to_str(*.errno))]
    Close { errno: i32 },

    #[error("setsockopt({option}) failed: {}", errno_to_str(*.errno))]
    SetOption { errno: i32, option: &'static str },

    #[error("getsockopt({option}) failed: {}", errno_to_str(*.errno))]
    GetOption { errno: i32, option: &'static str },

    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Io(#[from] IoError),

    /// No candidate endpoint could be connected.
    #[error("could not connect to any of {attempts} candidate endpoint(s)")]
    ConnectFailed {
        attempts: usize,
        #[source]
        last: Option<Box<SocketError>>,
    },

    /// No candidate endpoint could be set up locally.
    #[error("could not set up any of {attempts} candidate endpoint(s)")]
    BindFailed {
        attempts: usize,
        #[source]
        last: Option<Box<SocketError>>,
    },
}

impl SocketError {
    /// Returns the errno behind this error, if one exists.
    pub fn errno(&self) -> Option<i32> {
        match self {
            SocketError::Create { errno }
            | SocketError::Bind { errno, .. }
            | SocketError::Listen { errno, .. }
            | SocketError::Connect { errno, .. }
            | SocketError::Accept { errno }
            | SocketError::Close { errno }
            | SocketError::SetOption { errno, .. }
            | SocketError::GetOption { errno, .. } => Some(*errno),
            SocketError::InvalidAddress { .. } => Some(libc::EINVAL),
            SocketError::Resolve(_) => None,
            SocketError::Io(IoError::Read { errno } | IoError::Write { errno }) => Some(*errno),
            SocketError::Io(_) => None,
            SocketError::ConnectFailed { last, .. } | SocketError::BindFailed { last, .. } => {
                last.as_ref().and_then(|err| err.errno())
            }
        }
    }
}

/// Transfer errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("recv() failed: {}", errno_to_str(*.errno))]
    Read { errno: i32 },

    #[error("send() failed: {}", errno_to_str(*.errno))]
    Write { errno: i32 },

    /// Peer performed an orderly shutdown before the transfer completed.
    ///
    /// `received` bytes at the front of the buffer are valid.
    #[error("connection closed by peer after {received} byte(s)")]
    Closed { received: usize },

    #[error("requested {requested} byte(s) but buffer holds {capacity}")]
    InvalidArgument { requested: usize, capacity: usize },

    #[error("operation would block")]
    WouldBlock,

    #[error("interrupted by signal")]
    Interrupted,
}

impl IoError {
    /// Classifies a failed `send()`/`recv()` by the current errno.
    pub(crate) fn from_errno(errno: i32, write: bool) -> Self {
        match errno {
            libc::EINTR => IoError::Interrupted,
            e if e == libc::EAGAIN || e == libc::EWOULDBLOCK => IoError::WouldBlock,
            _ if write => IoError::Write { errno },
            _ => IoError::Read { errno },
        }
    }
}

/// Returns current errno value.
#[inline]
pub fn errno() -> i32 {
    unsafe { *libc::__errno_location() }
}

/// Converts errno to human-readable string.
fn errno_to_str(errno: i32) -> String {
    match errno {
        libc::EACCES => "permission denied".into(),
        libc::EADDRINUSE => "address already in use".into(),
        libc::EADDRNOTAVAIL => "address not available".into(),
        libc::EAFNOSUPPORT => "address family not supported".into(),
        libc::EAGAIN => "resource temporarily unavailable".into(),
        libc::EBADF => "bad file descriptor".into(),
        libc::ECONNREFUSED => "connection refused".into(),
        libc::ECONNRESET => "connection reset by peer".into(),
        libc::EINTR => "interrupted by signal".into(),
        libc::EINVAL => "invalid argument".into(),
        libc::EMFILE => "too many open files".into(),
        libc::ENETUNREACH => "network unreachable".into(),
        libc::ENOTCONN => "not connected".into(),
        libc::EPIPE => "broken pipe".into(),
        libc::ETIMEDOUT => "connection timed out".into(),
        _ => format!("errno {}", errno),
    }
}

fn gai_to_str(code: i32, errno: i32) -> String {
    if code == libc::EAI_SYSTEM {
        return errno_to_str(errno);
    }
    let msg = unsafe { libc::gai_strerror(code) };
    if msg.is_null() {
        return format!("EAI {}", code);
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}

/// Maps errno to std::io::ErrorKind.
fn errno_to_kind(errno: i32) -> std::io::ErrorKind {
    match errno {
        libc::EACCES | libc::EPERM => std::io::ErrorKind::PermissionDenied,
        libc::EADDRINUSE => std::io::ErrorKind::AddrInUse,
        libc::EADDRNOTAVAIL => std::io::ErrorKind::AddrNotAvailable,
        libc::EAGAIN => std::io::ErrorKind::WouldBlock,
        libc::ECONNREFUSED => std::io::ErrorKind::ConnectionRefused,
        libc::ECONNRESET => std::io::ErrorKind::ConnectionReset,
        libc::EINTR => std::io::ErrorKind::Interrupted,
        libc::EINVAL => std::io::ErrorKind::InvalidInput,
        libc::ENOTCONN => std::io::ErrorKind::NotConnected,
        libc::EPIPE => std::io::ErrorKind::BrokenPipe,
        libc::ETIMEDOUT => std::io::ErrorKind::TimedOut,
        _ => std::io::ErrorKind::Other,
    }
}

impl From<ResolveError> for std::io::Error {
    fn from(err: ResolveError) -> Self {
        let kind = match err.kind() {
            ResolveErrorKind::System => errno_to_kind(err.errno),
            ResolveErrorKind::Again => std::io::ErrorKind::WouldBlock,
            ResolveErrorKind::Memory => std::io::ErrorKind::OutOfMemory,
            ResolveErrorKind::Family | ResolveErrorKind::SockType => std::io::ErrorKind::Unsupported,
            ResolveErrorKind::NoName | ResolveErrorKind::Service => std::io::ErrorKind::NotFound,
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

impl From<SocketError> for std::io::Error {
    fn from(err: SocketError) -> Self {
        let err = match err {
            SocketError::Resolve(inner) => return inner.into(),
            SocketError::Io(inner) => return inner.into(),
            other => other,
        };
        let kind = err.errno().map_or(std::io::ErrorKind::Other, errno_to_kind);
        std::io::Error::new(kind, err)
    }
}

impl From<IoError> for std::io::Error {
    fn from(err: IoError) -> Self {
        let kind = match &err {
            IoError::Read { errno } => errno_to_kind(*errno),
            IoError::Write { errno } => errno_to_kind(*errno),
            IoError::Closed { .. } => std::io::ErrorKind::UnexpectedEof,
            IoError::InvalidArgument { .. } => std::io::ErrorKind::InvalidInput,
            IoError::WouldBlock => std::io::ErrorKind::WouldBlock,
            IoError::Interrupted => std::io::ErrorKind::Interrupted,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_kind_and_message() {
        let err = ResolveError::new(libc::EAI_NONAME);
        assert_eq!(err.kind(), ResolveErrorKind::NoName);
        assert_eq!(err.errno, 0);
        assert!(err.to_string().starts_with("getaddrinfo() failed: "));

        let io: std::io::Error = err.into();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn exhausted_candidates_keep_last_errno() {
        let err = SocketError::BindFailed {
            attempts: 3,
            last: Some(Box::new(SocketError::Bind {
                errno: libc::EADDRINUSE,
                addr: "127.0.0.1:80".into(),
            })),
        };
        assert_eq!(err.errno(), Some(libc::EADDRINUSE));

        let io: std::io::Error = err.into();
        assert_eq!(io.kind(), std::io::ErrorKind::AddrInUse);
    }

    #[test]
    fn closed_maps_to_unexpected_eof() {
        let io: std::io::Error = IoError::Closed { received: 3 }.into();
        assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
        assert_eq!(
            IoError::Closed { received: 3 }.to_string(),
            "connection closed by peer after 3 byte(s)"
        );
    }

    #[test]
    fn errno_classification() {
        assert!(matches!(IoError::from_errno(libc::EINTR, true), IoError::Interrupted));
        assert!(matches!(IoError::from_errno(libc::EAGAIN, false), IoError::WouldBlock));
        assert!(matches!(
            IoError::from_errno(libc::EPIPE, true),
            IoError::Write { errno } if errno == libc::EPIPE
        ));
        assert!(matches!(
            IoError::from_errno(libc::ECONNRESET, false),
            IoError::Read { errno } if errno == libc::ECONNRESET
        ));
    }
}
