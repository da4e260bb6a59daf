use std::fmt::{self, Display};

/// The kind of error that occurred while talking to the chat service.
///
/// The session engine treats every kind the same way. Kinds only exist so
/// that callers can log or surface failures more precisely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The service answered with a non-success status.
    Status,
    /// The request could not reach the service.
    Network,
    /// The request did not complete in time.
    Timeout,
    /// The service answered, but the payload could not be understood.
    MalformedResponse,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Status => write!(f, "Unsuccessful status"),
            ErrorKind::Network => write!(f, "Network error"),
            ErrorKind::Timeout => write!(f, "Timed out"),
            ErrorKind::MalformedResponse => write!(f, "Malformed response"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
