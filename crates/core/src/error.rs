use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};

use parley_model::TransportError;

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The file could not be turned into a textual payload.
    Encoding,
    /// The transport failed to deliver the turn.
    Transport,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Encoding => write!(f, "Encoding error"),
            ErrorKind::Transport => write!(f, "Transport error"),
        }
    }
}

/// Describes a failed upload.
///
/// Blank input is never an error, it is silently ignored.
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
    source: Source,
}

enum Source {
    Encoding(Box<dyn StdError + Send + Sync + 'static>),
    Transport(Box<dyn TransportError>),
}

impl Error {
    /// Creates a new error with the `Encoding` kind.
    #[inline]
    pub fn encoding<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind: ErrorKind::Encoding,
            reason: None,
            source: Source::Encoding(Box::new(source)),
        }
    }

    /// Creates a new error with the `Transport` kind, keeping the original
    /// transport error as its source.
    #[inline]
    pub fn transport(source: Box<dyn TransportError>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            reason: None,
            source: Source::Transport(source),
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the transport's own error kind, for `Transport` errors.
    #[inline]
    pub fn transport_kind(&self) -> Option<parley_model::ErrorKind> {
        match &self.source {
            Source::Transport(err) => Some(err.kind()),
            Source::Encoding(_) => None,
        }
    }

    /// Returns the reason for the error.
    pub fn reason(&self) -> Cow<'_, str> {
        if let Some(reason) = self.reason.as_deref() {
            return Cow::Borrowed(reason);
        }
        let source: &dyn Display = match &self.source {
            Source::Encoding(err) => err,
            Source::Transport(err) => err,
        };
        Cow::Owned(format!("{}: {source}", self.kind))
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("reason", &self.reason)
            .field("source", &self.source_ref())
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

impl Error {
    fn source_ref(&self) -> &(dyn StdError + 'static) {
        match &self.source {
            Source::Encoding(err) => err.as_ref(),
            Source::Transport(err) => err.as_ref(),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source_ref())
    }
}
