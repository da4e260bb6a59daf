//! File upload supports.
//!
//! A selected file is first turned into a textual payload by a
//! [`FileEncoder`], then embedded into an ordinary user turn. Nothing is
//! appended to the transcript until the encoding succeeds.

use std::error::Error as StdError;
use std::path::Path;

/// A file turned into text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncodedFile {
    /// The file name shown to the service, without directories.
    pub name: String,
    /// A self-describing textual encoding of the full file content, such as
    /// a data URL.
    pub encoding: String,
}

/// Turns a user-selected file into a textual payload.
pub trait FileEncoder: Send + Sync {
    /// The error type returned when the file cannot be read or encoded.
    type Error: StdError + Send + Sync + 'static;

    /// Reads and encodes the file at `path`.
    ///
    /// This method must return a future that is fully independent of `self`.
    fn encode(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<EncodedFile, Self::Error>> + Send + 'static;
}

/// Builds the content of the user turn that carries an uploaded file.
#[inline]
pub fn file_turn_content(file: &EncodedFile) -> String {
    format!("File uploaded: {}\nContent: {}", file.name, file.encoding)
}
