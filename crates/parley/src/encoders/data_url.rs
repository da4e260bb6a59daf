use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use parley_core::upload::{EncodedFile, FileEncoder};

/// Document types accepted by the upload picker.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "csv", "xlsx", "doc", "docx"];

/// The kind of error that occurred while encoding a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncodeErrorKind {
    /// The path does not name a file.
    InvalidPath,
    /// The file type is not accepted by this encoder.
    Unsupported,
    /// The file could not be read.
    Read,
}

impl Display for EncodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeErrorKind::InvalidPath => write!(f, "Invalid path"),
            EncodeErrorKind::Unsupported => write!(f, "Unsupported file type"),
            EncodeErrorKind::Read => write!(f, "Error reading file"),
        }
    }
}

/// Describes a file encoding error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncodeError {
    kind: EncodeErrorKind,
    reason: Option<String>,
}

impl EncodeError {
    #[inline]
    fn new(kind: EncodeErrorKind) -> Self {
        Self { kind, reason: None }
    }

    #[inline]
    fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> EncodeErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Owned(format!("{}: {reason}", self.kind)),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

impl StdError for EncodeError {}

/// Encodes files as base64 data URLs (`data:<mime>;base64,<payload>`).
#[derive(Clone, Debug, Default)]
pub struct DataUrlEncoder {
    allowed_extensions: Option<Vec<String>>,
}

impl DataUrlEncoder {
    /// Creates an encoder that accepts any file.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the encoder to the given extensions, compared
    /// case-insensitively and without the leading dot.
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self.allowed_extensions = Some(extensions);
        self
    }

    /// Creates an encoder that only accepts common document types.
    #[inline]
    pub fn documents() -> Self {
        Self::new().with_allowed_extensions(DOCUMENT_EXTENSIONS)
    }

    fn check_extension(&self, path: &Path) -> Result<(), EncodeError> {
        let Some(allowed) = &self.allowed_extensions else {
            return Ok(());
        };
        let ext = extension_of(path);
        if allowed.iter().any(|a| *a == ext) {
            return Ok(());
        }
        Err(EncodeError::new(EncodeErrorKind::Unsupported)
            .with_reason(format!("`.{ext}` is not one of {}", allowed.join(", "))))
    }
}

impl FileEncoder for DataUrlEncoder {
    type Error = EncodeError;

    fn encode(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<EncodedFile, Self::Error>> + Send + 'static
    {
        let checked = self.check_extension(path).and_then(|_| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    EncodeError::new(EncodeErrorKind::InvalidPath)
                        .with_reason(path.display().to_string())
                })?;
            Ok((name, path.to_owned()))
        });

        async move {
            let (name, path) = checked?;
            let bytes = tokio::fs::read(&path).await.map_err(|err| {
                EncodeError::new(EncodeErrorKind::Read)
                    .with_reason(err.to_string())
            })?;
            let mime_type = guess_mime_type(&path);
            trace!("encoding {name} as {mime_type}");
            Ok(EncodedFile {
                name,
                encoding: format!(
                    "data:{mime_type};base64,{}",
                    BASE64_STANDARD.encode(&bytes)
                ),
            })
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

fn guess_mime_type(path: &Path) -> &'static str {
    match extension_of(path).as_str() {
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        "xls" => "application/vnd.ms-excel",
        "xlsx" => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        }
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
