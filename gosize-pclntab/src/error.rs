use thiserror::Error;

/// The kind of a [`FormatError`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatErrorKind {
    /// The buffer does not start with a valid pclntab header.
    ///
    /// Either the magic word, the PC quantum or the pointer width byte is
    /// not one of the accepted values.
    #[error("unrecognized pclntab header")]
    UnrecognizedFormat,
    /// The header is valid but the table data is structurally broken.
    ///
    /// Bounds violations, truncated varints and impossible counts all map
    /// to this kind.
    #[error("malformed pclntab")]
    Malformed,
    /// The magic belongs to a later format generation than this crate decodes.
    #[error("unsupported pclntab version")]
    UnsupportedVersion,
    /// The requested file is not present in the file table.
    #[error("unknown file")]
    UnknownFile,
    /// No instruction maps to the requested line.
    #[error("unknown line")]
    UnknownLine,
}

/// An error produced while decoding a pclntab.
///
/// The [`kind`](Self::kind) is the stable part callers can match on; some
/// errors additionally carry the detail that triggered them (an invalid
/// string, the file and line of a failed lookup) as their source.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct FormatError {
    kind: FormatErrorKind,
    #[source]
    detail: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl FormatError {
    /// Attaches a detail payload to an error kind.
    pub(crate) fn with_detail(
        kind: FormatErrorKind,
        detail: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        FormatError {
            kind,
            detail: Some(detail.into()),
        }
    }

    /// The kind of failure, independent of any payload.
    pub fn kind(&self) -> FormatErrorKind {
        self.kind
    }
}

impl From<FormatErrorKind> for FormatError {
    fn from(kind: FormatErrorKind) -> Self {
        FormatError { kind, detail: None }
    }
}
