use std::fmt;

use crate::model::ImagePosition;

#[derive(Debug)]
pub enum Error {
    Validation(ValidationError),
    ImageDecode {
        position: ImagePosition,
        reason: String,
    },
    Render {
        block: BlockKind,
        reason: String,
    },
    Io(std::io::Error),
    InvalidManifest(String),
}

/// Input rejected before any rendering starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingAddress,
    MissingBuildingCode,
    MissingSignature,
    EmptyDescription { observation: usize },
    TooManyPhotos { observation: usize, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    MainPhoto,
    Observation(usize),
    Signature,
    Document,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingAddress => write!(f, "the visit address is required"),
            ValidationError::MissingBuildingCode => write!(f, "the building code is required"),
            ValidationError::MissingSignature => {
                write!(f, "missing signature: the report must be signed")
            }
            ValidationError::EmptyDescription { observation } => {
                write!(f, "observation {} has no description", observation + 1)
            }
            ValidationError::TooManyPhotos { observation, count } => write!(
                f,
                "observation {} has {count} photos (maximum {})",
                observation + 1,
                crate::model::MAX_PHOTOS_PER_OBSERVATION
            ),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::MainPhoto => write!(f, "main photo"),
            BlockKind::Observation(idx) => write!(f, "observation {}", idx + 1),
            BlockKind::Signature => write!(f, "signature block"),
            BlockKind::Document => write!(f, "document assembly"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "invalid report input: {e}"),
            Error::ImageDecode { position, reason } => {
                write!(f, "cannot read image ({position}): {reason}")
            }
            Error::Render { block, reason } => write!(f, "failed to render {block}: {reason}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidManifest(msg) => write!(f, "invalid manifest: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}
