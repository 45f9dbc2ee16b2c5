//! Upload session state and file intake.

use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use image::DynamicImage;

use crate::{
    error::{DetectionFailure, INIT_ERROR_MESSAGE, UPLOAD_ERROR_MESSAGE, UploadError},
    landmarks::DetectedFace,
    overlay::OverlayCanvas,
    symmetry::SymmetryScore,
};
use facesym_utils::guess_media_type;

/// Monotonic id of one upload cycle. Results tagged with an older generation are discarded.
pub type Generation = u64;

/// Shared flag telling in-flight work of a superseded generation to stop early.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A file handed over by the file picker or a drag-and-drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Media type reported by the picker. Sniffed from the content when absent.
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            bytes,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Read a file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// Reported media type, or the one sniffed from the leading bytes.
    pub fn resolved_media_type(&self) -> Option<String> {
        self.media_type
            .clone()
            .or_else(|| guess_media_type(&self.bytes).map(str::to_owned))
    }

    /// Reject empty files and anything that is not an image.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::Empty {
                name: self.name.clone(),
            });
        }
        match self.resolved_media_type() {
            Some(media_type) if media_type.starts_with("image/") => Ok(()),
            other => Err(UploadError::UnsupportedMediaType {
                name: self.name.clone(),
                media_type: other.unwrap_or_else(|| "unknown".to_string()),
            }),
        }
    }
}

/// Every state the analyzer can be in. Score and error can never both be present.
#[derive(Debug, Clone)]
pub enum SessionState {
    ModelsLoading,
    InitFailed {
        message: &'static str,
    },
    Idle,
    Decoding {
        generation: Generation,
        source: String,
    },
    Detecting {
        generation: Generation,
        image: Arc<DynamicImage>,
    },
    Detected {
        generation: Generation,
        image: Arc<DynamicImage>,
        faces: Vec<DetectedFace>,
        score: SymmetryScore,
        canvas: OverlayCanvas,
    },
    DetectionFailed {
        generation: Generation,
        image: Option<Arc<DynamicImage>>,
        failure: DetectionFailure,
    },
    UploadFailed {
        message: &'static str,
    },
}

impl SessionState {
    pub(crate) fn init_failed() -> Self {
        SessionState::InitFailed {
            message: INIT_ERROR_MESSAGE,
        }
    }

    pub(crate) fn upload_failed() -> Self {
        SessionState::UploadFailed {
            message: UPLOAD_ERROR_MESSAGE,
        }
    }

    /// Models finished loading successfully.
    pub fn is_ready(&self) -> bool {
        !matches!(
            self,
            SessionState::ModelsLoading | SessionState::InitFailed { .. }
        )
    }

    /// Whether the upload control may be offered.
    pub fn can_upload(&self) -> bool {
        self.is_ready()
    }

    /// Decoding or detection in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionState::Decoding { .. } | SessionState::Detecting { .. }
        )
    }

    pub fn score(&self) -> Option<SymmetryScore> {
        match self {
            SessionState::Detected { score, .. } => Some(*score),
            _ => None,
        }
    }

    /// The single user-visible error message of this state, if any.
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            SessionState::InitFailed { message } | SessionState::UploadFailed { message } => {
                Some(message)
            }
            SessionState::DetectionFailed { failure, .. } => Some(failure.message()),
            _ => None,
        }
    }

    pub fn generation(&self) -> Option<Generation> {
        match self {
            SessionState::Decoding { generation, .. }
            | SessionState::Detecting { generation, .. }
            | SessionState::Detected { generation, .. }
            | SessionState::DetectionFailed { generation, .. } => Some(*generation),
            _ => None,
        }
    }

    /// Decoded image currently on display.
    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        match self {
            SessionState::Detecting { image, .. } | SessionState::Detected { image, .. } => {
                Some(image)
            }
            SessionState::DetectionFailed { image, .. } => image.as_ref(),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<&OverlayCanvas> {
        match self {
            SessionState::Detected { canvas, .. } => Some(canvas),
            _ => None,
        }
    }

    pub fn faces(&self) -> &[DetectedFace] {
        match self {
            SessionState::Detected { faces, .. } => faces,
            _ => &[],
        }
    }

    /// Stable snake_case name used in reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::ModelsLoading => "models_loading",
            SessionState::InitFailed { .. } => "init_failed",
            SessionState::Idle => "idle",
            SessionState::Decoding { .. } => "decoding",
            SessionState::Detecting { .. } => "detecting",
            SessionState::Detected { .. } => "detected",
            SessionState::DetectionFailed { failure, .. } => failure.label(),
            SessionState::UploadFailed { .. } => "upload_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NO_FACE_MESSAGE;
    use tempfile::NamedTempFile;

    #[test]
    fn sniffs_media_type_from_content() {
        let png = facesym_utils::load_fixture_bytes("images/blank_64.png").expect("fixture");
        let file = SelectedFile::new("upload", png);
        assert_eq!(file.resolved_media_type().as_deref(), Some("image/png"));
        assert!(file.validate().is_ok());
    }

    #[test]
    fn rejects_non_image_and_empty_files() {
        let text = SelectedFile::new("notes.txt", b"hello".to_vec());
        assert!(matches!(
            text.validate(),
            Err(UploadError::UnsupportedMediaType { .. })
        ));

        let labelled = SelectedFile::new("clip", b"hello".to_vec()).with_media_type("video/mp4");
        assert!(labelled.validate().is_err());

        let empty = SelectedFile::new("empty.png", Vec::new()).with_media_type("image/png");
        assert!(matches!(empty.validate(), Err(UploadError::Empty { .. })));
    }

    #[test]
    fn from_path_reads_name_and_bytes() {
        let file = NamedTempFile::new().expect("tempfile");
        std::fs::write(file.path(), b"abc").expect("write");
        let selected = SelectedFile::from_path(file.path()).expect("read");
        assert_eq!(selected.bytes, b"abc");
        assert!(!selected.name.is_empty());

        let missing = SelectedFile::from_path("does/not/exist.png");
        assert!(matches!(missing, Err(UploadError::Read { .. })));
    }

    #[test]
    fn state_accessors_reflect_variant() {
        assert!(!SessionState::ModelsLoading.can_upload());
        assert!(!SessionState::init_failed().can_upload());
        assert!(SessionState::Idle.can_upload());
        assert!(SessionState::upload_failed().can_upload());

        let failed = SessionState::DetectionFailed {
            generation: 3,
            image: None,
            failure: DetectionFailure::NoFace,
        };
        assert_eq!(failed.error_message(), Some(NO_FACE_MESSAGE));
        assert_eq!(failed.score(), None);
        assert_eq!(failed.generation(), Some(3));
        assert_eq!(failed.label(), "no_face");
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
