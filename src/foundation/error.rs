use std::fmt;

/// Convenience result type used across depthtext.
pub type DepthTextResult<T> = Result<T, DepthTextError>;

/// Coarse error taxonomy shared by every pipeline stage.
///
/// Kinds are assigned either explicitly by the stage that failed or by
/// [`ErrorKind::classify`] over the text of a foreign error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// An external engine or font database could not be brought up.
    LibraryInitialization,
    /// Generic raster processing failure (shape mismatch, empty raster, ...).
    ImageProcessing,
    /// Allocation failure or an input too large to process.
    MemoryError,
    /// Transport-level failure reported by an external collaborator.
    NetworkError,
    /// Input bytes are not a decodable image.
    InvalidFormat,
    /// The external segmentation engine failed.
    WebassemblyError,
    /// A raster surface could not be allocated, drawn or encoded.
    CanvasError,
    /// Anything that matched no known pattern.
    UnknownError,
}

const MEMORY_PATTERNS: &[&str] = &[
    "out of memory",
    "memory",
    "allocation",
    "alloc failed",
    "oom",
    "heap",
];
const ENGINE_PATTERNS: &[&str] = &[
    "webassembly",
    "wasm",
    "onnx",
    "inference",
    "execution provider",
];
const SURFACE_PATTERNS: &[&str] = &["canvas", "pixmap", "surface", "getcontext", "draw"];
const FORMAT_PATTERNS: &[&str] = &[
    "invalid format",
    "unsupported",
    "decode",
    "format",
    "corrupt",
    "mime",
];
const NETWORK_PATTERNS: &[&str] = &[
    "network",
    "fetch",
    "connection",
    "timeout",
    "timed out",
    "offline",
];
const INIT_PATTERNS: &[&str] = &["initializ", "not loaded", "failed to load", "unavailable"];
const TIMEOUT_PATTERNS: &[&str] = &["timeout", "timed out", "deadline"];

impl ErrorKind {
    /// Classify free-form error text, most specific pattern group first.
    ///
    /// Order: memory, engine, surface, format, network, initialization,
    /// then [`ErrorKind::UnknownError`].
    pub fn classify(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        let groups: [(&[&str], Self); 6] = [
            (MEMORY_PATTERNS, Self::MemoryError),
            (ENGINE_PATTERNS, Self::WebassemblyError),
            (SURFACE_PATTERNS, Self::CanvasError),
            (FORMAT_PATTERNS, Self::InvalidFormat),
            (NETWORK_PATTERNS, Self::NetworkError),
            (INIT_PATTERNS, Self::LibraryInitialization),
        ];
        groups
            .iter()
            .find(|(patterns, _)| patterns.iter().any(|p| lower.contains(p)))
            .map_or(Self::UnknownError, |(_, kind)| *kind)
    }

    /// Whether retrying the same input can plausibly succeed.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::NetworkError
                | Self::LibraryInitialization
                | Self::ImageProcessing
                | Self::UnknownError
        )
    }

    /// Corrective action to show for non-retryable kinds.
    pub fn suggestion(self) -> &'static str {
        match self {
            Self::MemoryError => "Try a smaller image or reduce its resolution.",
            Self::InvalidFormat => "Use a PNG, JPEG or WebP image.",
            Self::WebassemblyError | Self::CanvasError => {
                "Try a different browser or runtime environment."
            }
            Self::NetworkError
            | Self::LibraryInitialization
            | Self::ImageProcessing
            | Self::UnknownError => "Please try again.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LibraryInitialization => "library initialization error",
            Self::ImageProcessing => "image processing error",
            Self::MemoryError => "memory error",
            Self::NetworkError => "network error",
            Self::InvalidFormat => "invalid format",
            Self::WebassemblyError => "segmentation engine error",
            Self::CanvasError => "canvas error",
            Self::UnknownError => "unknown error",
        })
    }
}

/// Returns `true` when `text` carries a resource-pressure signature
/// (memory exhaustion or a timeout reported by the collaborator itself).
pub fn is_resource_pressure(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    ErrorKind::classify(&lower) == ErrorKind::MemoryError
        || TIMEOUT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Error raised by any depthtext stage.
///
/// `message` is meant for people; `technical` keeps the underlying detail
/// (source chain, sizes) for logs and telemetry.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct DepthTextError {
    kind: ErrorKind,
    message: String,
    technical: String,
}

impl DepthTextError {
    /// Build an error of an explicit kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>, technical: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            technical: technical.into(),
        }
    }

    /// Build an error whose kind is derived from `technical`.
    pub fn classified(message: impl Into<String>, technical: impl Into<String>) -> Self {
        let technical = technical.into();
        Self::new(ErrorKind::classify(&technical), message, technical)
    }

    /// Build a [`ErrorKind::ImageProcessing`] error.
    pub fn image_processing(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::new(ErrorKind::ImageProcessing, msg.clone(), msg)
    }

    /// Build a [`ErrorKind::MemoryError`] error.
    pub fn memory(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::new(ErrorKind::MemoryError, msg.clone(), msg)
    }

    /// Build a [`ErrorKind::InvalidFormat`] error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::new(ErrorKind::InvalidFormat, msg.clone(), msg)
    }

    /// Build a [`ErrorKind::CanvasError`] error.
    pub fn canvas(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::new(ErrorKind::CanvasError, msg.clone(), msg)
    }

    /// Build a [`ErrorKind::LibraryInitialization`] error.
    pub fn initialization(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::new(ErrorKind::LibraryInitialization, msg.clone(), msg)
    }

    /// Attach a more specific technical detail string.
    pub fn with_technical(mut self, technical: impl Into<String>) -> Self {
        self.technical = technical.into();
        self
    }

    /// Error classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Internal detail string.
    pub fn technical(&self) -> &str {
        &self.technical
    }

    /// Shorthand for `self.kind().is_retryable()`.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<anyhow::Error> for DepthTextError {
    fn from(err: anyhow::Error) -> Self {
        Self::classified(err.to_string(), format!("{err:#}"))
    }
}

impl From<image::ImageError> for DepthTextError {
    fn from(err: image::ImageError) -> Self {
        use image::ImageError as E;
        let kind = match &err {
            E::Decoding(_) | E::Unsupported(_) => ErrorKind::InvalidFormat,
            E::Limits(_) => ErrorKind::MemoryError,
            E::Encoding(_) => ErrorKind::CanvasError,
            E::Parameter(_) => ErrorKind::ImageProcessing,
            E::IoError(_) => ErrorKind::UnknownError,
        };
        Self::new(kind, err.to_string(), format!("{err:?}"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
