use std::{error::Error, fmt, io};

/// The bridge's result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failures surfaced by the shared memory bridge.
#[derive(Debug)]
pub enum BridgeError {
    /// No backend resolved the name to a region with a live header.
    NotFound { name: String },
    /// A mapping or range access failed after the region was located.
    Io(io::Error),
}

impl BridgeError {
    pub fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }

    /// Whether this error means "no active writer" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "no active writer for region '{name}'"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<io::Error> for BridgeError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<BridgeError> for io::Error {
    fn from(value: BridgeError) -> Self {
        match value {
            BridgeError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::NotFound, other),
        }
    }
}
