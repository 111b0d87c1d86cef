use thiserror::Error;

/// Result type alias for disk control operations
pub type Result<T> = std::result::Result<T, DiskControlError>;

/// Engine callback that can report failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    /// set-eject-state(true)
    Eject,
    /// set-eject-state(false)
    Close,
    /// set-image-index
    SetImageIndex,
    /// add-image-index
    AddImageIndex,
    /// replace-image-index
    ReplaceImageIndex,
    /// set-initial-image
    SetInitialImage,
}

impl EngineCall {
    /// Get a human-readable name for this call
    pub fn name(&self) -> &'static str {
        match self {
            EngineCall::Eject => "eject",
            EngineCall::Close => "close",
            EngineCall::SetImageIndex => "set image index",
            EngineCall::AddImageIndex => "add image index",
            EngineCall::ReplaceImageIndex => "replace image index",
            EngineCall::SetInitialImage => "set initial image",
        }
    }
}

/// Errors that can occur while driving the disk swap protocol
#[derive(Debug, Error)]
pub enum DiskControlError {
    /// A required capability is absent from the configured table
    #[error("Unsupported: engine does not provide {0}")]
    Unsupported(&'static str),

    /// The disk index can only be changed while the tray is ejected
    #[error("Disk tray is not ejected")]
    TrayNotEjected,

    /// The engine refused a capability call
    #[error("Engine rejected {}", .0.name())]
    Rejected(EngineCall),

    /// Engine reported no usable disk count
    #[error("Got invalid disk index")]
    InvalidDiskIndex,

    /// An image path was required but empty
    #[error("Empty image path")]
    EmptyImagePath,

    /// The engine claims to have added an image but reports none
    #[error("Engine reports no images after adding one")]
    NoImages,

    /// Append transaction failed and was rolled back
    #[error("Failed to append disk {filename}: {source}")]
    AppendFailed {
        /// File name of the image being appended
        filename: String,
        /// First failure inside the transaction
        #[source]
        source: Box<DiskControlError>,
    },

    /// I/O error occurred while reading or writing the index record
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index record content could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DiskControlError {
    /// Create a parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        DiskControlError::Parse(message.into())
    }

    /// Wrap a failure inside the append transaction
    pub fn append_failed<S: Into<String>>(filename: S, source: DiskControlError) -> Self {
        DiskControlError::AppendFailed {
            filename: filename.into(),
            source: Box::new(source),
        }
    }

    /// Was this rejected by the engine (as opposed to a local precondition)?
    pub fn is_rejection(&self) -> bool {
        match self {
            DiskControlError::Rejected(_) => true,
            DiskControlError::AppendFailed { source, .. } => source.is_rejection(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for DiskControlError {
    fn from(err: serde_json::Error) -> Self {
        DiskControlError::Parse(err.to_string())
    }
}
