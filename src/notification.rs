/// Structured user-facing notifications
///
/// The coordinator never renders or localizes text itself. It emits a
/// [`Notification`] describing what happened; the presentation layer decides
/// how to show it. The [`Display`](fmt::Display) impl is a plain English
/// rendering used for logging and the console.

use std::fmt;

/// Plain success, no label shown (also the fallback duration)
pub const DURATION_DEFAULT: u32 = 60;
/// Success with a disk label shown
pub const DURATION_WITH_LABEL: u32 = 90;
/// Successful append
pub const DURATION_APPEND: u32 = 120;
/// Any failure
pub const DURATION_FAILURE: u32 = 180;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Informational
    Info,
    /// Needs attention, e.g. retry
    Warning,
    /// Operation failed
    Error,
}

impl Level {
    /// Get a human-readable name for this level
    pub fn name(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }

    /// Matching `log` level
    pub fn log_level(&self) -> log::Level {
        match self {
            Level::Info => log::Level::Info,
            Level::Warning => log::Level::Warn,
            Level::Error => log::Level::Error,
        }
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// Tray opened
    TrayEjected,
    /// Tray closed
    TrayClosed,
    /// Engine refused to open the tray
    EjectFailed,
    /// Engine refused to close the tray
    CloseFailed,
    /// Disk index change attempted with the tray closed
    TrayNotEjected,
    /// Disk inserted; `index` is zero-based
    DiskInserted {
        /// Zero-based disk index
        index: u32,
        /// Number of images
        count: u32,
        /// Engine supplied label, if any
        label: Option<String>,
    },
    /// Engine refused to insert the disk
    DiskInsertFailed {
        /// Zero-based disk index
        index: u32,
        /// Number of images
        count: u32,
        /// Engine supplied label, if any
        label: Option<String>,
    },
    /// Out of range index selected, i.e. no disk in tray
    DiskRemoved,
    /// Engine refused to empty the tray
    DiskRemoveFailed,
    /// Disk count is zero or unknown
    InvalidDiskIndex,
    /// Image appended and inserted
    DiskAppended {
        /// File name of the appended image
        filename: String,
    },
    /// Append failed and was rolled back
    AppendFailed {
        /// File name of the image
        filename: String,
    },
    /// Persisted disk did not take effect after load
    InitialDiskMismatch {
        /// Index from the record
        expected_index: u32,
        /// Path from the record
        expected_path: String,
        /// Index reported by the engine
        detected_index: u32,
        /// Path reported by the engine
        detected_path: String,
    },
    /// Disk active after load
    CurrentDisk {
        /// Zero-based disk index
        index: u32,
        /// Number of images
        count: u32,
        /// Engine supplied label, if any
        label: Option<String>,
    },
}

/// A user-facing message produced by a disk control operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// What happened
    pub kind: NotificationKind,
    /// Severity
    pub level: Level,
    /// Display duration in frames
    pub duration: u32,
    /// May be hidden when the caller asked for quiet operation
    pub suppressible: bool,
}

impl Notification {
    /// Informational, suppressible notification
    pub fn info(kind: NotificationKind, duration: u32) -> Self {
        Self {
            kind,
            level: Level::Info,
            duration,
            suppressible: true,
        }
    }

    /// Warning that is always shown
    pub fn warning(kind: NotificationKind) -> Self {
        Self {
            kind,
            level: Level::Warning,
            duration: DURATION_FAILURE,
            suppressible: false,
        }
    }

    /// Error that is always shown
    pub fn error(kind: NotificationKind) -> Self {
        Self {
            kind,
            level: Level::Error,
            duration: DURATION_FAILURE,
            suppressible: false,
        }
    }

    /// Mark as always shown
    pub fn unsuppressible(mut self) -> Self {
        self.suppressible = false;
        self
    }

    /// Should this be shown given the caller's `notify` flag?
    pub fn visible(&self, notify: bool) -> bool {
        notify || !self.suppressible || self.level == Level::Error
    }
}

/// Outcome message for a disk index change
///
/// An index outside `0..count` means "no disk".
pub fn index_set(index: u32, count: u32, label: Option<String>, success: bool) -> Notification {
    let label = label.filter(|l| !l.is_empty());

    if index < count {
        if success {
            let duration = if label.is_some() {
                DURATION_WITH_LABEL
            } else {
                DURATION_DEFAULT
            };
            Notification::info(NotificationKind::DiskInserted { index, count, label }, duration)
        } else {
            Notification::error(NotificationKind::DiskInsertFailed { index, count, label })
        }
    } else if success {
        Notification::info(NotificationKind::DiskRemoved, DURATION_DEFAULT)
    } else {
        Notification::error(NotificationKind::DiskRemoveFailed)
    }
}

fn write_position(f: &mut fmt::Formatter<'_>, index: u32, count: u32, label: &Option<String>) -> fmt::Result {
    write!(f, "{}/{}", index as u64 + 1, count)?;
    if let Some(label) = label {
        write!(f, " - {}", label)?;
    }
    Ok(())
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::TrayEjected => write!(f, "Virtual disk tray ejected"),
            NotificationKind::TrayClosed => write!(f, "Virtual disk tray closed"),
            NotificationKind::EjectFailed => {
                write!(f, "Failed to eject virtual disk tray, please try again")
            }
            NotificationKind::CloseFailed => {
                write!(f, "Failed to close virtual disk tray, please try again")
            }
            NotificationKind::TrayNotEjected => {
                write!(f, "Eject the virtual disk tray before changing disk")
            }
            NotificationKind::DiskInserted { index, count, label } => {
                write!(f, "Setting disk in tray: ")?;
                write_position(f, *index, *count, label)
            }
            NotificationKind::DiskInsertFailed { index, count, label } => {
                write!(f, "Failed to set disk: ")?;
                write_position(f, *index, *count, label)
            }
            NotificationKind::DiskRemoved => write!(f, "Removed disk from tray"),
            NotificationKind::DiskRemoveFailed => write!(f, "Failed to remove disk from tray"),
            NotificationKind::InvalidDiskIndex => write!(f, "Got invalid disk index"),
            NotificationKind::DiskAppended { filename } => write!(f, "Appended disk: {}", filename),
            NotificationKind::AppendFailed { filename } => {
                write!(f, "Failed to append disk: {}", filename)
            }
            NotificationKind::InitialDiskMismatch { .. } => {
                write!(f, "Failed to set initial disk, using first disk")
            }
            NotificationKind::CurrentDisk { index, count, label } => {
                write!(f, "Current disk: ")?;
                write_position(f, *index, *count, label)
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}
