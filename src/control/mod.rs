//! Disk control coordinator
//!
//! [`DiskControl`] presents one API over either capability table shape,
//! enforces the swap protocol (the index may only change while the tray is
//! open) and keeps the [`IndexRecord`] in step with what the engine reports.
//!
//! A typical swap:
//!
//! ```
//! use diskswap::sim::{capability_table, SimulatedDrive};
//! use diskswap::{DiskControl, TableShape};
//!
//! let drive = SimulatedDrive::new(["disk0.bin", "disk1.bin"]).shared();
//! let mut control = DiskControl::new();
//! control.configure(capability_table(&drive, TableShape::Extended));
//!
//! control.set_eject_state(true, true)?;
//! control.set_index_next(true)?;
//! control.set_eject_state(false, true)?;
//! assert_eq!(control.get_image_index(), 1);
//!
//! for notification in control.drain_notifications() {
//!     println!("{}", notification);
//! }
//! # Ok::<(), diskswap::DiskControlError>(())
//! ```

/// Append-and-activate transaction
pub mod append;
/// Initial index handshake and record persistence
pub mod initial;

use crate::capability::{CapabilityTable, DiskCallbacks};
use crate::error::{DiskControlError, EngineCall, Result};
use crate::notification::{self, Notification, NotificationKind, DURATION_DEFAULT};
use crate::record::IndexRecord;
use log::{debug, log, warn};
use std::collections::VecDeque;
use std::path::Path;

/// Disk count meaning "unknown/unbounded"; next-disk is refused for it
pub const UNKNOWN_IMAGE_COUNT: u32 = u32::MAX;

/// An image as listed for disk selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Zero-based index
    pub index: u32,
    /// Display label (engine label, file name, or "Disk N")
    pub label: String,
    /// Image path, if the engine reports paths
    pub path: Option<String>,
}

/// Coordinates disk swapping for the running content
#[derive(Debug, Default)]
pub struct DiskControl {
    table: Option<CapabilityTable>,
    record: Option<IndexRecord>,
    initial_num_images: u32,
    notifications: VecDeque<Notification>,
}

impl DiskControl {
    /// Create a coordinator with no capabilities configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a capability table, replacing any previous one
    pub fn configure(&mut self, table: CapabilityTable) {
        debug!("[disk] Configured {:?}", table);
        self.table = Some(table);
    }

    /// Forget the capability table
    pub fn clear_capabilities(&mut self) {
        self.table = None;
    }

    /// The configured capability table
    pub fn capabilities(&self) -> Option<&CapabilityTable> {
        self.table.as_ref()
    }

    fn base(&self) -> Option<&DiskCallbacks> {
        self.table.as_ref().map(CapabilityTable::base)
    }

    /// All five basic callbacks are available
    pub fn supports_basic(&self) -> bool {
        self.table.as_ref().map_or(false, CapabilityTable::supports_basic)
    }

    /// Images can be appended at runtime
    pub fn supports_append(&self) -> bool {
        self.table.as_ref().map_or(false, CapabilityTable::supports_append)
    }

    /// The engine labels its images
    pub fn supports_labels(&self) -> bool {
        self.table.as_ref().map_or(false, CapabilityTable::supports_labels)
    }

    /// The initial image can be chosen before load
    pub fn supports_initial_image(&self) -> bool {
        self.table
            .as_ref()
            .map_or(false, CapabilityTable::supports_initial_image)
    }

    fn require_basic(&self) -> Result<()> {
        if self.supports_basic() {
            Ok(())
        } else {
            Err(DiskControlError::Unsupported("basic disk control"))
        }
    }

    /// Is the tray open? `false` if unknown
    pub fn get_eject_state(&self) -> bool {
        self.base()
            .and_then(|b| b.get_eject_state.as_ref())
            .map_or(false, |f| f())
    }

    /// Number of images, 0 if unknown
    pub fn get_num_images(&self) -> u32 {
        self.base()
            .and_then(|b| b.get_num_images.as_ref())
            .map_or(0, |f| f())
    }

    /// Current image index, 0 if unknown
    pub fn get_image_index(&self) -> u32 {
        self.base()
            .and_then(|b| b.get_image_index.as_ref())
            .map_or(0, |f| f())
    }

    /// Label of an image; empty when unsupported or unavailable
    pub fn get_image_label(&self, index: u32) -> String {
        self.table
            .as_ref()
            .and_then(CapabilityTable::get_image_label_fn)
            .and_then(|f| f(index))
            .unwrap_or_default()
    }

    /// Path of an image, if the engine reports one
    pub fn get_image_path(&self, index: u32) -> Option<String> {
        self.table
            .as_ref()
            .and_then(CapabilityTable::get_image_path_fn)
            .and_then(|f| f(index))
    }

    /// All images for a disk selection list
    pub fn image_entries(&self) -> Vec<ImageEntry> {
        let count = self.get_num_images();
        if count == UNKNOWN_IMAGE_COUNT {
            return Vec::new();
        }

        (0..count)
            .map(|index| {
                let path = self.get_image_path(index);
                let mut label = self.get_image_label(index);
                if label.is_empty() {
                    label = path
                        .as_deref()
                        .and_then(|p| Path::new(p).file_name())
                        .and_then(|n| n.to_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Disk {}", index as u64 + 1));
                }
                ImageEntry { index, label, path }
            })
            .collect()
    }

    /// Open (`true`) or close the tray
    ///
    /// Failures are always reported to the user, whatever `notify` says.
    pub fn set_eject_state(&mut self, eject: bool, notify: bool) -> Result<()> {
        let accepted = match self.base().and_then(|b| b.set_eject_state.as_ref()) {
            Some(f) => f(eject),
            None => return Err(DiskControlError::Unsupported("set-eject-state")),
        };

        if accepted {
            let kind = if eject {
                NotificationKind::TrayEjected
            } else {
                NotificationKind::TrayClosed
            };
            self.emit(Notification::info(kind, DURATION_DEFAULT), notify);
            Ok(())
        } else {
            let (kind, call) = if eject {
                (NotificationKind::EjectFailed, EngineCall::Eject)
            } else {
                (NotificationKind::CloseFailed, EngineCall::Close)
            };
            self.emit(Notification::warning(kind), notify);
            Err(DiskControlError::Rejected(call))
        }
    }

    /// Flip the tray state
    pub fn toggle_eject(&mut self, notify: bool) -> Result<()> {
        self.require_basic()?;
        let eject = !self.get_eject_state();
        self.set_eject_state(eject, notify)
    }

    /// Insert the image at `index`; an index past the end empties the tray
    ///
    /// Only legal while the tray is open. On success the record (if any) is
    /// updated with the index and path the engine now reports.
    pub fn set_index(&mut self, index: u32, notify: bool) -> Result<()> {
        self.require_basic()?;

        if !self.get_eject_state() {
            warn!("[disk] Refusing to set disk {} with the tray closed", index);
            self.emit(Notification::error(NotificationKind::TrayNotEjected), notify);
            return Err(DiskControlError::TrayNotEjected);
        }

        let num_images = self.get_num_images();
        let accepted = self
            .base()
            .and_then(|b| b.set_image_index.as_ref())
            .map_or(false, |f| f(index));

        let label = if index < num_images {
            Some(self.get_image_label(index))
        } else {
            None
        };
        self.emit(notification::index_set(index, num_images, label, accepted), notify);

        if !accepted {
            return Err(DiskControlError::Rejected(EngineCall::SetImageIndex));
        }

        self.sync_record();
        Ok(())
    }

    /// Move to the next image, stopping at the last one
    pub fn set_index_next(&mut self, notify: bool) -> Result<()> {
        self.require_basic()?;

        let num_images = self.get_num_images();
        if num_images == 0 || num_images == UNKNOWN_IMAGE_COUNT {
            return Err(self.invalid_disk_index());
        }

        // Cycling a single image onto itself is allowed
        let next = self.get_image_index().saturating_add(1).min(num_images - 1);
        self.set_index(next, notify)
    }

    /// Move to the previous image, stopping at the first one
    pub fn set_index_prev(&mut self, notify: bool) -> Result<()> {
        self.require_basic()?;

        let num_images = self.get_num_images();
        if num_images == 0 {
            return Err(self.invalid_disk_index());
        }

        let prev = self.get_image_index().saturating_sub(1).min(num_images - 1);
        self.set_index(prev, notify)
    }

    fn invalid_disk_index(&mut self) -> DiskControlError {
        self.emit(Notification::error(NotificationKind::InvalidDiskIndex), true);
        DiskControlError::InvalidDiskIndex
    }

    /// Record what the engine reports as current, not what was requested
    fn sync_record(&mut self) {
        if self.record.is_none() {
            return;
        }

        let index = self.get_image_index();
        let path = self.get_image_path(index);
        if let Some(record) = self.record.as_mut() {
            match path {
                Some(path) => record.set(index, &path),
                None => record.set(0, ""),
            }
        }
    }

    /// Log a notification and queue it if it should be shown
    pub(crate) fn emit(&mut self, notification: Notification, notify: bool) {
        log!(notification.level.log_level(), "[disk] {}", notification);
        if notification.visible(notify) {
            self.notifications.push_back(notification);
        }
    }

    /// Take all queued notifications, oldest first
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }
}
