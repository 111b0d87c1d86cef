/// Append-and-activate transaction

use crate::capability::ImageInfo;
use crate::control::DiskControl;
use crate::error::{DiskControlError, EngineCall, Result};
use crate::notification::{Notification, NotificationKind, DURATION_APPEND};
use log::{info, warn};
use std::path::Path;

/// Tray state captured before an append, restored if it fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TraySnapshot {
    ejected: bool,
    index: u32,
}

impl DiskControl {
    /// Append an image, insert it, and leave the tray as it was found
    ///
    /// The tray is opened if needed, a slot is added, the image is assigned
    /// to it and selected, then the tray is closed again if it started
    /// closed. If any step fails the original disk is put back on a best
    /// effort basis and an error is returned. The outcome is always reported
    /// to the user.
    pub fn append_image(&mut self, image_path: &str) -> Result<()> {
        if !self.supports_basic() || !self.supports_append() {
            return Err(DiskControlError::Unsupported("disk append"));
        }

        let filename = Path::new(image_path)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or(DiskControlError::EmptyImagePath)?;

        let snapshot = TraySnapshot {
            ejected: self.get_eject_state(),
            index: self.get_image_index(),
        };

        match self.append_and_activate(image_path, snapshot) {
            Ok(new_index) => {
                info!("[disk] Appended {} as disk {}", image_path, new_index as u64 + 1);
                let notification =
                    Notification::info(NotificationKind::DiskAppended { filename }, DURATION_APPEND);
                // The menu gives no other feedback, so this is always shown
                self.emit(notification.unsuppressible(), true);
                Ok(())
            }
            Err(e) => {
                warn!("[disk] Append of {} failed: {}", image_path, e);
                if let Err(rollback) = self.restore_tray(snapshot) {
                    warn!("[disk] Could not restore original disk: {}", rollback);
                }
                self.emit(
                    Notification::error(NotificationKind::AppendFailed {
                        filename: filename.clone(),
                    }),
                    true,
                );
                Err(DiskControlError::append_failed(filename, e))
            }
        }
    }

    fn append_and_activate(&mut self, image_path: &str, snapshot: TraySnapshot) -> Result<u32> {
        if !snapshot.ejected {
            self.set_eject_state(true, false)?;
        }

        let added = self
            .base()
            .and_then(|b| b.add_image_index.as_ref())
            .map_or(false, |f| f());
        if !added {
            return Err(DiskControlError::Rejected(EngineCall::AddImageIndex));
        }

        let new_index = self
            .get_num_images()
            .checked_sub(1)
            .ok_or(DiskControlError::NoImages)?;

        let info = ImageInfo::new(image_path);
        let replaced = self
            .base()
            .and_then(|b| b.replace_image_index.as_ref())
            .map_or(false, |f| f(new_index, Some(&info)));
        if !replaced {
            return Err(DiskControlError::Rejected(EngineCall::ReplaceImageIndex));
        }

        self.set_index(new_index, false)?;

        if !snapshot.ejected {
            self.set_eject_state(false, false)?;
        }

        Ok(new_index)
    }

    /// Reinsert the snapshotted disk and tray state
    ///
    /// Every step is attempted even if an earlier one fails; the first
    /// failure is returned.
    fn restore_tray(&mut self, snapshot: TraySnapshot) -> Result<()> {
        let mut first_error = None;

        if !self.get_eject_state() {
            if let Err(e) = self.set_eject_state(true, false) {
                first_error.get_or_insert(e);
            }
        }

        if let Err(e) = self.set_index(snapshot.index, false) {
            first_error.get_or_insert(e);
        }

        if !snapshot.ejected {
            if let Err(e) = self.set_eject_state(false, false) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::TableShape;
    use crate::notification::{Level, DURATION_FAILURE};
    use crate::sim::{capability_table, SharedDrive, SimulatedDrive};
    use crate::CapabilityTable;

    fn setup() -> (SharedDrive, DiskControl) {
        let drive = SimulatedDrive::new(["disk0.bin", "disk1.bin"]).shared();
        let mut control = DiskControl::new();
        control.configure(capability_table(&drive, TableShape::Extended));
        (drive, control)
    }

    #[test]
    fn test_append_with_closed_tray() {
        let (drive, mut control) = setup();

        control.append_image("/games/extra/new.bin").unwrap();

        let d = drive.borrow();
        assert!(!d.is_ejected());
        assert_eq!(d.num_images(), 3);
        assert_eq!(d.image_index(), 2);
        assert_eq!(d.image_path(2).as_deref(), Some("/games/extra/new.bin"));
        drop(d);

        let notifications = control.drain_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].kind,
            NotificationKind::DiskAppended {
                filename: "new.bin".into()
            }
        );
        assert_eq!(notifications[0].duration, DURATION_APPEND);
        assert!(!notifications[0].suppressible);
    }

    #[test]
    fn test_append_with_open_tray_stays_open() {
        let (drive, mut control) = setup();
        control.set_eject_state(true, false).unwrap();

        control.append_image("new.bin").unwrap();
        assert!(drive.borrow().is_ejected());
        assert_eq!(drive.borrow().image_index(), 2);
        // Only the initial eject touched the tray
        assert_eq!(drive.borrow().calls().set_eject_state, 1);
    }

    #[test]
    fn test_append_requires_support_and_path() {
        let (drive, mut control) = setup();
        assert!(matches!(
            control.append_image(""),
            Err(DiskControlError::EmptyImagePath)
        ));
        assert!(matches!(
            control.append_image("/"),
            Err(DiskControlError::EmptyImagePath)
        ));

        let mut table = capability_table(&drive, TableShape::Extended);
        if let CapabilityTable::Extended(ext) = &mut table {
            ext.base.add_image_index = None;
        }
        control.configure(table);
        assert!(matches!(
            control.append_image("new.bin"),
            Err(DiskControlError::Unsupported(_))
        ));

        assert_eq!(drive.borrow().calls().set_eject_state, 0);
        assert!(control.drain_notifications().is_empty());
    }

    #[test]
    fn test_replace_failure_rolls_back() {
        let (drive, mut control) = setup();
        drive.borrow_mut().faults.replace_image_index = true;

        let err = control.append_image("new.bin").unwrap_err();
        assert!(matches!(err, DiskControlError::AppendFailed { .. }));
        assert!(err.is_rejection());

        assert!(!drive.borrow().is_ejected());
        assert_eq!(drive.borrow().image_index(), 0);

        let notifications = control.drain_notifications();
        let last = notifications.last().unwrap();
        assert_eq!(
            last.kind,
            NotificationKind::AppendFailed {
                filename: "new.bin".into()
            }
        );
        assert_eq!(last.level, Level::Error);
        assert_eq!(last.duration, DURATION_FAILURE);
    }

    #[test]
    fn test_add_failure_rolls_back() {
        let (drive, mut control) = setup();
        control.set_eject_state(true, false).unwrap();
        control.set_index(1, false).unwrap();
        control.set_eject_state(false, false).unwrap();
        drive.borrow_mut().faults.add_image_index = true;

        assert!(control.append_image("new.bin").is_err());
        assert!(!drive.borrow().is_ejected());
        assert_eq!(drive.borrow().image_index(), 1);
        assert_eq!(drive.borrow().num_images(), 2);
    }

    #[test]
    fn test_close_failure_leaves_tray_open() {
        let (drive, mut control) = setup();
        drive.borrow_mut().faults.close = true;

        assert!(control.append_image("new.bin").is_err());

        // Rollback could not close the tray either, but the index is restored
        assert!(drive.borrow().is_ejected());
        assert_eq!(drive.borrow().image_index(), 0);

        let kinds: Vec<_> = control
            .drain_notifications()
            .into_iter()
            .map(|n| n.kind)
            .collect();
        assert!(kinds.contains(&NotificationKind::CloseFailed));
        assert_eq!(
            kinds.last(),
            Some(&NotificationKind::AppendFailed {
                filename: "new.bin".into()
            })
        );
    }

    #[test]
    fn test_eject_failure_aborts() {
        let (drive, mut control) = setup();
        drive.borrow_mut().faults.eject = true;

        assert!(control.append_image("new.bin").is_err());
        assert_eq!(drive.borrow().calls().add_image_index, 0);
        assert_eq!(drive.borrow().num_images(), 2);
        assert!(!drive.borrow().is_ejected());
    }

    #[test]
    fn test_no_images_after_add() {
        let (drive, mut control) = setup();
        drive.borrow_mut().report_count(Some(0));

        let err = control.append_image("new.bin").unwrap_err();
        match err {
            DiskControlError::AppendFailed { source, .. } => {
                assert!(matches!(*source, DiskControlError::NoImages))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!drive.borrow().is_ejected());
    }
}
