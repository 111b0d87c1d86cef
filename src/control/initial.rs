/// Initial index handshake and record persistence
///
/// Around a content load the presentation layer calls, in order:
///
/// 1. [`DiskControl::set_initial_index`] before the engine loads content
/// 2. [`DiskControl::verify_initial_index`] right after it finishes
/// 3. [`DiskControl::save_image_index`] whenever the position should be
///    persisted, and [`DiskControl::unload_content`] when content unloads

use crate::control::DiskControl;
use crate::error::{DiskControlError, EngineCall, Result};
use crate::notification::{self, Notification, NotificationKind};
use crate::record::IndexRecord;
use log::{debug, error, info, warn};
use std::path::Path;

impl DiskControl {
    /// Prime the engine with the last used disk before content loads
    ///
    /// Returns `false` (record keeping disabled) when there is no content
    /// path, the engine cannot select an initial image, or the record
    /// directory cannot be created. A refused initial image is only logged;
    /// [`verify_initial_index`](Self::verify_initial_index) judges the result.
    pub fn set_initial_index(&mut self, content_path: &str, save_dir: Option<&Path>) -> bool {
        self.record = None;
        self.initial_num_images = 0;

        if content_path.is_empty() {
            return false;
        }

        let supported = self.table.as_ref().map_or(false, |t| {
            t.supports_initial_image()
                && t.base().get_num_images.is_some()
                && t.base().get_image_index.is_some()
        });
        if !supported {
            debug!("[disk] Engine cannot restore the initial disk, index record disabled");
            return false;
        }

        let record = match IndexRecord::init(content_path, save_dir) {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                error!("[disk] Index record unavailable for {}: {}", content_path, e);
                return false;
            }
        };

        if record.image_index() != 0 {
            match self.request_initial_image(record.image_index(), record.image_path()) {
                Ok(()) => info!(
                    "[disk] Requested initial disk [{}] {}",
                    record.image_index(),
                    record.image_path()
                ),
                Err(e) => warn!(
                    "[disk] {} for [{}] {}",
                    e,
                    record.image_index(),
                    record.image_path()
                ),
            }
        }

        self.record = Some(record);
        true
    }

    fn request_initial_image(&self, index: u32, path: &str) -> Result<()> {
        let accepted = self
            .table
            .as_ref()
            .and_then(|t| t.set_initial_image_fn())
            .map_or(false, |f| f(index, path));

        if accepted {
            Ok(())
        } else {
            Err(DiskControlError::Rejected(EngineCall::SetInitialImage))
        }
    }

    /// Check that the requested initial disk actually took effect
    ///
    /// A first-run record (`{0, ""}`) accepts whatever path the engine
    /// reports and is back-filled with it. On mismatch the record is reset to
    /// `{0, ""}` and saved straight away, since the disk set most likely
    /// changed. Returns `false` on mismatch or if record keeping is disabled.
    pub fn verify_initial_index(&mut self, notify: bool) -> bool {
        let (expected_index, expected_path, first_run) = match self.record.as_ref() {
            Some(record) => (
                record.image_index(),
                record.image_path().to_string(),
                record.is_first_run(),
            ),
            None => return false,
        };

        self.initial_num_images = self.get_num_images();
        let detected_index = self.get_image_index();
        let detected_path = self.get_image_path(detected_index);

        let matched = detected_index == expected_index
            && (first_run || detected_path.as_deref() == Some(expected_path.as_str()));

        if !matched {
            let detected_path = detected_path.unwrap_or_default();
            error!(
                "[disk] Failed to set initial disk index: expected [{}] {}, detected [{}] {}",
                expected_index, expected_path, detected_index, detected_path
            );
            self.emit(
                Notification::error(NotificationKind::InitialDiskMismatch {
                    expected_index,
                    expected_path,
                    detected_index,
                    detected_path,
                }),
                notify,
            );

            if let Some(record) = self.record.as_mut() {
                record.set(0, "");
                if let Err(e) = record.save() {
                    error!("[disk] Failed to reset index record: {}", e);
                }
            }
        } else if expected_path.is_empty() {
            if let (Some(record), Some(path)) = (self.record.as_mut(), detected_path.as_deref()) {
                record.set(detected_index, path);
            }
        }

        if self.initial_num_images > 1 {
            let label = Some(self.get_image_label(detected_index));
            let shown = notification::index_set(detected_index, self.initial_num_images, label, true);
            let kind = match shown.kind {
                NotificationKind::DiskInserted { index, count, label } => {
                    NotificationKind::CurrentDisk { index, count, label }
                }
                other => other,
            };
            self.emit(Notification { kind, ..shown }, notify);
        }

        matched
    }

    /// Persist the current disk index
    ///
    /// Nothing to do (and success) when record keeping is disabled or the
    /// content had fewer than two images at load. Returns `false` without
    /// writing if the current disk lies outside the images present at load,
    /// i.e. it was appended at runtime and cannot be restored next time.
    pub fn save_image_index(&mut self) -> bool {
        if self.record.is_none() || self.initial_num_images < 2 {
            return true;
        }

        let index = self.get_image_index();
        if index >= self.initial_num_images {
            debug!(
                "[disk] Not saving disk {}: outside the {} images present at load",
                index, self.initial_num_images
            );
            return false;
        }

        match self.record.as_mut().map(IndexRecord::save) {
            Some(Err(e)) => {
                error!("[disk] Failed to save index record: {}", e);
                false
            }
            _ => true,
        }
    }

    /// Save and discard the record when content unloads
    pub fn unload_content(&mut self) -> bool {
        let saved = self.save_image_index();
        self.record = None;
        self.initial_num_images = 0;
        saved
    }

    /// Is the last used disk being recorded for the current content?
    pub fn is_record_enabled(&self) -> bool {
        self.record.is_some()
    }

    /// Record for the current content
    pub fn index_record(&self) -> Option<&IndexRecord> {
        self.record.as_ref()
    }

    /// Number of images reported right after load
    pub fn initial_num_images(&self) -> u32 {
        self.initial_num_images
    }
}
