/// In-process multi-disk engine
///
/// [`SimulatedDrive`] behaves like a content engine exposing disk control:
/// a list of images, a virtual tray and a current index. Every callback can
/// be made to fail through [`Faults`], and the calls that change state are
/// counted, which makes it the reference engine for the console and tests.

use crate::capability::{CapabilityTable, CapabilityTableBuilder, ImageInfo, TableShape};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Shared handle used by capability callbacks
pub type SharedDrive = Rc<RefCell<SimulatedDrive>>;

/// An image slot in the drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimImage {
    /// Image path
    pub path: String,
    /// Engine supplied label
    pub label: Option<String>,
}

/// Callbacks that should report failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Faults {
    /// Refuse to open the tray
    pub eject: bool,
    /// Refuse to close the tray
    pub close: bool,
    /// Refuse set-image-index
    pub set_image_index: bool,
    /// Accept set-image-index but always land on the first image
    pub misplace_image_index: bool,
    /// Refuse add-image-index
    pub add_image_index: bool,
    /// Refuse replace-image-index
    pub replace_image_index: bool,
    /// Refuse set-initial-image
    pub set_initial_image: bool,
    /// No path available from get-image-path
    pub image_path: bool,
    /// No label available from get-image-label
    pub image_label: bool,
}

/// Number of state-changing calls received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// set-eject-state
    pub set_eject_state: usize,
    /// set-image-index
    pub set_image_index: usize,
    /// add-image-index
    pub add_image_index: usize,
    /// replace-image-index
    pub replace_image_index: usize,
    /// set-initial-image
    pub set_initial_image: usize,
}

/// A simulated multi-disk engine
#[derive(Debug, Clone, Default)]
pub struct SimulatedDrive {
    images: Vec<Option<SimImage>>,
    ejected: bool,
    index: u32,
    initial_image: Option<(u32, String)>,
    reported_count: Option<u32>,
    /// Failure injection
    pub faults: Faults,
    calls: CallCounts,
}

impl SimulatedDrive {
    /// Create a drive holding the given images, tray closed on the first one
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: paths
                .into_iter()
                .map(|p| {
                    Some(SimImage {
                        path: p.into(),
                        label: None,
                    })
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Wrap the drive in a shared handle
    pub fn shared(self) -> SharedDrive {
        Rc::new(RefCell::new(self))
    }

    /// Attach a label to an image
    pub fn set_label<S: Into<String>>(&mut self, index: u32, label: S) {
        if let Some(Some(image)) = self.images.get_mut(index as usize) {
            image.label = Some(label.into());
        }
    }

    /// Make get-num-images report a fixed value
    pub fn report_count(&mut self, count: Option<u32>) {
        self.reported_count = count;
    }

    /// Is the tray open?
    pub fn is_ejected(&self) -> bool {
        self.ejected
    }

    /// Current image index
    pub fn image_index(&self) -> u32 {
        self.index
    }

    /// Number of image slots
    pub fn num_images(&self) -> u32 {
        self.reported_count.unwrap_or(self.images.len() as u32)
    }

    /// Image at an index, `None` if out of range or not yet assigned
    pub fn image(&self, index: u32) -> Option<&SimImage> {
        self.images.get(index as usize).and_then(|i| i.as_ref())
    }

    /// Initial image cached by set-initial-image, not yet applied
    pub fn initial_image(&self) -> Option<(u32, &str)> {
        self.initial_image.as_ref().map(|(i, p)| (*i, p.as_str()))
    }

    /// Calls received so far
    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Finish loading content
    ///
    /// Applies the cached initial image if its index is valid and its path
    /// still matches; otherwise starts on the first image.
    pub fn finish_load(&mut self) {
        self.ejected = false;
        self.index = 0;

        if let Some((index, path)) = self.initial_image.take() {
            if self.image(index).map(|i| i.path == path).unwrap_or(false) {
                self.index = index;
            }
        }
    }

    /// Open or close the tray
    pub fn set_eject_state(&mut self, ejected: bool) -> bool {
        self.calls.set_eject_state += 1;
        if (ejected && self.faults.eject) || (!ejected && self.faults.close) {
            return false;
        }
        self.ejected = ejected;
        true
    }

    /// Select an image; an index past the end empties the tray
    pub fn set_image_index(&mut self, index: u32) -> bool {
        self.calls.set_image_index += 1;
        if !self.ejected || self.faults.set_image_index {
            return false;
        }
        self.index = if self.faults.misplace_image_index { 0 } else { index };
        true
    }

    /// Add an empty slot
    pub fn add_image_index(&mut self) -> bool {
        self.calls.add_image_index += 1;
        if self.faults.add_image_index {
            return false;
        }
        self.images.push(None);
        true
    }

    /// Assign or remove the image at an index
    pub fn replace_image_index(&mut self, index: u32, info: Option<&ImageInfo>) -> bool {
        self.calls.replace_image_index += 1;
        let slot = index as usize;
        if !self.ejected || self.faults.replace_image_index || slot >= self.images.len() {
            return false;
        }

        match info {
            Some(info) => {
                self.images[slot] = Some(SimImage {
                    path: info.path.clone(),
                    label: None,
                });
            }
            None => {
                self.images.remove(slot);
                if self.index > index {
                    self.index -= 1;
                }
            }
        }
        true
    }

    /// Cache the image to insert on load
    pub fn set_initial_image(&mut self, index: u32, path: &str) -> bool {
        self.calls.set_initial_image += 1;
        if self.faults.set_initial_image || index >= self.num_images() {
            return false;
        }
        self.initial_image = Some((index, path.to_string()));
        true
    }

    /// Path of an image
    pub fn image_path(&self, index: u32) -> Option<String> {
        if self.faults.image_path {
            return None;
        }
        self.image(index).map(|i| i.path.clone())
    }

    /// Label of an image, falling back to the file stem
    pub fn image_label(&self, index: u32) -> Option<String> {
        if self.faults.image_label {
            return None;
        }
        let image = self.image(index)?;
        image.label.clone().or_else(|| {
            Path::new(&image.path)
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
    }
}

/// Builder pre-populated with every callback of a shared drive
pub fn table_builder(drive: &SharedDrive) -> CapabilityTableBuilder {
    let d = drive.clone();
    let builder = CapabilityTable::builder().set_eject_state(move |e| d.borrow_mut().set_eject_state(e));
    let d = drive.clone();
    let builder = builder.get_eject_state(move || d.borrow().is_ejected());
    let d = drive.clone();
    let builder = builder.get_image_index(move || d.borrow().image_index());
    let d = drive.clone();
    let builder = builder.set_image_index(move |i| d.borrow_mut().set_image_index(i));
    let d = drive.clone();
    let builder = builder.get_num_images(move || d.borrow().num_images());
    let d = drive.clone();
    let builder = builder.replace_image_index(move |i, info| d.borrow_mut().replace_image_index(i, info));
    let d = drive.clone();
    let builder = builder.add_image_index(move || d.borrow_mut().add_image_index());
    let d = drive.clone();
    let builder = builder.set_initial_image(move |i, p| d.borrow_mut().set_initial_image(i, p));
    let d = drive.clone();
    let builder = builder.get_image_path(move |i| d.borrow().image_path(i));
    let d = drive.clone();
    builder.get_image_label(move |i| d.borrow().image_label(i))
}

/// Capability table of the requested shape for a shared drive
pub fn capability_table(drive: &SharedDrive, shape: TableShape) -> CapabilityTable {
    let builder = table_builder(drive);
    match shape {
        TableShape::Basic => builder.build_basic(),
        TableShape::Extended => builder.build_extended(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive() -> SimulatedDrive {
        SimulatedDrive::new(["disk0.bin", "disk1.bin", "disk2.bin"])
    }

    #[test]
    fn test_index_requires_open_tray() {
        let mut drive = drive();
        assert!(!drive.set_image_index(1));
        assert!(drive.set_eject_state(true));
        assert!(drive.set_image_index(1));
        assert_eq!(drive.image_index(), 1);
        assert_eq!(drive.calls().set_image_index, 2);
    }

    #[test]
    fn test_misplaced_index_lands_on_first_image() {
        let mut drive = drive();
        drive.faults.misplace_image_index = true;
        drive.set_eject_state(true);
        assert!(drive.set_image_index(2));
        assert_eq!(drive.image_index(), 0);
    }

    #[test]
    fn test_add_and_replace() {
        let mut drive = drive();
        drive.set_eject_state(true);
        assert!(drive.add_image_index());
        assert_eq!(drive.num_images(), 4);
        assert!(drive.image(3).is_none());

        assert!(drive.replace_image_index(3, Some(&ImageInfo::new("/tmp/new.bin"))));
        assert_eq!(drive.image_path(3).as_deref(), Some("/tmp/new.bin"));
        assert_eq!(drive.image_label(3).as_deref(), Some("new"));
    }

    #[test]
    fn test_remove_shifts_index() {
        let mut drive = drive();
        drive.set_eject_state(true);
        drive.set_image_index(2);
        assert!(drive.replace_image_index(0, None));
        assert_eq!(drive.num_images(), 2);
        assert_eq!(drive.image_index(), 1);
    }

    #[test]
    fn test_finish_load_applies_matching_initial_image() {
        let mut drive = drive();
        assert!(drive.set_initial_image(2, "disk2.bin"));
        drive.finish_load();
        assert_eq!(drive.image_index(), 2);
        assert!(drive.initial_image().is_none());
    }

    #[test]
    fn test_finish_load_rejects_stale_initial_image() {
        let mut drive = drive();
        assert!(drive.set_initial_image(2, "old_disk2.bin"));
        drive.finish_load();
        assert_eq!(drive.image_index(), 0);

        assert!(!drive.set_initial_image(5, "disk2.bin"));
    }

    #[test]
    fn test_labels() {
        let mut drive = drive();
        drive.set_label(1, "Save Disk");
        assert_eq!(drive.image_label(1).as_deref(), Some("Save Disk"));
        assert_eq!(drive.image_label(0).as_deref(), Some("disk0"));
        assert_eq!(drive.image_label(9), None);

        drive.faults.image_label = true;
        assert_eq!(drive.image_label(1), None);
    }

    #[test]
    fn test_table_shapes() {
        let shared = drive().shared();
        let basic = capability_table(&shared, TableShape::Basic);
        assert!(basic.supports_basic());
        assert!(basic.supports_append());
        assert!(!basic.supports_initial_image());

        let extended = capability_table(&shared, TableShape::Extended);
        assert!(extended.supports_labels());
        assert!(extended.supports_initial_image());
    }
}
