//! Engine capability tables
//!
//! An engine exposes disk control through one of two table shapes. The
//! legacy [`CapabilityTable::Basic`] shape carries the five tray/index
//! callbacks and the optional append pair; [`CapabilityTable::Extended`]
//! adds initial image selection, image paths and labels. Every member is
//! optional and probed on its own.

/// Capability table builder
pub mod builder;

pub use builder::CapabilityTableBuilder;

use std::fmt;
use std::path::Path;

/// Open or close the tray; returns `false` if the engine refused
pub type SetEjectStateFn = Box<dyn Fn(bool) -> bool>;
/// Current tray state
pub type GetEjectStateFn = Box<dyn Fn() -> bool>;
/// Current image index (`>= num_images` means no disk)
pub type GetImageIndexFn = Box<dyn Fn() -> u32>;
/// Select an image; only legal while ejected
pub type SetImageIndexFn = Box<dyn Fn(u32) -> bool>;
/// Number of images
pub type GetNumImagesFn = Box<dyn Fn() -> u32>;
/// Assign (or with `None`, remove) the image at an index
pub type ReplaceImageIndexFn = Box<dyn Fn(u32, Option<&ImageInfo>) -> bool>;
/// Add an empty slot at index `num_images`
pub type AddImageIndexFn = Box<dyn Fn() -> bool>;
/// Image to insert when content loads
pub type SetInitialImageFn = Box<dyn Fn(u32, &str) -> bool>;
/// Path of the image at an index
pub type GetImagePathFn = Box<dyn Fn(u32) -> Option<String>>;
/// Engine supplied label for the image at an index
pub type GetImageLabelFn = Box<dyn Fn(u32) -> Option<String>>;

/// Activation payload passed to replace-image-index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Path of the image file
    pub path: String,
}

impl ImageInfo {
    /// Create image info for a path
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self { path: path.into() }
    }

    /// File name component of the path
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.path).file_name().and_then(|n| n.to_str())
    }
}

/// Basic tray/index callbacks plus the optional append pair
#[derive(Default)]
pub struct DiskCallbacks {
    /// set-eject-state
    pub set_eject_state: Option<SetEjectStateFn>,
    /// get-eject-state
    pub get_eject_state: Option<GetEjectStateFn>,
    /// get-image-index
    pub get_image_index: Option<GetImageIndexFn>,
    /// set-image-index
    pub set_image_index: Option<SetImageIndexFn>,
    /// get-num-images
    pub get_num_images: Option<GetNumImagesFn>,
    /// replace-image-index
    pub replace_image_index: Option<ReplaceImageIndexFn>,
    /// add-image-index
    pub add_image_index: Option<AddImageIndexFn>,
}

impl DiskCallbacks {
    /// All five basic members present
    pub fn has_basic(&self) -> bool {
        self.set_eject_state.is_some()
            && self.get_eject_state.is_some()
            && self.get_image_index.is_some()
            && self.set_image_index.is_some()
            && self.get_num_images.is_some()
    }

    /// Both append members present
    pub fn has_append(&self) -> bool {
        self.replace_image_index.is_some() && self.add_image_index.is_some()
    }
}

/// Extended callbacks; always a superset of [`DiskCallbacks`]
#[derive(Default)]
pub struct ExtendedCallbacks {
    /// Basic and append members
    pub base: DiskCallbacks,
    /// set-initial-image
    pub set_initial_image: Option<SetInitialImageFn>,
    /// get-image-path
    pub get_image_path: Option<GetImagePathFn>,
    /// get-image-label
    pub get_image_label: Option<GetImageLabelFn>,
}

/// Shape of a capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// Legacy interface
    Basic,
    /// Extended interface
    Extended,
}

/// A negotiated capability table
pub enum CapabilityTable {
    /// Legacy interface
    Basic(DiskCallbacks),
    /// Extended interface
    Extended(ExtendedCallbacks),
}

impl CapabilityTable {
    /// Create a new builder for constructing capability tables
    pub fn builder() -> CapabilityTableBuilder {
        CapabilityTableBuilder::new()
    }

    /// Which shape this table was configured with
    pub fn shape(&self) -> TableShape {
        match self {
            CapabilityTable::Basic(_) => TableShape::Basic,
            CapabilityTable::Extended(_) => TableShape::Extended,
        }
    }

    /// Basic and append members, present in both shapes
    pub fn base(&self) -> &DiskCallbacks {
        match self {
            CapabilityTable::Basic(base) => base,
            CapabilityTable::Extended(ext) => &ext.base,
        }
    }

    /// Extended members, if this is an extended table
    pub fn extended(&self) -> Option<&ExtendedCallbacks> {
        match self {
            CapabilityTable::Basic(_) => None,
            CapabilityTable::Extended(ext) => Some(ext),
        }
    }

    /// All five basic members present
    pub fn supports_basic(&self) -> bool {
        self.base().has_basic()
    }

    /// Both append members present
    pub fn supports_append(&self) -> bool {
        self.base().has_append()
    }

    /// get-image-label present
    pub fn supports_labels(&self) -> bool {
        matches!(self, CapabilityTable::Extended(ext) if ext.get_image_label.is_some())
    }

    /// set-initial-image and get-image-path both present
    pub fn supports_initial_image(&self) -> bool {
        matches!(
            self,
            CapabilityTable::Extended(ext)
                if ext.set_initial_image.is_some() && ext.get_image_path.is_some()
        )
    }

    /// set-initial-image callback
    pub(crate) fn set_initial_image_fn(&self) -> Option<&SetInitialImageFn> {
        self.extended().and_then(|ext| ext.set_initial_image.as_ref())
    }

    /// get-image-path callback
    pub(crate) fn get_image_path_fn(&self) -> Option<&GetImagePathFn> {
        self.extended().and_then(|ext| ext.get_image_path.as_ref())
    }

    /// get-image-label callback
    pub(crate) fn get_image_label_fn(&self) -> Option<&GetImageLabelFn> {
        self.extended().and_then(|ext| ext.get_image_label.as_ref())
    }
}

impl fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("shape", &self.shape())
            .field("basic", &self.supports_basic())
            .field("append", &self.supports_append())
            .field("labels", &self.supports_labels())
            .field("initial_image", &self.supports_initial_image())
            .finish()
    }
}
