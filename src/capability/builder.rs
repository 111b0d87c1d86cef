/// Builder for capability tables

use crate::capability::{CapabilityTable, ExtendedCallbacks, ImageInfo};

/// Builder for constructing [`CapabilityTable`]s
///
/// Members that are never set stay absent.
#[derive(Default)]
pub struct CapabilityTableBuilder {
    callbacks: ExtendedCallbacks,
}

impl CapabilityTableBuilder {
    /// Create a new builder with no members
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the set-eject-state member
    pub fn set_eject_state<F: Fn(bool) -> bool + 'static>(mut self, f: F) -> Self {
        self.callbacks.base.set_eject_state = Some(Box::new(f));
        self
    }

    /// Set the get-eject-state member
    pub fn get_eject_state<F: Fn() -> bool + 'static>(mut self, f: F) -> Self {
        self.callbacks.base.get_eject_state = Some(Box::new(f));
        self
    }

    /// Set the get-image-index member
    pub fn get_image_index<F: Fn() -> u32 + 'static>(mut self, f: F) -> Self {
        self.callbacks.base.get_image_index = Some(Box::new(f));
        self
    }

    /// Set the set-image-index member
    pub fn set_image_index<F: Fn(u32) -> bool + 'static>(mut self, f: F) -> Self {
        self.callbacks.base.set_image_index = Some(Box::new(f));
        self
    }

    /// Set the get-num-images member
    pub fn get_num_images<F: Fn() -> u32 + 'static>(mut self, f: F) -> Self {
        self.callbacks.base.get_num_images = Some(Box::new(f));
        self
    }

    /// Set the replace-image-index member
    pub fn replace_image_index<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Option<&ImageInfo>) -> bool + 'static,
    {
        self.callbacks.base.replace_image_index = Some(Box::new(f));
        self
    }

    /// Set the add-image-index member
    pub fn add_image_index<F: Fn() -> bool + 'static>(mut self, f: F) -> Self {
        self.callbacks.base.add_image_index = Some(Box::new(f));
        self
    }

    /// Set the set-initial-image member (extended only)
    pub fn set_initial_image<F: Fn(u32, &str) -> bool + 'static>(mut self, f: F) -> Self {
        self.callbacks.set_initial_image = Some(Box::new(f));
        self
    }

    /// Set the get-image-path member (extended only)
    pub fn get_image_path<F: Fn(u32) -> Option<String> + 'static>(mut self, f: F) -> Self {
        self.callbacks.get_image_path = Some(Box::new(f));
        self
    }

    /// Set the get-image-label member (extended only)
    pub fn get_image_label<F: Fn(u32) -> Option<String> + 'static>(mut self, f: F) -> Self {
        self.callbacks.get_image_label = Some(Box::new(f));
        self
    }

    /// Build a legacy table; extended members are discarded
    pub fn build_basic(self) -> CapabilityTable {
        CapabilityTable::Basic(self.callbacks.base)
    }

    /// Build an extended table
    pub fn build_extended(self) -> CapabilityTable {
        CapabilityTable::Extended(self.callbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder() {
        let table = CapabilityTableBuilder::new().build_extended();
        assert!(!table.supports_basic());
        assert!(!table.supports_append());
        assert!(!table.supports_labels());
        assert!(!table.supports_initial_image());
    }

    #[test]
    fn test_callbacks_are_invoked() {
        let table = CapabilityTableBuilder::new()
            .get_num_images(|| 4)
            .get_image_label(|i| Some(format!("Disk {}", i + 1)))
            .build_extended();

        let count = table.base().get_num_images.as_ref().map(|f| f());
        assert_eq!(count, Some(4));

        let label = table.get_image_label_fn().and_then(|f| f(1));
        assert_eq!(label.as_deref(), Some("Disk 2"));
    }
}
