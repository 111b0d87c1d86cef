/*!
# diskswap

A Rust library for driving multi-disk content: ejecting and inserting
virtual disks, appending images at runtime, and remembering which disk was
in the drive so the same one comes back on the next launch.

## Features

- One API over the legacy and extended disk control capability tables
- Swap protocol enforcement (disk index only changes with the tray open)
- Append-and-insert with rollback to the original disk on failure
- Last used disk persisted to a small JSON side file per content
- Structured notifications for the presentation layer to render

## Quick Start

```rust,no_run
use diskswap::sim::{capability_table, SimulatedDrive};
use diskswap::{DiskControl, Settings, TableShape};

let settings = Settings::from_env();
let drive = SimulatedDrive::new(["game (Disk 1).chd", "game (Disk 2).chd"]).shared();

let mut control = DiskControl::new();
control.configure(capability_table(&drive, TableShape::Extended));

// Before content loads: ask the engine for the disk used last time
control.set_initial_index("/games/game.m3u", settings.save_dir.as_deref());
drive.borrow_mut().finish_load();
// After content loads: check that it took effect
control.verify_initial_index(settings.notify);

// Swap to the next disk
control.set_eject_state(true, settings.notify)?;
control.set_index_next(settings.notify)?;
control.set_eject_state(false, settings.notify)?;

// Add a disk the content did not ship with
control.append_image("/games/save disk.chd")?;

for notification in control.drain_notifications() {
    println!("[{}] {}", notification.level.name(), notification);
}

// On unload: persist the current disk
control.unload_content();
# Ok::<(), diskswap::DiskControlError>(())
```

## Modules

- `capability`: Capability tables and their builder
- `control`: The disk control coordinator
- `record`: Persisted last-used disk record
- `notification`: Structured user-facing messages
- `config`: Settings
- `sim`: In-process engine for consoles and tests
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Capability tables and their builder
pub mod capability;
/// Settings
pub mod config;
/// The disk control coordinator
pub mod control;
/// Error types and Result alias
pub mod error;
/// Structured user-facing messages
pub mod notification;
/// Persisted last-used disk record
pub mod record;
/// In-process engine for consoles and tests
pub mod sim;

// Re-export common types
pub use capability::{
    CapabilityTable, CapabilityTableBuilder, DiskCallbacks, ExtendedCallbacks, ImageInfo,
    TableShape,
};
pub use config::Settings;
pub use control::{DiskControl, ImageEntry, UNKNOWN_IMAGE_COUNT};
pub use error::{DiskControlError, EngineCall, Result};
pub use notification::{Level, Notification, NotificationKind};
pub use record::{IndexRecord, RECORD_FILE_EXTENSION};
pub use sim::{Faults, SimulatedDrive};
