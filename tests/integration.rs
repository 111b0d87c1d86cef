/// Integration tests for diskswap

use diskswap::record::{read_record, write_record};
use diskswap::sim::{capability_table, SharedDrive};
use diskswap::*;
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONTENT: &str = "/games/Quest for Disks.m3u";

fn drive_with(images: &[&str]) -> (SharedDrive, DiskControl) {
    let drive = SimulatedDrive::new(images.iter().copied()).shared();
    let mut control = DiskControl::new();
    control.configure(capability_table(&drive, TableShape::Extended));
    (drive, control)
}

fn record_path(dir: &Path) -> PathBuf {
    dir.join(format!("Quest for Disks.{}", RECORD_FILE_EXTENSION))
}

/// Run the load handshake the way a frontend would
fn load(control: &mut DiskControl, drive: &SharedDrive, save_dir: &Path) -> bool {
    assert!(control.set_initial_index(CONTENT, Some(save_dir)));
    drive.borrow_mut().finish_load();
    control.verify_initial_index(true)
}

#[test]
fn test_first_launch_records_selected_disk() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let (drive, mut control) = drive_with(&["/games/disk0.bin", "/games/disk1.bin", "/games/disk2.bin"]);

    assert!(load(&mut control, &drive, dir.path()));
    assert!(control.is_record_enabled());
    assert_eq!(control.initial_num_images(), 3);

    // Path back-filled from the engine
    let record = control.index_record().expect("record enabled");
    assert_eq!(record.image_index(), 0);
    assert_eq!(record.image_path(), "/games/disk0.bin");

    control.set_eject_state(true, true).expect("eject");
    control.set_index(2, true).expect("select disk 3");
    control.set_eject_state(false, true).expect("close");
    assert!(control.save_image_index());

    let stored = read_record(record_path(dir.path())).expect("Failed to read record");
    assert_eq!(stored.image_index, 2);
    assert_eq!(stored.image_path, "/games/disk2.bin");

    let text = std::fs::read_to_string(record_path(dir.path())).expect("Failed to read file");
    assert!(text.contains("\"version\": \"1.0\""));
}

#[test]
fn test_matching_record_restores_disk() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_record(record_path(dir.path()), 1, "disk1.bin").expect("Failed to write record");

    let (drive, mut control) = drive_with(&["disk0.bin", "disk1.bin", "disk2.bin"]);
    assert!(load(&mut control, &drive, dir.path()));
    assert_eq!(drive.borrow().image_index(), 1);
    assert_eq!(drive.borrow().calls().set_initial_image, 1);

    let record = control.index_record().expect("record enabled");
    assert_eq!(record.image_index(), 1);
    assert_eq!(record.image_path(), "disk1.bin");
    assert!(!record.is_dirty());

    let notifications = control.drain_notifications();
    assert!(notifications.iter().all(|n| n.level == Level::Info));
    assert!(notifications.iter().any(|n| matches!(
        n.kind,
        NotificationKind::CurrentDisk { index: 1, count: 3, .. }
    )));
}

#[test]
fn test_changed_disk_set_resets_record() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_record(record_path(dir.path()), 2, "disk2.bin").expect("Failed to write record");

    // The third disk was replaced since the last run
    let (drive, mut control) = drive_with(&["disk0.bin", "disk1.bin", "disk2 (v2).bin"]);
    assert!(!load(&mut control, &drive, dir.path()));
    assert_eq!(drive.borrow().image_index(), 0);

    let record = control.index_record().expect("record enabled");
    assert_eq!(record.image_index(), 0);
    assert_eq!(record.image_path(), "");
    assert!(!record.is_dirty());

    let stored = read_record(record_path(dir.path())).expect("Failed to read record");
    assert_eq!(stored.image_index, 0);
    assert_eq!(stored.image_path, "");

    let mismatch = control
        .drain_notifications()
        .into_iter()
        .find(|n| matches!(n.kind, NotificationKind::InitialDiskMismatch { .. }))
        .expect("mismatch reported");
    assert_eq!(mismatch.level, Level::Error);
}

#[test]
fn test_failed_append_restores_tray() {
    let (drive, mut control) = drive_with(&["disk0.bin", "disk1.bin"]);
    drive.borrow_mut().faults.replace_image_index = true;

    let err = control.append_image("new.bin").unwrap_err();
    assert!(matches!(err, DiskControlError::AppendFailed { ref filename, .. } if filename == "new.bin"));

    assert!(!drive.borrow().is_ejected());
    assert_eq!(drive.borrow().image_index(), 0);
    assert_eq!(drive.borrow().calls().add_image_index, 1);

    let notifications = control.drain_notifications();
    let last = notifications.last().expect("failure reported");
    assert_eq!(last.level, Level::Error);
    assert_eq!(last.duration, 180);
    assert_eq!(last.to_string(), "Failed to append disk: new.bin");
}

#[test]
fn test_appended_disk_is_not_saved() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let (drive, mut control) = drive_with(&["disk0.bin", "disk1.bin"]);
    assert!(load(&mut control, &drive, dir.path()));

    control.append_image("extra.bin").expect("append");
    assert_eq!(control.get_image_index(), 2);

    assert!(!control.save_image_index());
    assert!(!record_path(dir.path()).exists());
}

#[test]
fn test_corrupt_record_is_replaced() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let content = dir.path().join("game.cue");
    let content = content.to_str().expect("utf-8 temp path");

    for garbage in ["", "{", "[1, 2]", "\"text\"", "{\"image_index\": \"two\"}"] {
        std::fs::write(dir.path().join("game.ldci"), garbage).expect("Failed to write file");
        let record = IndexRecord::init(content, None)
            .expect("init succeeds")
            .expect("record enabled");
        assert_eq!(record.image_index(), 0, "input {:?}", garbage);
        assert_eq!(record.image_path(), "");
        assert!(record.is_dirty());
    }
}

#[test]
fn test_legacy_interface_skips_record() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let drive = SimulatedDrive::new(["disk0.bin", "disk1.bin"]).shared();
    let mut control = DiskControl::new();
    control.configure(capability_table(&drive, TableShape::Basic));

    assert!(!control.set_initial_index(CONTENT, Some(dir.path())));
    assert!(!control.verify_initial_index(true));
    assert!(control.unload_content());
    assert!(!record_path(dir.path()).exists());

    // Swapping still works
    control.set_eject_state(true, true).expect("eject");
    control.set_index_next(true).expect("next");
    assert_eq!(drive.borrow().image_index(), 1);
    assert_eq!(control.get_image_label(1), "");
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Next,
    Prev,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![Just(Step::Next), Just(Step::Prev)]
}

fn image_names(count: u32) -> Vec<String> {
    (0..count).map(|i| format!("disk{}.bin", i)).collect()
}

proptest! {
    #[test]
    fn prop_closed_tray_never_reaches_engine(count in 1u32..8, index in 0u32..16) {
        let drive = SimulatedDrive::new(image_names(count)).shared();
        let mut control = DiskControl::new();
        control.configure(capability_table(&drive, TableShape::Extended));

        let result = control.set_index(index, true);
        prop_assert!(matches!(result, Err(DiskControlError::TrayNotEjected)));
        prop_assert_eq!(drive.borrow().calls().set_image_index, 0);
        prop_assert_eq!(drive.borrow().image_index(), 0);
    }

    #[test]
    fn prop_next_and_prev_stay_in_range(
        count in 1u32..8,
        start in 0u32..10,
        steps in prop::collection::vec(step(), 1..20)
    ) {
        let drive = SimulatedDrive::new(image_names(count)).shared();
        let mut control = DiskControl::new();
        control.configure(capability_table(&drive, TableShape::Extended));
        control.set_eject_state(true, false).unwrap();
        control.set_index(start, false).unwrap();

        for step in steps {
            match step {
                Step::Next => control.set_index_next(false).unwrap(),
                Step::Prev => control.set_index_prev(false).unwrap(),
            }
            prop_assert!(control.get_image_index() < count);
        }
    }

    #[test]
    fn prop_failed_append_keeps_tray_state(
        count in 1u32..6,
        index_seed in 0u32..6,
        ejected in any::<bool>(),
        fail_add in any::<bool>()
    ) {
        let drive = SimulatedDrive::new(image_names(count)).shared();
        let mut control = DiskControl::new();
        control.configure(capability_table(&drive, TableShape::Extended));

        let index = index_seed % count;
        control.set_eject_state(true, false).unwrap();
        control.set_index(index, false).unwrap();
        control.set_eject_state(ejected, false).unwrap();

        if fail_add {
            drive.borrow_mut().faults.add_image_index = true;
        } else {
            drive.borrow_mut().faults.replace_image_index = true;
        }

        prop_assert!(control.append_image("/tmp/new.bin").is_err());
        prop_assert_eq!(control.get_eject_state(), ejected);
        prop_assert_eq!(control.get_image_index(), index);
    }

    #[test]
    fn prop_record_dirty_tracking(
        updates in prop::collection::vec((0u32..4, prop::sample::select(vec!["", "a.bin", "b.bin"])), 1..12)
    ) {
        let dir = TempDir::new().unwrap();
        let mut record = IndexRecord::init("game.m3u", Some(dir.path())).unwrap().unwrap();
        record.save().unwrap();
        prop_assert!(!record.is_dirty());

        for (index, path) in updates {
            let unchanged = record.image_index() == index && record.image_path() == path;
            let was_dirty = record.is_dirty();
            record.set(index, path);
            if unchanged {
                prop_assert_eq!(record.is_dirty(), was_dirty);
            } else {
                prop_assert!(record.is_dirty());
            }

            if index % 2 == 0 {
                record.save().unwrap();
                prop_assert!(!record.is_dirty());
                let stored = read_record(record.file_path()).unwrap();
                prop_assert_eq!(stored.image_index, record.image_index());
                prop_assert_eq!(stored.image_path.as_str(), record.image_path());
            }
        }
    }

    #[test]
    fn prop_first_run_accepts_any_path(path in "[a-z]{1,12}\\.(bin|chd|adf)") {
        let dir = TempDir::new().unwrap();
        let (drive, mut control) = drive_with(&[path.as_str(), "other.bin"]);
        prop_assert!(load(&mut control, &drive, dir.path()));
        prop_assert_eq!(control.index_record().unwrap().image_path(), path.as_str());
    }
}
