use loadtach_core::calibration::{CalibrationStore, RECORD_LEN};
use loadtach_core::{Calibration, DeviceError, Shared};
use loadtach_hardware::MemoryStorage;
use proptest::prelude::*;
use rstest::rstest;

proptest! {
    #[test]
    fn save_then_load_returns_same_pair(
        slope in -1.0e6f32..1.0e6f32,
        tare in any::<i32>(),
        address in 0usize..=44,
    ) {
        let live = Shared::new(Calibration::DEFAULT);
        let storage = MemoryStorage::new(64);
        let mut store = CalibrationStore::new(storage.clone(), address, &live);
        let cal = Calibration::new(slope, tare);
        store.save(cal).unwrap();

        let mut rebooted = CalibrationStore::new(storage.reopen(), address, &live);
        let loaded = rebooted.load().unwrap();
        prop_assert_eq!(loaded.slope.to_bits(), slope.to_bits());
        prop_assert_eq!(loaded.tare, tare);
    }

    #[test]
    fn any_single_byte_flip_invalidates(
        slope in -1.0e3f32..1.0e3f32,
        tare in any::<i32>(),
        index in 0usize..RECORD_LEN,
        mask in 1u8..=255,
    ) {
        let live = Shared::new(Calibration::new(7.5, 77));
        let storage = MemoryStorage::new(64);
        let mut store = CalibrationStore::new(storage.clone(), 0, &live);
        store.save(Calibration::new(slope, tare)).unwrap();

        storage.corrupt(index, mask);
        let mut rebooted = CalibrationStore::new(storage.reopen(), 0, &live);
        let err = rebooted.load().unwrap_err();
        prop_assert!(matches!(err, DeviceError::Record(_)), "unexpected error: {err:?}");
        prop_assert_eq!(live.get(), Calibration::new(7.5, 77));
    }
}

#[rstest]
#[case::zeroed(vec![0u8; 64])]
#[case::erased(vec![0xFFu8; 64])]
fn init_on_blank_storage_persists_defaults(#[case] image: Vec<u8>) {
    let live = Shared::new(Calibration::new(1.0, 1));
    let storage = MemoryStorage::with_image(image);
    let mut store = CalibrationStore::new(storage.clone(), 0, &live);

    assert_eq!(store.init(), loadtach_core::BootSource::Defaults);
    assert_eq!(live.get(), Calibration::DEFAULT);
    assert_eq!(storage.commit_count(), 1);

    let mut rebooted = CalibrationStore::new(storage.reopen(), 0, &live);
    assert_eq!(rebooted.load().unwrap(), Calibration::DEFAULT);
}

#[rstest]
fn init_applies_valid_record_without_writing() {
    let live = Shared::new(Calibration::DEFAULT);
    let storage = MemoryStorage::new(64);
    CalibrationStore::new(storage.clone(), 8, &live)
        .save(Calibration::new(0.25, -300))
        .unwrap();
    let commits = storage.commit_count();

    let mut store = CalibrationStore::new(storage.reopen(), 8, &live);
    assert_eq!(store.init(), loadtach_core::BootSource::Stored);
    assert_eq!(live.get(), Calibration::new(0.25, -300));
    assert_eq!(storage.commit_count(), commits);
}

#[rstest]
fn failed_save_keeps_live_value() {
    let live = Shared::new(Calibration::DEFAULT);
    let storage = MemoryStorage::new(64);
    let mut store = CalibrationStore::new(storage.clone(), 0, &live);
    store.init();

    storage.set_fail_writes(true);
    store.apply(Calibration::new(3.0, 3));
    assert_eq!(live.get(), Calibration::new(3.0, 3));

    let mut rebooted = CalibrationStore::new(storage.reopen(), 0, &live);
    assert_eq!(rebooted.load().unwrap(), Calibration::DEFAULT);
}

#[rstest]
fn record_past_end_of_storage_is_a_storage_error() {
    let live = Shared::new(Calibration::DEFAULT);
    let mut store = CalibrationStore::new(MemoryStorage::new(64), 50, &live);
    assert!(matches!(store.load(), Err(DeviceError::Storage(_))));
    assert!(matches!(
        store.save(Calibration::DEFAULT),
        Err(DeviceError::Storage(_))
    ));
}
