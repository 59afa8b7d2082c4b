use loadtach_hardware::FileStorage;
use loadtach_traits::NvStorage;
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn missing_file_reads_erased() {
    let dir = tempdir().unwrap();
    let mut st = FileStorage::open(dir.path().join("eeprom.bin"), 16).unwrap();
    let mut buf = [0u8; 16];
    st.read_block(0, &mut buf).unwrap();
    assert_eq!(buf, [0xFF; 16]);
}

#[rstest]
fn commit_persists_across_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    {
        let mut st = FileStorage::open(&path, 32).unwrap();
        st.write_block(4, &[9, 8, 7]).unwrap();
        st.commit().unwrap();
    }
    let mut st = FileStorage::open(&path, 32).unwrap();
    let mut buf = [0u8; 3];
    st.read_block(4, &mut buf).unwrap();
    assert_eq!(buf, [9, 8, 7]);
    assert_eq!(std::fs::read(&path).unwrap().len(), 32);
}

#[rstest]
fn uncommitted_write_is_lost() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    {
        let mut st = FileStorage::open(&path, 8).unwrap();
        st.write_block(0, &[1]).unwrap();
    }
    assert!(!path.exists());
}

#[rstest]
#[case(0, 9)]
#[case(8, 1)]
#[case(usize::MAX, 2)]
fn out_of_range_access_fails(#[case] addr: usize, #[case] len: usize) {
    let dir = tempdir().unwrap();
    let mut st = FileStorage::open(dir.path().join("e.bin"), 8).unwrap();
    let data = vec![0u8; len];
    let err = st.write_block(addr, &data).expect_err("range check");
    assert!(err.to_string().contains("out of range"));
}
