#![no_main]

use libfuzzer_sys::fuzz_target;
use shsl_rs::ArchiveReader;
use std::io::Write;
use tempfile::NamedTempFile;

fuzz_target!(|data: &[u8]| {
    // Skip inputs shorter than the fixed header plus the file count
    if data.len() < 20 {
        return;
    }

    let mut temp_file = match NamedTempFile::new() {
        Ok(f) => f,
        Err(_) => return,
    };

    if temp_file.write_all(data).is_err() || temp_file.flush().is_err() {
        return;
    }

    // Opening must fail cleanly on garbage, never panic
    let mut reader = match ArchiveReader::open(temp_file.path()) {
        Ok(r) => r,
        Err(_) => return,
    };

    assert!(reader.header_size() <= data.len() as u64);

    // Every entry either reads in full or reports an error
    for index in 0..reader.file_count() {
        if let Ok(bytes) = reader.read_file(index) {
            assert_eq!(Some(bytes.len() as u64), reader.file_size(index));
        }
    }

    let dirs: Vec<String> = reader.dirs().iter().map(|d| d.path.clone()).collect();
    for dir in &dirs {
        let _ = reader.list_dir(dir, false);
    }

    let _ = reader.contains("");
    let _ = reader.contains("/");
    let _ = reader.contains("../../../etc/passwd");
});
