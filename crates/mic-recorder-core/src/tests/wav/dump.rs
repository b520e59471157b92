use crate::{
    AudioError,
    wav::{RawDumpSink, SampleSink},
};

use std::{fs, io::Read};

/// WHAT: Appended bytes are readable after close
/// WHY: The finalizer consumes exactly what capture wrote
#[test]
fn given_appended_chunks_when_closed_then_dump_holds_them_in_order() {
    // Given: A sink in a temp directory
    let dir = tempfile::tempdir().unwrap();
    let mut sink = RawDumpSink::create_in(dir.path()).unwrap();

    // When: Appending two chunks and closing
    sink.append(&[1, 2, 3]).unwrap();
    sink.append(&[4, 5]).unwrap();
    assert_eq!(sink.bytes_written(), 5);
    let dump = sink.close().unwrap();

    // Then: The dump holds both chunks back to back
    let mut contents = Vec::new();
    dump.open().unwrap().read_to_end(&mut contents).unwrap();
    assert_eq!(contents, vec![1, 2, 3, 4, 5]);
    assert_eq!(dump.len(), 5);
}

/// WHAT: Dump files use the DMP prefix and .bin suffix
/// WHY: Leftover dumps are recognizable in the temp directory
#[test]
fn given_new_sink_when_created_then_name_marks_it_as_dump() {
    // Given/When: A new sink
    let dir = tempfile::tempdir().unwrap();
    let sink = RawDumpSink::create_in(dir.path()).unwrap();

    // Then: The file name carries the prefix and suffix
    let name = sink.path().file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("DMP"), "{}", name);
    assert!(name.ends_with(".bin"), "{}", name);
}

/// WHAT: Delete removes the dump; dropping an undeleted dump removes it too
/// WHY: The raw dump is ephemeral on every path
#[test]
fn given_closed_dumps_when_deleted_or_dropped_then_files_removed() {
    // Given: Two closed dumps
    let dir = tempfile::tempdir().unwrap();
    let kept = RawDumpSink::create_in(dir.path()).unwrap().close().unwrap();
    let dropped = RawDumpSink::create_in(dir.path()).unwrap().close().unwrap();
    let kept_path = kept.path().to_path_buf();
    let dropped_path = dropped.path().to_path_buf();
    assert!(kept_path.exists() && dropped_path.exists());

    // When: Deleting one and dropping the other
    kept.delete().unwrap();
    drop(dropped);

    // Then: Both files are gone
    assert!(!kept_path.exists());
    assert!(!dropped_path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// WHAT: Creating a sink in a missing directory is a file I/O error
/// WHY: Temp-file failures are reported as file errors naming the directory
#[test]
fn given_missing_directory_when_creating_sink_then_file_io_error() {
    // Given: A directory that does not exist
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    // When: Creating the sink
    let result = RawDumpSink::create_in(&missing);

    // Then: FileIo naming the directory, with a not-found cause
    match result {
        Err(AudioError::FileIo { path, source, .. }) => {
            assert_eq!(path, missing);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        Err(other) => unreachable!("expected FileIo, got {:?}", other),
        Ok(_) => unreachable!("sink created in a missing directory"),
    }
}
