use crate::{
    AudioError, AudioFormat,
    tests::support::pattern,
    wav::{RawDumpSink, SampleSink, WAV_HEADER_SIZE, finalize_file, write_container},
};

use std::{fs, io::Cursor};

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn container(raw: &[u8], format: &AudioFormat, seconds: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::<u8>::new());
    write_container(&mut Cursor::new(raw), &mut out, format, seconds).unwrap();
    out.into_inner()
}

/// WHAT: Empty dump with zero seconds yields a 44-byte header
/// WHY: Minimal recordings must still be well-formed
#[test]
fn given_empty_dump_and_zero_seconds_when_finalizing_then_header_only() {
    // Given: No raw bytes and no elapsed time
    let format = AudioFormat::default();

    // When: Writing the container
    let bytes = container(&[], &format, 0);

    // Then: 44 bytes, data size 0, RIFF size 36
    assert_eq!(bytes.len() as u64, WAV_HEADER_SIZE);
    assert_eq!(read_u32(&bytes, 40), 0);
    assert_eq!(read_u32(&bytes, 4), 36);
}

/// WHAT: Every header field is byte-exact for the session format
/// WHY: Players rely on the RIFF/WAVE layout
#[test]
fn given_default_format_when_finalizing_then_header_fields_exact() {
    // Given: 10 raw bytes
    let format = AudioFormat::default();

    // When: Writing the container
    let bytes = container(&pattern(10), &format, 0);

    // Then: Tags and fmt fields at their fixed offsets
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
    assert_eq!(&bytes[12..16], b"fmt ");
    assert_eq!(read_u32(&bytes, 16), 16);
    assert_eq!(read_u16(&bytes, 20), 1);
    assert_eq!(read_u16(&bytes, 22), 1);
    assert_eq!(read_u32(&bytes, 24), 44_100);
    assert_eq!(read_u32(&bytes, 28), 88_200);
    assert_eq!(read_u16(&bytes, 32), 2);
    assert_eq!(read_u16(&bytes, 34), 16);
    assert_eq!(&bytes[36..40], b"data");
}

/// WHAT: One second of audio round-trips through a real WAV reader
/// WHY: Declared size and payload agree when the duration matches
#[test]
fn given_one_second_dump_when_finalizing_then_hound_reads_same_samples() {
    // Given: 88200 bytes of 16-bit samples and one elapsed second
    let format = AudioFormat::default();
    let raw = pattern(88_200);

    // When: Writing the container
    let bytes = container(&raw, &format, 1);

    // Then: Sizes match and the payload is untouched
    assert_eq!(bytes.len(), 44 + 88_200);
    assert_eq!(read_u32(&bytes, 40), 88_200);
    assert_eq!(read_u32(&bytes, 4), 88_200 + 36);
    assert_eq!(&bytes[44..], raw.as_slice());

    // And: A real reader sees 44100 mono samples equal to the raw bytes
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.bits_per_sample, 16);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 44_100);
    assert_eq!(samples[1], i16::from_le_bytes([raw[2], raw[3]]));
}

/// WHAT: The data size is duration-derived, not payload-derived
/// WHY: Declared length follows elapsed seconds even when bytes differ
#[test]
fn given_payload_shorter_than_duration_when_finalizing_then_declared_from_seconds() {
    // Given: 1000 raw bytes but two elapsed seconds
    let format = AudioFormat::default();

    // When: Writing the container
    let bytes = container(&pattern(1000), &format, 2);

    // Then: Data size says two seconds, RIFF size says the real length
    assert_eq!(read_u32(&bytes, 40), 176_400);
    assert_eq!(read_u32(&bytes, 4), 1044 - 8);
    assert_eq!(bytes.len(), 1044);
}

/// WHAT: fmt fields follow a non-default format
/// WHY: Derived fields must match the descriptor wherever emitted
#[test]
fn given_stereo_format_when_finalizing_then_derived_fields_emitted() {
    // Given: 48 kHz stereo
    let format = AudioFormat::new(48_000, 2, 16).unwrap();

    // When: Writing the container
    let bytes = container(&[], &format, 0);

    // Then: Channels, byte rate and block align come from the descriptor
    assert_eq!(read_u16(&bytes, 22), 2);
    assert_eq!(read_u32(&bytes, 24), 48_000);
    assert_eq!(read_u32(&bytes, 28), 192_000);
    assert_eq!(read_u16(&bytes, 32), 4);
}

/// WHAT: A declared length beyond 32 bits is an error
/// WHY: Truncating the field would produce a corrupt header
#[test]
fn given_huge_duration_when_finalizing_then_container_overflow() {
    // Given: More seconds than a 32-bit data size can describe
    let format = AudioFormat::default();
    let mut out = Cursor::new(Vec::<u8>::new());

    // When: Writing the container
    let result = write_container(&mut Cursor::new(Vec::<u8>::new()), &mut out, &format, u32::MAX);

    // Then: Overflow is reported
    assert!(matches!(
        result,
        Err(AudioError::ContainerOverflow { .. })
    ));
}

/// WHAT: Finalizing a closed raw dump produces the container on disk
/// WHY: Exercises the file-to-file path used by the recorder
#[test]
fn given_raw_dump_when_finalizing_file_then_output_written() {
    // Given: A closed dump with 400 bytes
    let dir = tempfile::tempdir().unwrap();
    let mut sink = RawDumpSink::create_in(dir.path()).unwrap();
    sink.append(&pattern(400)).unwrap();
    let dump = sink.close().unwrap();
    let output = dir.path().join("out.wav");

    // When: Finalizing
    let summary = finalize_file(dump.path(), &output, &AudioFormat::default(), 0).unwrap();

    // Then: The file has header plus payload
    assert_eq!(summary.payload_len, 400);
    assert_eq!(summary.file_len, 444);
    assert_eq!(fs::metadata(&output).unwrap().len(), 444);
}

/// WHAT: A failed finalization deletes the partial output
/// WHY: No corrupt container is left behind
#[test]
fn given_overflowing_duration_when_finalizing_file_then_partial_output_removed() {
    // Given: A dump and a duration that cannot be declared
    let dir = tempfile::tempdir().unwrap();
    let mut sink = RawDumpSink::create_in(dir.path()).unwrap();
    sink.append(&pattern(16)).unwrap();
    let dump = sink.close().unwrap();
    let output = dir.path().join("out.wav");

    // When: Finalizing
    let result = finalize_file(dump.path(), &output, &AudioFormat::default(), u32::MAX);

    // Then: Error and no output file
    assert!(matches!(
        result,
        Err(AudioError::ContainerOverflow { .. })
    ));
    assert!(!output.exists());
}

/// WHAT: An unwritable output path surfaces as a file I/O error
/// WHY: File failures are distinguished from device failures
#[test]
fn given_missing_output_directory_when_finalizing_file_then_file_io_error() {
    // Given: A dump and an output path inside a missing directory
    let dir = tempfile::tempdir().unwrap();
    let dump = RawDumpSink::create_in(dir.path()).unwrap().close().unwrap();
    let output = dir.path().join("missing").join("out.wav");

    // When: Finalizing
    let result = finalize_file(dump.path(), &output, &AudioFormat::default(), 0);

    // Then: FileIo naming the output path
    match result {
        Err(AudioError::FileIo { path, .. }) => assert_eq!(path, output),
        other => unreachable!("expected FileIo, got {:?}", other),
    }
}
