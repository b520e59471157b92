mod dump;
mod finalizer;

pub use {
    dump::{RawDump, RawDumpSink, SampleSink},
    finalizer::{
        ContainerSummary, RIFF_SIZE_OFFSET, WAV_HEADER_SIZE, finalize_file, write_container,
    },
};
