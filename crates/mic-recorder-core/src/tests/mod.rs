#![allow(clippy::unwrap_used, clippy::expect_used)]

mod audio;
mod support;
mod wav;
