mod buffer;
mod format;
