//! Document corpus: folder sources for the bootstrap, upload ingest and original files.

pub mod handlers;
pub mod ingest;
pub mod originals;
pub mod source;
