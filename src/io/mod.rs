//! I/O module for reading and writing Microstation design files

pub mod dgn;

pub use dgn::{DgnFile, DgnReaderConfiguration};
