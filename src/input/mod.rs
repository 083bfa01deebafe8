// src/input/mod.rs

//! Input side: turning the byte stream on stdin into [`Record`]s.

pub mod reader;
pub mod record;

pub use reader::RecordReader;
pub use record::Record;
