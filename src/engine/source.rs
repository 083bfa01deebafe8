// src/engine/source.rs

use std::collections::VecDeque;

use tokio::io::AsyncBufRead;

use crate::errors::Result;
use crate::input::{Record, RecordReader};

/// Records for the dispatcher: pulled lazily from the reader, or served from
/// memory when the run needed the whole input up front.
#[derive(Debug)]
pub enum RecordSource<R> {
    Streaming(RecordReader<R>),
    Buffered { records: VecDeque<Record>, total: u64 },
}

impl<R: AsyncBufRead + Unpin> RecordSource<R> {
    pub async fn load(reader: RecordReader<R>, buffer: bool) -> Result<Self> {
        if buffer {
            let records: VecDeque<Record> = reader.read_all().await?.into();
            let total = records.len() as u64;
            Ok(RecordSource::Buffered { records, total })
        } else {
            Ok(RecordSource::Streaming(reader))
        }
    }

    /// Total record count, known only when buffered.
    pub fn total(&self) -> Option<u64> {
        match self {
            RecordSource::Streaming(_) => None,
            RecordSource::Buffered { total, .. } => Some(*total),
        }
    }

    pub async fn next(&mut self) -> Result<Option<Record>> {
        match self {
            RecordSource::Streaming(reader) => reader.next_record().await,
            RecordSource::Buffered { records, .. } => Ok(records.pop_front()),
        }
    }
}
