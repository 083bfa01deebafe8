// src/input/reader.rs

//! Lazy, forward-only record reader.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::errors::Result;
use crate::input::Record;
use crate::types::RecordDelimiter;

/// Reads records one at a time from an async byte stream.
///
/// - The terminator is chosen by the caller, never guessed.
/// - Trailing content without a terminator is still a record.
/// - In newline mode a `\r` right before the `\n` is dropped too.
/// - Any other byte, including control bytes and invalid UTF-8, is content.
#[derive(Debug)]
pub struct RecordReader<R> {
    reader: R,
    delimiter: RecordDelimiter,
    last_number: u64,
    exhausted: bool,
}

impl<R: AsyncBufRead + Unpin> RecordReader<R> {
    pub fn new(reader: R, delimiter: RecordDelimiter) -> Self {
        Self {
            reader,
            delimiter,
            last_number: 0,
            exhausted: false,
        }
    }

    /// Next record, or `None` at end of stream.
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        if self.exhausted {
            return Ok(None);
        }

        let term = self.delimiter.byte();
        let mut buf = Vec::new();
        let n = self.reader.read_until(term, &mut buf).await?;
        if n == 0 {
            self.exhausted = true;
            return Ok(None);
        }

        if buf.last() == Some(&term) {
            buf.pop();
            if self.delimiter == RecordDelimiter::Newline && buf.last() == Some(&b'\r') {
                buf.pop();
            }
        } else {
            self.exhausted = true;
        }

        self.last_number += 1;
        Ok(Some(Record::new(self.last_number, buf)))
    }

    /// Drain the remaining stream into memory.
    pub async fn read_all(mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn texts(input: &[u8], delimiter: RecordDelimiter) -> Vec<String> {
        RecordReader::new(input, delimiter)
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.text)
            .collect()
    }

    #[tokio::test]
    async fn newline_records() {
        assert_eq!(texts(b"foo\nbar\n", RecordDelimiter::Newline).await, vec!["foo", "bar"]);
    }

    #[tokio::test]
    async fn unterminated_tail_is_a_record() {
        assert_eq!(texts(b"foo\nbar", RecordDelimiter::Newline).await, vec!["foo", "bar"]);
    }

    #[tokio::test]
    async fn empty_input_yields_nothing() {
        assert!(texts(b"", RecordDelimiter::Newline).await.is_empty());
        assert!(texts(b"", RecordDelimiter::Nul).await.is_empty());
    }

    #[tokio::test]
    async fn blank_lines_are_records() {
        assert_eq!(texts(b"a\n\nb\n", RecordDelimiter::Newline).await, vec!["a", "", "b"]);
    }

    #[tokio::test]
    async fn crlf_is_stripped() {
        assert_eq!(texts(b"a\r\nb\r\n", RecordDelimiter::Newline).await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn nul_records_keep_newlines() {
        assert_eq!(
            texts(b"one\ntwo\0three\0", RecordDelimiter::Nul).await,
            vec!["one\ntwo", "three"]
        );
    }

    #[tokio::test]
    async fn binary_content_does_not_shift_boundaries() {
        let input = [0x01, 0xff, b'\t', b'\n', 0x00, b'x', b'\n'];
        let records = RecordReader::new(&input[..], RecordDelimiter::Newline)
            .read_all()
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bytes, vec![0x01, 0xff, b'\t']);
        assert_eq!(records[1].bytes, vec![0x00, b'x']);
    }

    #[tokio::test]
    async fn numbers_follow_arrival_order() {
        let mut reader = RecordReader::new(&b"a\nb\nc"[..], RecordDelimiter::Newline);
        let mut numbers = Vec::new();
        while let Some(r) = reader.next_record().await.unwrap() {
            numbers.push(r.number);
        }
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(reader.next_record().await.unwrap().is_none());
    }
}
