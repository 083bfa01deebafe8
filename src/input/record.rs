// src/input/record.rs

/// One unit of input: a line or a NUL-terminated chunk.
///
/// Immutable once read. `number` is the 1-based job number, assigned in
/// arrival order and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub number: u64,
    /// Raw bytes without the terminator.
    pub bytes: Vec<u8>,
    /// Lossy UTF-8 view used for expansion.
    pub text: String,
}

impl Record {
    pub fn new(number: u64, bytes: Vec<u8>) -> Self {
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Self {
            number,
            bytes,
            text,
        }
    }

    /// The text commands see: trimmed or as read.
    pub fn value(&self, trim: bool) -> &str {
        if trim { self.text.trim() } else { &self.text }
    }

    /// Bytes written to a child's stdin in `--stdin` mode, newline terminated.
    pub fn stdin_payload(&self, trim: bool) -> Vec<u8> {
        let mut payload = if trim {
            self.value(true).as_bytes().to_vec()
        } else {
            self.bytes.clone()
        };
        payload.push(b'\n');
        payload
    }
}
