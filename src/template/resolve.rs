// src/template/resolve.rs

//! Pure string helpers behind each placeholder.

/// Split a record into fields.
///
/// An empty delimiter yields the whole record as the only field. Consecutive
/// delimiters are not merged, so `"a,,b"` split on `","` has three fields.
pub fn split_fields<'a>(text: &'a str, delimiter: &str) -> Vec<&'a str> {
    if delimiter.is_empty() {
        vec![text]
    } else {
        text.split(delimiter).collect()
    }
}

/// 1-based field lookup; out of range is empty.
pub fn field<'a>(text: &'a str, delimiter: &str, index: usize) -> &'a str {
    let fields = split_fields(text, delimiter);
    index
        .checked_sub(1)
        .and_then(|i| fields.get(i).copied())
        .unwrap_or("")
}

/// Field counted from the end (`1` is the last field); out of range is empty.
pub fn field_from_end<'a>(text: &'a str, delimiter: &str, index: usize) -> &'a str {
    let fields = split_fields(text, delimiter);
    fields
        .len()
        .checked_sub(index)
        .and_then(|i| fields.get(i).copied())
        .unwrap_or("")
}

/// Text after the last `/`, or the whole record.
pub fn basename(text: &str) -> &str {
    match text.rfind('/') {
        Some(i) => &text[i + 1..],
        None => text,
    }
}

/// Text before the last `/`, or `.` when there is none.
pub fn dirname(text: &str) -> &str {
    match text.rfind('/') {
        Some(i) => &text[..i],
        None => ".",
    }
}

/// Text after the last `.` of the basename; empty when it has no dot.
pub fn extension(text: &str) -> &str {
    let base = basename(text);
    match base.rfind('.') {
        Some(i) => &base[i + 1..],
        None => "",
    }
}

/// Basename with its extension removed.
pub fn basename_no_ext(text: &str) -> &str {
    let base = basename(text);
    match base.rfind('.') {
        Some(i) => &base[..i],
        None => base,
    }
}

/// Text before the last `.`, or the whole record when there is none.
pub fn strip_ext(text: &str) -> &str {
    match text.rfind('.') {
        Some(i) => &text[..i],
        None => text,
    }
}

/// Record length in characters (not bytes).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
