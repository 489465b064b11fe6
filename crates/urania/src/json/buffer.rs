use crate::json::escape::escape_into;
use crate::json::record::{write_value, Record, Value};
use std::fmt;
use std::ops::Deref;

/// A finished JSON document, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedJson(String);

impl OwnedJson {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for OwnedJson {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OwnedJson {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnedJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The top-level `{ "error": true, "error_msg": ... }` document.
pub fn error_document(message: &str) -> OwnedJson {
    let mut text = String::with_capacity(message.len() + 40);
    text.push_str("{ \"error\": true, \"error_msg\": \"");
    escape_into(&mut text, message);
    text.push_str("\" }");
    OwnedJson(text)
}

/// Append-only document writer with a byte capacity.
///
/// Objects render as `{ "k": v, "k2": v2 }` and arrays as `[ a, b ]`. The
/// writer never refuses text; callers consult [`JsonBuffer::near_limit`] to
/// stop early and [`JsonBuffer::finish`] rejects documents over capacity.
#[derive(Debug)]
pub struct JsonBuffer {
    text: String,
    capacity: usize,
    margin: usize,
    // one entry per open object: whether it already has a member
    members: Vec<bool>,
}

impl JsonBuffer {
    pub fn new(capacity: usize, margin: usize) -> Self {
        Self {
            text: String::with_capacity(capacity.min(1 << 16)),
            capacity,
            margin,
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once the text has grown past `capacity - margin`.
    pub fn near_limit(&self) -> bool {
        self.text.len() > self.capacity.saturating_sub(self.margin)
    }

    pub fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub fn begin_object(&mut self) {
        self.text.push_str("{ ");
        self.members.push(false);
    }

    pub fn end_object(&mut self) {
        match self.members.pop() {
            Some(true) => self.text.push_str(" }"),
            _ => self.text.push('}'),
        }
    }

    /// Start a member of the innermost open object.
    pub fn key(&mut self, key: &str) {
        if let Some(has_members) = self.members.last_mut() {
            if *has_members {
                self.text.push_str(", ");
            }
            *has_members = true;
        }
        self.text.push('"');
        escape_into(&mut self.text, key);
        self.text.push_str("\": ");
    }

    pub fn value(&mut self, value: &Value<'_>) {
        write_value(&mut self.text, value);
    }

    pub fn field(&mut self, key: &str, value: Value<'_>) {
        self.key(key);
        self.value(&value);
    }

    pub fn record(&mut self, record: &Record<'_>) {
        record.write(&mut self.text);
    }

    pub fn begin_array(&mut self) {
        self.text.push_str("[ ");
    }

    /// One array element followed by `", "`, or `" "` when it is the last.
    pub fn element(&mut self, record: &Record<'_>, is_last: bool) {
        self.record(record);
        self.text.push_str(if is_last { " " } else { ", " });
    }

    pub fn end_array(&mut self) {
        self.text.push(']');
    }

    /// Seal the document, or replace it with an error document when it
    /// overran its capacity.
    pub fn finish(self) -> OwnedJson {
        if self.text.len() > self.capacity {
            log::warn!(
                "Output of {} bytes exceeds capacity {}",
                self.text.len(),
                self.capacity
            );
            return error_document(&format!(
                "Output exceeds buffer capacity of {} bytes",
                self.capacity
            ));
        }
        OwnedJson(self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_layout() {
        let mut buf = JsonBuffer::new(1000, 100);
        buf.begin_object();
        buf.field("a", Value::Int(1));
        buf.key("b");
        buf.begin_object();
        buf.end_object();
        buf.key("c");
        buf.begin_array();
        buf.end_array();
        buf.end_object();
        assert_eq!(buf.finish().as_str(), r#"{ "a": 1, "b": { }, "c": [ ] }"#);
    }

    #[test]
    fn test_array_separators() {
        let mut buf = JsonBuffer::new(1000, 100);
        buf.begin_array();
        buf.element(&Record::Warning("x"), false);
        buf.element(&Record::Warning("y"), true);
        buf.end_array();
        assert_eq!(
            buf.finish().as_str(),
            r#"[ { "warning": "x" }, { "warning": "y" } ]"#
        );
    }

    #[test]
    fn test_near_limit_uses_margin() {
        let mut buf = JsonBuffer::new(20, 10);
        buf.push_str("0123456789");
        assert!(!buf.near_limit());
        buf.push_str("0");
        assert!(buf.near_limit());
    }

    #[test]
    fn test_overrun_becomes_error_document() {
        let mut buf = JsonBuffer::new(8, 0);
        buf.push_str("{ \"long\": 1 }");
        let doc = buf.finish();
        assert!(doc.starts_with("{ \"error\": true"));
        assert!(doc.contains("capacity of 8 bytes"));
    }

    #[test]
    fn test_error_document_escapes() {
        let doc = error_document("bad \"path\"");
        assert_eq!(doc.as_str(), r#"{ "error": true, "error_msg": "bad \"path\"" }"#);
    }
}
