//! Form body encoding.
//!
//! The escaping rule is a wire contract with the server's form decoder: ASCII alphanumerics and
//! `- _ . ~` pass through, space becomes `+`, every other byte of the UTF-8 encoding becomes `%XX`.

use std::fmt::{self, Write};

/// Percent-encodes `input` for an `application/x-www-form-urlencoded` body.
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

/// Ordered `key=value` pairs; values are escaped on output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Pushes `value` only when present and non-empty.
    pub fn push_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.push(key, v),
            _ => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for FormParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_char('&')?;
            }
            write!(f, "{}={}", key, percent_encode(value))?;
        }
        Ok(())
    }
}
