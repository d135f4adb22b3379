//! Pulls a JSON object out of free-form model output.
//!
//! Models wrap their JSON in prose or code fences. Rather than slicing from
//! the first `{` to the last `}`, which breaks as soon as the prose contains
//! braces of its own, the scanner walks balanced top-level `{...}` spans
//! (ignoring braces inside string literals) and returns the first span that
//! parses as a JSON object.

use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Found(Map<String, Value>),
    /// Balanced spans exist, none of them is a JSON object.
    Invalid,
    /// No balanced `{...}` span at all.
    Missing,
}

/// Byte ranges (start, end exclusive) of balanced top-level brace spans.
pub fn object_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut from = 0;

    while let Some((start, end)) = next_span(bytes, from) {
        spans.push((start, end));
        from = end;
    }

    spans
}

pub fn find_json_object(text: &str) -> ScanOutcome {
    let spans = object_spans(text);
    if spans.is_empty() {
        return ScanOutcome::Missing;
    }

    for (start, end) in spans {
        match serde_json::from_str::<Value>(&text[start..end]) {
            Ok(Value::Object(map)) => return ScanOutcome::Found(map),
            Ok(_) => {}
            Err(e) => debug!(start, end, error = %e, "Skipping unparsable span"),
        }
    }

    ScanOutcome::Invalid
}

// An opening brace that never closes is skipped and scanning resumes just
// after it.
fn next_span(bytes: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut search = from;
    loop {
        let open = search + bytes.get(search..)?.iter().position(|&b| b == b'{')?;
        if let Some(end) = balanced_end(bytes, open) {
            return Some((open, end));
        }
        search = open + 1;
    }
}

fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
