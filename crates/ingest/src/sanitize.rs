/// Decode bytes as UTF-8, dropping any sequence that does not decode.
///
/// Unlike `String::from_utf8_lossy` nothing is substituted in place of the
/// bad bytes; they simply disappear from the output.
pub fn sanitize_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Strip replacement characters left behind by an earlier lossy decode
/// (browser DOM snapshots, lossy HTTP bodies).
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}
