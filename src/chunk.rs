use anyhow::{ensure, Result};

/// Splits `text` into consecutive pieces of at most `size` bytes.
///
/// Every piece but the last is exactly `size` bytes long as long as the text
/// is ASCII (base64 always is). For other text a piece ends early rather than
/// splitting a character. Joining the pieces in order gives back `text`.
pub fn split(text: &str, size: usize) -> Result<Vec<&str>> {
    ensure!(size > 0, "chunk size must be positive");
    ensure!(!text.is_empty(), "refusing to chunk an empty value");

    let mut chunks = Vec::with_capacity(text.len().div_ceil(size));
    let mut rest = text;
    while !rest.is_empty() {
        let mut end = rest.len().min(size);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        ensure!(end > 0, "chunk size {} is smaller than a character", size);

        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }

    Ok(chunks)
}
