//! Normalization of inbound client payloads into interpreter commands.
//!
//! Clients may send either raw protocol syntax (`<s>`) or the bare
//! convenience form (`s`). Both end up as a single bracketed command.

use std::fmt;

/// A trimmed command ready for the interpreter.
///
/// Always non-empty and always starts with `<`. When the normalizer wrapped
/// the payload itself it also ends with `>`; pre-bracketed input is passed
/// through as-is and the closing bracket is left to the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCommand(Vec<u8>);

impl NormalizedCommand {
    /// Raw command bytes, brackets included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Command length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for the `len`/`is_empty` pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

const fn is_trim_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r')
}

/// Normalizes a raw frame payload.
///
/// Returns `None` for an empty payload, a payload longer than
/// `max_len` bytes, or one that is blank after trimming spaces, `\n` and
/// `\r` from both ends. Anything from the first NUL byte on is ignored. Otherwise returns the trimmed text, wrapped in
/// `<`/`>` unless it already starts with `<`.
#[must_use]
pub fn normalize(raw: &[u8], max_len: usize) -> Option<NormalizedCommand> {
    if raw.is_empty() || raw.len() > max_len {
        return None;
    }
    let raw = match raw.iter().position(|&b| b == 0) {
        Some(nul) => raw.get(..nul)?,
        None => raw,
    };

    let start = raw.iter().position(|&b| !is_trim_byte(b))?;
    let end = raw.iter().rposition(|&b| !is_trim_byte(b))?;
    let trimmed = raw.get(start..=end)?;

    if trimmed.first() == Some(&b'<') {
        return Some(NormalizedCommand(trimmed.to_vec()));
    }

    let mut wrapped = Vec::with_capacity(trimmed.len() + 2);
    wrapped.push(b'<');
    wrapped.extend_from_slice(trimmed);
    wrapped.push(b'>');
    Some(NormalizedCommand(wrapped))
}
