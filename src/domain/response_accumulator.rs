//! Re-fragmentation of streamed interpreter output into client messages.
//!
//! The interpreter writes its reply one byte at a time. [`ResponseAccumulator`]
//! collects those bytes in a small fixed buffer and hands a complete text
//! message to the client on every line terminator, whenever the buffer is
//! about to overflow, and once more when the command has finished.

use super::ClientLink;
use crate::interpreter::ResponseSink;

/// Smallest usable buffer: one payload byte, one byte of headroom and the
/// slot reserved for the terminator.
pub const MIN_CAPACITY: usize = 3;

/// Output sink bound to one connection for the duration of one command.
///
/// # Invariants
///
/// - The buffered length never exceeds `capacity - 1`.
/// - The buffer never contains a NUL byte; NULs written by the interpreter
///   are discarded.
/// - Concatenating every emitted message yields exactly the non-NUL bytes
///   written, as long as none were dropped on a full buffer.
/// - A UTF-8 sequence cut by an intermediate flush is carried into the next
///   message instead of being split. Only the final [`flush`](Self::flush)
///   replaces invalid bytes with U+FFFD.
#[derive(Debug)]
pub struct ResponseAccumulator<'a, L: ClientLink + ?Sized> {
    link: &'a L,
    buffer: Vec<u8>,
    capacity: usize,
    emitted: usize,
}

impl<'a, L: ClientLink + ?Sized> ResponseAccumulator<'a, L> {
    /// Creates an accumulator sending to `link`.
    ///
    /// `capacity` is clamped to at least [`MIN_CAPACITY`].
    #[must_use]
    pub fn new(link: &'a L, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            link,
            buffer: Vec::with_capacity(capacity),
            capacity,
            emitted: 0,
        }
    }

    /// Appends one byte, flushing on `\n` or when the buffer is two bytes
    /// short of capacity.
    pub fn write(&mut self, byte: u8) {
        if byte == 0 || self.buffer.len() >= self.capacity - 1 {
            return;
        }
        self.buffer.push(byte);
        if byte == b'\n' || self.buffer.len() >= self.capacity - 2 {
            self.emit(false);
        }
    }

    /// Writes every byte of `bytes` in order.
    pub fn write_block(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write(byte);
        }
    }

    /// Emits buffered bytes as one message and resets the buffer.
    ///
    /// Does nothing when the buffer is empty. If the connection is no longer
    /// live the buffered bytes are discarded.
    pub fn flush(&mut self) {
        self.emit(true);
    }

    /// Sends the buffer as one message.
    ///
    /// Unless `last`, a trailing incomplete UTF-8 sequence stays buffered
    /// for the next message. It is sent anyway when nothing precedes it, so
    /// the buffer always regains room.
    fn emit(&mut self, last: bool) {
        let held = if last {
            0
        } else {
            incomplete_tail(&self.buffer)
        };
        let cut = match self.buffer.len() - held {
            0 => self.buffer.len(),
            n => n,
        };
        if cut == 0 {
            return;
        }
        let chunk: Vec<u8> = self.buffer.drain(..cut).collect();
        if self.link.is_live() && self.link.send_text(&String::from_utf8_lossy(&chunk)) {
            self.emitted += 1;
        } else {
            self.buffer.clear();
        }
    }

    /// Number of bytes currently buffered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Number of messages delivered so far.
    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.emitted
    }
}

/// Length of a UTF-8 sequence at the end of `bytes` that still misses
/// continuation bytes, or 0.
fn incomplete_tail(bytes: &[u8]) -> usize {
    for (i, &byte) in bytes.iter().rev().take(3).enumerate() {
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let needed = match byte {
            0xF0..=0xF7 => 4,
            0xE0..=0xEF => 3,
            0xC0..=0xDF => 2,
            _ => 1,
        };
        return if needed > i + 1 { i + 1 } else { 0 };
    }
    0
}

impl<L: ClientLink + ?Sized> ResponseSink for ResponseAccumulator<'_, L> {
    fn write_byte(&mut self, byte: u8) {
        self.write(byte);
    }

    fn write_block(&mut self, bytes: &[u8]) {
        ResponseAccumulator::write_block(self, bytes);
    }

    fn flush(&mut self) {
        ResponseAccumulator::flush(self);
    }
}
