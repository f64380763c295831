//! Admission control for concurrent client connections.
//!
//! [`ConnectionRegistry`] only counts. It is owned by the bridge actor and
//! mutated from that single task, so it carries no lock.

/// Tracks the number of admitted connections against a fixed ceiling.
///
/// # Invariant
///
/// `0 <= current_count() <= ceiling()` after every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRegistry {
    count: usize,
    ceiling: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry admitting at most `ceiling` connections.
    #[must_use]
    pub const fn new(ceiling: usize) -> Self {
        Self { count: 0, ceiling }
    }

    /// Admits one connection if there is room.
    ///
    /// Returns `false`, leaving the count untouched, when the registry is
    /// already at its ceiling.
    pub fn admit(&mut self) -> bool {
        if self.count >= self.ceiling {
            return false;
        }
        self.count += 1;
        true
    }

    /// Releases one admitted connection. Saturates at zero.
    pub fn release(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    /// Forgets every admitted connection.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Number of currently admitted connections.
    #[must_use]
    pub const fn current_count(&self) -> usize {
        self.count
    }

    /// Maximum number of concurrent connections.
    #[must_use]
    pub const fn ceiling(&self) -> usize {
        self.ceiling
    }
}
