//! Arena configuration parameters.

/// Configuration for a [`ScratchArena`](crate::ScratchArena).
///
/// Immutable after the arena is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the first chunk in bytes. Later chunks double in size up to
    /// [`ArenaConfig::MAX_GROWTH_CHUNK`], or are sized to fit a single
    /// oversized request.
    ///
    /// Default: 4096.
    pub chunk_size: usize,

    /// Upper bound on the total bytes of chunk storage, or `None` for no
    /// limit.
    ///
    /// Default: `None`.
    pub max_bytes: Option<usize>,
}

impl ArenaConfig {
    /// Default first-chunk size in bytes.
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;

    /// Geometric growth stops at this chunk size (1 MiB).
    pub const MAX_GROWTH_CHUNK: usize = 1 << 20;

    /// Create a config with the given first-chunk size and no byte limit.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            max_bytes: None,
        }
    }

    /// Cap total chunk storage at `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Size of the chunk to allocate after one of `previous` bytes, large
    /// enough for a request of `needed` bytes.
    pub(crate) fn next_chunk_size(&self, previous: Option<usize>, needed: usize) -> usize {
        let grown = match previous {
            Some(prev) => prev.saturating_mul(2).min(Self::MAX_GROWTH_CHUNK),
            None => self.chunk_size,
        };
        grown.max(self.chunk_size).max(needed)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded_4k() {
        let config = ArenaConfig::default();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.max_bytes, None);
    }

    #[test]
    fn chunks_double_then_cap() {
        let config = ArenaConfig::new(1024);
        assert_eq!(config.next_chunk_size(None, 16), 1024);
        assert_eq!(config.next_chunk_size(Some(1024), 16), 2048);
        assert_eq!(
            config.next_chunk_size(Some(ArenaConfig::MAX_GROWTH_CHUNK), 16),
            ArenaConfig::MAX_GROWTH_CHUNK
        );
    }

    #[test]
    fn oversized_request_gets_exact_fit() {
        let config = ArenaConfig::new(64);
        assert_eq!(config.next_chunk_size(Some(64), 10_000), 10_000);
    }
}
