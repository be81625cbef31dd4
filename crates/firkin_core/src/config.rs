//! Engine configuration.

/// Configuration for opening an engine.
///
/// The data directory is passed to [`crate::Engine::open`] directly; only
/// tunables live here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum size of the active segment, in bytes. Once an append pushes
    /// the active segment to or past this size, it is sealed and a fresh
    /// segment is created. The threshold is compared after each append, so
    /// a single oversized record still lands in one segment.
    pub max_segment_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_segment_size: 16 * 1024 * 1024, // 16 MiB
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum segment size in bytes.
    #[must_use]
    pub const fn max_segment_size(mut self, size: u64) -> Self {
        self.max_segment_size = size;
        self
    }
}
