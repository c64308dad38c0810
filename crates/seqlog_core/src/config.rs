//! Log configuration.

/// Configuration for opening a log.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Store size in bytes at which the active segment rotates.
    pub max_store_bytes: u64,

    /// Index capacity in bytes; also a rotation threshold.
    pub max_index_bytes: u64,

    /// Base offset assigned to the first segment of a fresh log.
    pub initial_offset: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_store_bytes: 1024,
            max_index_bytes: 1024,
            initial_offset: 0,
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store rotation threshold.
    #[must_use]
    pub const fn max_store_bytes(mut self, bytes: u64) -> Self {
        self.max_store_bytes = bytes;
        self
    }

    /// Sets the index capacity and rotation threshold.
    #[must_use]
    pub const fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.max_index_bytes = bytes;
        self
    }

    /// Sets the base offset for a fresh log's first segment.
    #[must_use]
    pub const fn initial_offset(mut self, offset: u64) -> Self {
        self.initial_offset = offset;
        self
    }

    /// Replaces zero size limits with the 1 KiB defaults.
    pub(crate) fn normalized(mut self) -> Self {
        if self.max_store_bytes == 0 {
            self.max_store_bytes = 1024;
        }
        if self.max_index_bytes == 0 {
            self.max_index_bytes = 1024;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.max_store_bytes, 1024);
        assert_eq!(config.max_index_bytes, 1024);
        assert_eq!(config.initial_offset, 0);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .max_store_bytes(64)
            .max_index_bytes(4096)
            .initial_offset(10);

        assert_eq!(config.max_store_bytes, 64);
        assert_eq!(config.max_index_bytes, 4096);
        assert_eq!(config.initial_offset, 10);
    }

    #[test]
    fn normalized_replaces_zeroes() {
        let config = Config::new().max_store_bytes(0).max_index_bytes(0);
        let normalized = config.normalized();

        assert_eq!(normalized.max_store_bytes, 1024);
        assert_eq!(normalized.max_index_bytes, 1024);
    }
}
