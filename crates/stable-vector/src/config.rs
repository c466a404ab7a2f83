//! Monotonic arena configuration parameters.

use crate::error::ConfigError;

/// Chunk sizing for a [`MonotonicResource`](crate::pmr::MonotonicResource).
///
/// The first chunk holds `initial_chunk_bytes`; each refill multiplies the
/// previous size by `growth_factor`, capped at `max_chunk_bytes`. A request
/// larger than the next chunk size gets a chunk of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonotonicConfig {
    /// Size of the first chunk in bytes.
    ///
    /// Default: 4096.
    pub initial_chunk_bytes: usize,

    /// Ceiling on the size of geometrically grown chunks, in bytes.
    ///
    /// Default: 16 MiB.
    pub max_chunk_bytes: usize,

    /// Multiplier applied to the chunk size after every refill.
    ///
    /// Default: 2. A factor of 1 keeps chunks at a fixed size.
    pub growth_factor: usize,
}

impl MonotonicConfig {
    /// Default first chunk size.
    pub const DEFAULT_INITIAL_CHUNK_BYTES: usize = 4096;

    /// Default chunk size ceiling: 16 MiB.
    pub const DEFAULT_MAX_CHUNK_BYTES: usize = 1 << 24;

    /// Default growth factor.
    pub const DEFAULT_GROWTH_FACTOR: usize = 2;

    /// Create a config with the given first chunk size and default growth.
    pub fn new(initial_chunk_bytes: usize) -> Self {
        Self {
            initial_chunk_bytes,
            max_chunk_bytes: Self::DEFAULT_MAX_CHUNK_BYTES.max(initial_chunk_bytes),
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
        }
    }

    /// Check the parameters for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_chunk_bytes == 0 {
            return Err(ConfigError::ZeroInitialChunk);
        }
        if self.max_chunk_bytes < self.initial_chunk_bytes {
            return Err(ConfigError::MaxBelowInitial {
                initial: self.initial_chunk_bytes,
                max: self.max_chunk_bytes,
            });
        }
        if self.growth_factor == 0 {
            return Err(ConfigError::ZeroGrowthFactor);
        }
        Ok(())
    }

    /// Chunk size to use after a chunk of `current` bytes.
    pub fn next_chunk_bytes(&self, current: usize) -> usize {
        current
            .saturating_mul(self.growth_factor)
            .min(self.max_chunk_bytes)
    }
}

impl Default for MonotonicConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CHUNK_BYTES)
    }
}
