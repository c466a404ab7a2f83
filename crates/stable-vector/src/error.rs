//! Error types for allocation, element construction and configuration.

use std::alloc::Layout;
use std::convert::Infallible;
use std::error::Error;
use std::fmt;

/// Failure to obtain storage for a new block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The allocator could not satisfy the request.
    Exhausted {
        /// The layout that was requested.
        layout: Layout,
    },
    /// The block size does not fit in the address space.
    CapacityOverflow,
}

impl AllocError {
    /// Report the failure the way the standard collections do: abort through
    /// [`std::alloc::handle_alloc_error`] on exhaustion, panic on overflow.
    pub fn handle(self) -> ! {
        match self {
            Self::Exhausted { layout } => std::alloc::handle_alloc_error(layout),
            Self::CapacityOverflow => panic!("stable vector capacity overflow"),
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { layout } => write!(
                f,
                "memory allocation of {} bytes (align {}) failed",
                layout.size(),
                layout.align()
            ),
            Self::CapacityOverflow => write!(f, "capacity overflow"),
        }
    }
}

impl Error for AllocError {}

/// Failure of a fallible append: either no block could be allocated or the
/// element itself could not be constructed.
///
/// In both cases the container is left exactly as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmplaceError<E> {
    /// Storage for the element could not be allocated.
    Alloc(AllocError),
    /// The element constructor reported an error.
    Construct(E),
}

impl<E> EmplaceError<E> {
    /// The constructor error, if that is what failed.
    pub fn into_construct(self) -> Option<E> {
        match self {
            Self::Construct(e) => Some(e),
            Self::Alloc(_) => None,
        }
    }
}

impl EmplaceError<Infallible> {
    /// With an infallible constructor only allocation can fail; report it
    /// through [`AllocError::handle`].
    pub(crate) fn handle(self) -> ! {
        match self {
            Self::Alloc(e) => e.handle(),
            Self::Construct(never) => match never {},
        }
    }
}

impl<E> From<AllocError> for EmplaceError<E> {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

impl<E: fmt::Display> fmt::Display for EmplaceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "{e}"),
            Self::Construct(e) => write!(f, "element construction failed: {e}"),
        }
    }
}

impl<E: Error + 'static> Error for EmplaceError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Alloc(e) => Some(e),
            Self::Construct(e) => Some(e),
        }
    }
}

/// Rejected [`MonotonicConfig`](crate::config::MonotonicConfig) values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The first chunk must hold at least one byte.
    ZeroInitialChunk,
    /// The chunk size ceiling is below the first chunk size.
    MaxBelowInitial {
        /// Configured initial chunk size in bytes.
        initial: usize,
        /// Configured maximum chunk size in bytes.
        max: usize,
    },
    /// Chunk sizes must not shrink between refills.
    ZeroGrowthFactor,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInitialChunk => write!(f, "initial chunk size must be non-zero"),
            Self::MaxBelowInitial { initial, max } => write!(
                f,
                "max chunk size {max} bytes is below initial chunk size {initial} bytes"
            ),
            Self::ZeroGrowthFactor => write!(f, "growth factor must be at least 1"),
        }
    }
}

impl Error for ConfigError {}
