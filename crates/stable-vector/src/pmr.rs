//! Runtime-selected memory resources.
//!
//! [`PolymorphicAlloc`] is a [`BlockAlloc`] that forwards to a shared
//! `dyn` [`MemoryResource`], so vectors drawing from different resources
//! have the same type. Two handles are equal when they name the same
//! resource (or the resources declare themselves equal), which decides
//! whether a move can adopt blocks or must transfer elements one by one.
//!
//! ```
//! use std::sync::Arc;
//! use stable_vector::pmr::{self, MonotonicResource, PolymorphicAlloc};
//!
//! let arena = Arc::new(MonotonicResource::default());
//! let mut v: pmr::StableVec<u32> = pmr::StableVec::new_in(PolymorphicAlloc::new(arena.clone()));
//! v.extend(0..100);
//! assert_eq!(arena.chunk_count(), 1);
//! ```

use std::alloc::Layout;
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::alloc::{BlockAlloc, Global};
use crate::config::MonotonicConfig;
use crate::error::{AllocError, ConfigError};

/// A [`StableVec`](crate::StableVec) whose allocator is chosen at runtime.
pub type StableVec<T> = crate::StableVec<T, PolymorphicAlloc>;

/// A source of raw memory that can be shared between containers.
pub trait MemoryResource: Send + Sync {
    /// Allocate storage for `layout`.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Release storage obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this resource (or one it is equal
    /// to) with the same `layout`, and must not have been released already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Whether memory from `self` can be released through `other`.
    ///
    /// Defaults to identity.
    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        ptr::addr_eq(self as *const Self, other as *const dyn MemoryResource)
    }
}

/// The process allocator as a [`MemoryResource`].
#[derive(Debug)]
pub struct NewDeleteResource {
    _private: (),
}

impl MemoryResource for NewDeleteResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller; `allocate` used `Global`.
        unsafe { Global.deallocate(ptr, layout) }
    }
}

/// The shared default resource, backed by the process allocator.
pub fn new_delete_resource() -> Arc<dyn MemoryResource> {
    static DEFAULT: OnceLock<Arc<dyn MemoryResource>> = OnceLock::new();
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(NewDeleteResource { _private: () })))
}

/// Type-erased allocator handle.
///
/// Copies of a container (see [`BlockAlloc::select_on_copy`]) go to the
/// default resource, not to the source's resource.
#[derive(Clone)]
pub struct PolymorphicAlloc {
    resource: Arc<dyn MemoryResource>,
}

impl PolymorphicAlloc {
    /// A handle to `resource`.
    pub fn new(resource: Arc<dyn MemoryResource>) -> Self {
        Self { resource }
    }

    /// The resource this handle forwards to.
    pub fn resource(&self) -> &Arc<dyn MemoryResource> {
        &self.resource
    }
}

impl Default for PolymorphicAlloc {
    fn default() -> Self {
        Self::new(new_delete_resource())
    }
}

impl PartialEq for PolymorphicAlloc {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource) || self.resource.is_equal(&*other.resource)
    }
}

impl Eq for PolymorphicAlloc {}

impl fmt::Debug for PolymorphicAlloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicAlloc")
            .field("resource", &Arc::as_ptr(&self.resource).cast::<()>())
            .finish()
    }
}

impl BlockAlloc for PolymorphicAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.resource.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller; equal handles share a resource
        // that accepts the pointer.
        unsafe { self.resource.deallocate(ptr, layout) }
    }

    fn select_on_copy(&self) -> Self {
        Self::default()
    }
}

/// Alignment of every arena chunk.
const CHUNK_ALIGN: usize = 16;

/// Bump allocator over geometrically growing chunks.
///
/// `deallocate` is a no-op; memory is returned to the process allocator
/// only when the resource is dropped. Internally synchronised so one arena
/// can back containers on several threads.
pub struct MonotonicResource {
    config: MonotonicConfig,
    state: Mutex<ArenaState>,
}

struct ArenaState {
    chunks: Vec<Chunk>,
    next_chunk_bytes: usize,
    bytes_allocated: usize,
}

// SAFETY: chunk pointers are owned by the arena and only touched under the
// resource's mutex.
unsafe impl Send for ArenaState {}

struct Chunk {
    base: NonNull<u8>,
    layout: Layout,
    used: usize,
}

impl Chunk {
    /// Carve `layout` out of the unused tail of the chunk.
    fn bump(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        let cursor = self.base.as_ptr().wrapping_add(self.used);
        let start = self.used.checked_add(cursor.align_offset(layout.align()))?;
        let end = start.checked_add(layout.size())?;
        if end > self.layout.size() {
            return None;
        }
        self.used = end;
        // SAFETY: start + size lies within the chunk allocation.
        NonNull::new(unsafe { self.base.as_ptr().add(start) })
    }
}

impl MonotonicResource {
    /// Create an arena. No memory is acquired until the first allocation.
    pub fn new(config: MonotonicConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: MonotonicConfig) -> Self {
        Self {
            state: Mutex::new(ArenaState {
                chunks: Vec::new(),
                next_chunk_bytes: config.initial_chunk_bytes,
                bytes_allocated: 0,
            }),
            config,
        }
    }

    /// The arena's sizing parameters.
    pub fn config(&self) -> &MonotonicConfig {
        &self.config
    }

    /// Chunks acquired so far.
    pub fn chunk_count(&self) -> usize {
        self.lock().chunks.len()
    }

    /// Bytes handed out, including bytes later "deallocated".
    pub fn bytes_allocated(&self) -> usize {
        self.lock().bytes_allocated
    }

    /// Bytes held in chunks.
    pub fn bytes_reserved(&self) -> usize {
        self.lock().chunks.iter().map(|c| c.layout.size()).sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ArenaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MonotonicResource {
    fn default() -> Self {
        Self::with_valid_config(MonotonicConfig::default())
    }
}

impl MemoryResource for MonotonicResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let mut state = self.lock();
        if let Some(ptr) = state.chunks.last_mut().and_then(|c| c.bump(layout)) {
            state.bytes_allocated += layout.size();
            return Ok(ptr);
        }
        let needed = layout
            .size()
            .checked_add(layout.align())
            .ok_or(AllocError::CapacityOverflow)?;
        let chunk_bytes = state.next_chunk_bytes.max(needed);
        let chunk_layout = Layout::from_size_align(chunk_bytes, CHUNK_ALIGN.max(layout.align()))
            .map_err(|_| AllocError::CapacityOverflow)?;
        let base = Global.allocate(chunk_layout)?;
        debug!(
            "monotonic resource acquired chunk {} ({} bytes)",
            state.chunks.len(),
            chunk_bytes
        );
        state.next_chunk_bytes = self.config.next_chunk_bytes(state.next_chunk_bytes);
        state.chunks.push(Chunk {
            base,
            layout: chunk_layout,
            used: 0,
        });
        let ptr = state
            .chunks
            .last_mut()
            .and_then(|c| c.bump(layout))
            .ok_or(AllocError::Exhausted { layout })?;
        state.bytes_allocated += layout.size();
        Ok(ptr)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

impl Drop for MonotonicResource {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for chunk in state.chunks.drain(..) {
            // SAFETY: each chunk was allocated by `Global` with its layout.
            unsafe { Global.deallocate(chunk.base, chunk.layout) };
        }
    }
}

impl fmt::Debug for MonotonicResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MonotonicResource")
            .field("config", &self.config)
            .field("chunks", &state.chunks.len())
            .field("bytes_allocated", &state.bytes_allocated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(initial: usize) -> Arc<MonotonicResource> {
        Arc::new(MonotonicResource::new(MonotonicConfig::new(initial)).unwrap())
    }

    #[test]
    fn default_resource_is_shared() {
        let a = PolymorphicAlloc::default();
        let b = PolymorphicAlloc::default();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(a.resource(), &new_delete_resource()));
    }

    #[test]
    fn distinct_resources_are_unequal() {
        let a = PolymorphicAlloc::new(arena(256));
        let b = PolymorphicAlloc::new(arena(256));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(a, PolymorphicAlloc::default());
    }

    #[test]
    fn copies_go_to_the_default_resource() {
        let a = PolymorphicAlloc::new(arena(256));
        assert_eq!(a.select_on_copy(), PolymorphicAlloc::default());
    }

    #[test]
    fn arena_bumps_within_a_chunk_and_respects_alignment() {
        let arena = arena(1024);
        let small = Layout::from_size_align(3, 1).unwrap();
        let wide = Layout::from_size_align(8, 8).unwrap();
        let a = arena.allocate(small).unwrap();
        let b = arena.allocate(wide).unwrap();
        assert_eq!(b.as_ptr() as usize % 8, 0);
        assert!(b.as_ptr() as usize >= a.as_ptr() as usize + 3);
        assert_eq!(arena.chunk_count(), 1);
        assert_eq!(arena.bytes_allocated(), 11);
    }

    #[test]
    fn arena_grows_geometrically_and_serves_oversized_requests() {
        let arena = arena(64);
        let block = Layout::from_size_align(48, 8).unwrap();
        arena.allocate(block).unwrap();
        arena.allocate(block).unwrap();
        assert_eq!(arena.chunk_count(), 2);
        assert_eq!(arena.bytes_reserved(), 64 + 128);
        let huge = Layout::from_size_align(10_000, 8).unwrap();
        arena.allocate(huge).unwrap();
        assert_eq!(arena.chunk_count(), 3);
        assert!(arena.bytes_reserved() >= 64 + 128 + 10_000);
    }

    #[test]
    fn vector_on_arena_releases_nothing_until_drop() {
        let arena = arena(4096);
        let mut v: StableVec<u64> = StableVec::new_in(PolymorphicAlloc::new(arena.clone()));
        v.extend(0..100);
        let reserved = arena.bytes_reserved();
        v.clear();
        assert_eq!(arena.bytes_reserved(), reserved);
        assert_eq!(v.block_count(), 0);
    }

    #[test]
    fn move_between_arenas_copies_elements() {
        let from = PolymorphicAlloc::new(arena(4096));
        let to = PolymorphicAlloc::new(arena(4096));
        let mut src: StableVec<String> = StableVec::new_in(from);
        for i in 0..20 {
            src.push_back(i.to_string());
        }
        let first = &src[0] as *const String;
        let dst = StableVec::move_in(&mut src, to.clone()).unwrap();
        assert!(src.is_empty());
        assert_eq!(dst.len(), 20);
        assert_ne!(&dst[0] as *const String, first);
        assert_eq!(dst[19], "19");
        assert_eq!(dst.allocator(), &to);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = MonotonicConfig {
            growth_factor: 0,
            ..MonotonicConfig::default()
        };
        assert_eq!(
            MonotonicResource::new(config).unwrap_err(),
            ConfigError::ZeroGrowthFactor
        );
    }
}
