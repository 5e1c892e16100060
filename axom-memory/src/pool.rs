use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::resource::{MemoryResource, ResourceStats};
use crate::MemorySpace;

/// A block owned by a [`PoolResource`], either cached or handed out.
struct Block {
    ptr: NonNull<u8>,

    /// Layout the block was allocated from the parent with. This may be
    /// larger than the layout of the request it currently serves.
    layout: Layout,
}

// Safety: A block is only an address and a layout. The pool never
// dereferences it.
unsafe impl Send for Block {}

/// A caching resource which keeps freed blocks for reuse.
///
/// The pool wraps a parent resource and inherits its memory space. When a
/// block is freed it is kept in the pool instead of being returned to the
/// parent, and a later request with the same alignment and a size no larger
/// than the block is served from it. This avoids the cost of repeatedly
/// allocating and freeing large blocks, which for device memory typically
/// involves a driver call.
///
/// Requests smaller than a configurable threshold bypass the cache.
///
/// # Usage
///
/// Register the pool to obtain an allocator id, then allocate arrays with
/// that id:
///
/// ```
/// use std::sync::Arc;
/// use axom_memory::{register, HostResource, PoolResource};
///
/// let pool = register(Arc::new(PoolResource::new(Arc::new(HostResource::new()))));
/// let ptr = axom_memory::allocate_in::<f32>(256, pool);
/// assert!(ptr.is_some());
/// ```
pub struct PoolResource {
    parent: Arc<dyn MemoryResource>,

    /// Name reported in log messages.
    name: String,

    /// Blocks available for reuse.
    free: Mutex<Vec<Block>>,

    /// Blocks currently handed out, keyed by address.
    in_use: Mutex<FxHashMap<usize, Layout>>,

    /// Number of allocation requests received.
    alloc_count: AtomicUsize,

    /// Number of allocation requests fulfilled from the cache.
    hit_count: AtomicUsize,

    /// Minimum size, in bytes, of blocks to cache.
    min_size: usize,
}

impl PoolResource {
    /// Create a pool which allocates from `parent`.
    pub fn new(parent: Arc<dyn MemoryResource>) -> PoolResource {
        let name = format!("pool({})", parent.name());
        PoolResource {
            parent,
            name,
            free: Mutex::new(Vec::new()),
            in_use: Mutex::new(FxHashMap::default()),
            alloc_count: AtomicUsize::new(0),
            hit_count: AtomicUsize::new(0),
            min_size: 128,
        }
    }

    /// Configure the minimum size for blocks which are cached.
    ///
    /// Smaller requests are forwarded to the parent resource.
    pub fn with_min_size(mut self, n_bytes: usize) -> Self {
        self.min_size = n_bytes;
        self
    }

    /// Return the total number of allocation requests.
    ///
    /// This excludes requests below the minimum size threshold.
    pub fn alloc_count(&self) -> usize {
        self.alloc_count.load(Ordering::Acquire)
    }

    /// Return the number of allocation requests that were fulfilled using
    /// cached blocks.
    pub fn hit_count(&self) -> usize {
        self.hit_count.load(Ordering::Acquire)
    }

    /// Return the number of blocks currently cached.
    pub fn len(&self) -> usize {
        lock(&self.free).len()
    }

    /// Return true if no blocks are cached.
    pub fn is_empty(&self) -> bool {
        lock(&self.free).is_empty()
    }

    /// Return all cached blocks to the parent resource.
    pub fn release(&self) {
        let blocks = std::mem::take(&mut *lock(&self.free));
        for block in blocks {
            // Safety: Cached blocks were allocated by the parent with
            // `block.layout` and are not in use.
            unsafe { self.parent.deallocate(block.ptr, block.layout) };
        }
    }

    /// Remove and return the cached block that best fits `layout`, ie. the
    /// one with the least excess capacity.
    fn take_best_fit(&self, layout: Layout) -> Option<Block> {
        let mut free = lock(&self.free);
        let best_fit = free
            .iter()
            .enumerate()
            .filter(|(_, block)| {
                block.layout.align() == layout.align() && block.layout.size() >= layout.size()
            })
            .min_by_key(|(_, block)| block.layout.size())
            .map(|(idx, _)| idx)?;
        Some(free.swap_remove(best_fit))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // The protected collections are never left partially updated, so a
    // poisoned lock can still be used.
    mutex.lock().unwrap_or_else(|err| err.into_inner())
}

impl MemoryResource for PoolResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn space(&self) -> MemorySpace {
        self.parent.space()
    }

    fn host_accessible(&self) -> bool {
        self.parent.host_accessible()
    }

    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() < self.min_size {
            return self.parent.allocate(layout);
        }

        self.alloc_count.fetch_add(1, Ordering::AcqRel);

        let block = match self.take_best_fit(layout) {
            Some(block) => {
                self.hit_count.fetch_add(1, Ordering::AcqRel);
                block
            }
            None => Block {
                ptr: self.parent.allocate(layout)?,
                layout,
            },
        };

        lock(&self.in_use).insert(block.ptr.as_ptr() as usize, block.layout);
        Some(block.ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let pooled = lock(&self.in_use).remove(&(ptr.as_ptr() as usize));
        match pooled {
            Some(block_layout) => lock(&self.free).push(Block {
                ptr,
                layout: block_layout,
            }),
            None => self.parent.deallocate(ptr, layout),
        }
    }

    unsafe fn copy(&self, dst: *mut u8, src: *const u8, bytes: usize) {
        self.parent.copy(dst, src, bytes);
    }

    fn stats(&self) -> ResourceStats {
        ResourceStats {
            alloc_count: self.alloc_count(),
            hit_count: self.hit_count(),
            ..self.parent.stats()
        }
    }
}

impl Drop for PoolResource {
    fn drop(&mut self) {
        self.release();
    }
}
