//! Backends which serve allocation requests for a memory space.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::MemorySpace;

/// Counters reported by a [`MemoryResource`].
///
/// Resources only fill in the counters they track. The rest are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Number of allocations served by the resource.
    pub alloc_count: usize,

    /// Number of allocations served from a cache instead of a fresh
    /// allocation.
    pub hit_count: usize,

    /// Number of copies into or out of the resource's memory.
    pub transfer_count: usize,

    /// Total bytes copied into or out of the resource's memory.
    pub bytes_transferred: usize,
}

/// A backend which allocates memory in one memory space.
///
/// Resources are registered with the [`ResourceManager`](crate::ResourceManager),
/// which assigns each an [`AllocatorId`](crate::AllocatorId) and records the
/// owner of every allocation so that memory can later be freed or resized
/// from a bare pointer.
pub trait MemoryResource: Send + Sync {
    /// Human-readable name used in log messages.
    fn name(&self) -> &str;

    /// Memory space of allocations made by this resource.
    fn space(&self) -> MemorySpace;

    /// Whether host code may dereference pointers from this resource.
    fn host_accessible(&self) -> bool {
        self.space().is_host_accessible()
    }

    /// Allocate a block for `layout`, returning `None` if memory is
    /// exhausted.
    ///
    /// # Safety
    ///
    /// `layout` must have a non-zero size.
    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Free a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate`](MemoryResource::allocate)
    /// or [`reallocate`](MemoryResource::reallocate) on this resource with
    /// the same `layout`, and not freed since.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Resize a block to `new_size` bytes, preserving the first
    /// `min(old, new)` bytes.
    ///
    /// The default implementation allocates a new block, copies and frees the
    /// old block. The returned pointer therefore never equals `ptr`.
    ///
    /// # Safety
    ///
    /// As for [`deallocate`](MemoryResource::deallocate). `new_size` must be
    /// non-zero. On failure the old block is left untouched.
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        let new_layout = Layout::from_size_align(new_size, layout.align()).ok()?;
        let new_ptr = self.allocate(new_layout)?;
        self.copy(
            new_ptr.as_ptr(),
            ptr.as_ptr(),
            layout.size().min(new_size),
        );
        self.deallocate(ptr, layout);
        Some(new_ptr)
    }

    /// Copy `bytes` bytes from `src` to `dst`, where at least one side is
    /// owned by this resource. The regions may overlap.
    ///
    /// # Safety
    ///
    /// Both regions must be valid for `bytes` bytes.
    unsafe fn copy(&self, dst: *mut u8, src: *const u8, bytes: usize) {
        std::ptr::copy(src, dst, bytes);
    }

    /// Return usage counters for this resource.
    fn stats(&self) -> ResourceStats {
        ResourceStats::default()
    }
}

/// Allocate a block from the system allocator, counting the request.
///
/// # Safety
///
/// `layout` must have a non-zero size.
unsafe fn system_alloc(layout: Layout, count: &AtomicUsize) -> Option<NonNull<u8>> {
    let ptr = NonNull::new(std::alloc::alloc(layout))?;
    count.fetch_add(1, Ordering::Relaxed);
    Some(ptr)
}

/// Resource for ordinary host memory, backed by the global allocator.
#[derive(Debug, Default)]
pub struct HostResource {
    alloc_count: AtomicUsize,
}

impl HostResource {
    pub fn new() -> HostResource {
        HostResource::default()
    }
}

impl MemoryResource for HostResource {
    fn name(&self) -> &str {
        "host"
    }

    fn space(&self) -> MemorySpace {
        MemorySpace::Host
    }

    fn host_accessible(&self) -> bool {
        true
    }

    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        system_alloc(layout, &self.alloc_count)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }

    fn stats(&self) -> ResourceStats {
        ResourceStats {
            alloc_count: self.alloc_count.load(Ordering::Relaxed),
            ..Default::default()
        }
    }
}

/// Resource emulating memory in a non-host space.
///
/// The memory physically lives in host RAM, but reports the accessibility of
/// the space it emulates. For `Device` and `Constant` memory this means
/// callers must move data through [`copy`](crate::copy), which this resource
/// counts, rather than dereferencing pointers directly.
#[cfg(feature = "device")]
#[derive(Debug)]
pub struct DeviceResource {
    space: MemorySpace,
    track_transfers: bool,
    alloc_count: AtomicUsize,
    transfer_count: AtomicUsize,
    bytes_transferred: AtomicUsize,
}

#[cfg(feature = "device")]
impl DeviceResource {
    /// Create a resource emulating `space`.
    ///
    /// Panics if `space` is `Host` or `Dynamic`.
    pub fn new(space: MemorySpace) -> DeviceResource {
        assert!(
            space.is_concrete() && space != MemorySpace::Host,
            "cannot emulate the {} memory space",
            space
        );
        DeviceResource {
            space,
            track_transfers: true,
            alloc_count: AtomicUsize::new(0),
            transfer_count: AtomicUsize::new(0),
            bytes_transferred: AtomicUsize::new(0),
        }
    }

    /// Enable or disable counting of transfers.
    pub fn with_transfer_tracking(mut self, enabled: bool) -> DeviceResource {
        self.track_transfers = enabled;
        self
    }

    /// Create a resource emulating pinned host memory.
    pub fn pinned() -> DeviceResource {
        DeviceResource::new(MemorySpace::Pinned)
    }

    /// Create a resource emulating unified (managed) memory.
    pub fn unified() -> DeviceResource {
        DeviceResource::new(MemorySpace::Unified)
    }
}

#[cfg(feature = "device")]
impl MemoryResource for DeviceResource {
    fn name(&self) -> &str {
        self.space.name()
    }

    fn space(&self) -> MemorySpace {
        self.space
    }

    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        system_alloc(layout, &self.alloc_count)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }

    unsafe fn copy(&self, dst: *mut u8, src: *const u8, bytes: usize) {
        if self.track_transfers {
            self.transfer_count.fetch_add(1, Ordering::Relaxed);
            self.bytes_transferred.fetch_add(bytes, Ordering::Relaxed);
        }
        std::ptr::copy(src, dst, bytes);
    }

    fn stats(&self) -> ResourceStats {
        ResourceStats {
            alloc_count: self.alloc_count.load(Ordering::Relaxed),
            hit_count: 0,
            transfer_count: self.transfer_count.load(Ordering::Relaxed),
            bytes_transferred: self.bytes_transferred.load(Ordering::Relaxed),
        }
    }
}
