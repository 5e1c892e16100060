use std::alloc::Layout;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::resource::{HostResource, MemoryResource, ResourceStats};
use crate::MemorySpace;

#[cfg(feature = "device")]
use crate::env::env_flag;
#[cfg(feature = "device")]
use crate::resource::DeviceResource;

/// Identifies a registered [`MemoryResource`].
///
/// Ids are assigned in registration order. The built-in resources are
/// registered first, one for each space in [`MemorySpace::concrete`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocatorId(u32);

impl AllocatorId {
    /// Return the numeric value of this id.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for AllocatorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "allocator #{}", self.0)
    }
}

/// Record of a live allocation.
#[derive(Clone, Copy, Debug)]
struct Allocation {
    allocator: AllocatorId,
    layout: Layout,
}

/// Registry of memory resources and the allocations made from them.
///
/// Every allocation made through the registry is recorded along with the
/// allocator that owns it, so that memory can be freed, resized or
/// classified given only a pointer.
pub struct ResourceManager {
    resources: RwLock<Vec<Arc<dyn MemoryResource>>>,

    /// Live allocations keyed by start address.
    allocations: Mutex<BTreeMap<usize, Allocation>>,
}

impl ResourceManager {
    /// Create a registry containing the built-in resources.
    pub fn new() -> ResourceManager {
        let manager = ResourceManager {
            resources: RwLock::new(Vec::new()),
            allocations: Mutex::new(BTreeMap::new()),
        };
        for &space in MemorySpace::concrete() {
            manager.register(builtin_resource(space));
        }
        manager
    }

    /// Return the process-wide registry, creating it on first use.
    pub fn global() -> &'static ResourceManager {
        static MANAGER: OnceLock<ResourceManager> = OnceLock::new();
        MANAGER.get_or_init(ResourceManager::new)
    }

    /// Add a resource to the registry and return its id.
    pub fn register(&self, resource: Arc<dyn MemoryResource>) -> AllocatorId {
        let mut resources = self.resources.write().unwrap_or_else(|err| err.into_inner());
        let id = AllocatorId(resources.len() as u32);
        tracing::debug!(
            allocator = id.as_u32(),
            name = resource.name(),
            space = %resource.space(),
            "registered memory resource"
        );
        resources.push(resource);
        id
    }

    /// Return the number of registered resources.
    pub fn len(&self) -> usize {
        self.read_resources().len()
    }

    /// Return true if no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.read_resources().is_empty()
    }

    /// Return the id of the built-in allocator for `space`.
    ///
    /// Panics if `space` is [`MemorySpace::Dynamic`].
    pub fn allocator_id(&self, space: MemorySpace) -> AllocatorId {
        let index = MemorySpace::concrete()
            .iter()
            .position(|&s| s == space)
            .unwrap_or_else(|| panic!("no allocator exists for the {} memory space", space));
        AllocatorId(index as u32)
    }

    /// Return the resource registered as `id`.
    pub fn resource(&self, id: AllocatorId) -> Option<Arc<dyn MemoryResource>> {
        self.read_resources().get(id.index()).cloned()
    }

    /// Return the memory space of allocator `id`.
    pub fn allocator_space(&self, id: AllocatorId) -> Option<MemorySpace> {
        self.resource(id).map(|r| r.space())
    }

    /// Return true if memory from allocator `id` can be dereferenced by host
    /// code.
    ///
    /// Panics if `id` is not registered.
    pub fn is_host_accessible(&self, id: AllocatorId) -> bool {
        self.expect_resource(id).host_accessible()
    }

    /// Return usage counters for allocator `id`.
    pub fn stats(&self, id: AllocatorId) -> Option<ResourceStats> {
        self.resource(id).map(|r| r.stats())
    }

    /// Return the allocator which owns the allocation containing `ptr`.
    ///
    /// Returns `None` for memory not allocated through the registry, such as
    /// stack memory or a `Vec`'s buffer.
    pub fn find_allocator<T>(&self, ptr: *const T) -> Option<AllocatorId> {
        let addr = ptr as usize;
        let allocations = self.lock_allocations();
        let (&start, alloc) = allocations.range(..=addr).next_back()?;
        if addr < start + alloc.layout.size() {
            Some(alloc.allocator)
        } else {
            None
        }
    }

    /// Return the size in bytes of the allocation starting at `ptr`.
    pub fn allocation_size<T>(&self, ptr: *const T) -> Option<usize> {
        self.lock_allocations()
            .get(&(ptr as usize))
            .map(|alloc| alloc.layout.size())
    }

    /// Return the number of live allocations.
    pub fn allocation_count(&self) -> usize {
        self.lock_allocations().len()
    }

    /// Allocate a block from allocator `id`.
    ///
    /// Returns `None` if the resource is out of memory.
    ///
    /// # Safety
    ///
    /// `layout` must have a non-zero size.
    pub unsafe fn allocate(&self, id: AllocatorId, layout: Layout) -> Option<NonNull<u8>> {
        let resource = self.expect_resource(id);
        let Some(ptr) = resource.allocate(layout) else {
            tracing::debug!(
                allocator = id.as_u32(),
                bytes = layout.size(),
                "allocation failed"
            );
            return None;
        };
        self.lock_allocations().insert(
            ptr.as_ptr() as usize,
            Allocation {
                allocator: id,
                layout,
            },
        );
        tracing::debug!(
            allocator = id.as_u32(),
            bytes = layout.size(),
            ptr = ?ptr,
            "allocated"
        );
        Some(ptr)
    }

    /// Free a block previously returned by [`allocate`](Self::allocate) or
    /// [`reallocate`](Self::reallocate).
    ///
    /// Panics if `ptr` is not the start of a live allocation.
    ///
    /// # Safety
    ///
    /// No references into the block may be used afterwards.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>) {
        let alloc = self.take_allocation(ptr);
        tracing::debug!(
            allocator = alloc.allocator.as_u32(),
            bytes = alloc.layout.size(),
            ptr = ?ptr,
            "freed"
        );
        self.expect_resource(alloc.allocator)
            .deallocate(ptr, alloc.layout);
    }

    /// Resize a block to `new_size` bytes, within the same allocator.
    ///
    /// On success the old pointer is invalid and the first
    /// `min(old, new)` bytes are preserved. On failure `None` is returned and
    /// the old block is unchanged.
    ///
    /// Panics if `ptr` is not the start of a live allocation.
    ///
    /// # Safety
    ///
    /// `new_size` must be non-zero.
    pub unsafe fn reallocate(&self, ptr: NonNull<u8>, new_size: usize) -> Option<NonNull<u8>> {
        let alloc = self.take_allocation(ptr);
        let resource = self.expect_resource(alloc.allocator);

        let Some(new_ptr) = resource.reallocate(ptr, alloc.layout, new_size) else {
            self.lock_allocations().insert(ptr.as_ptr() as usize, alloc);
            return None;
        };

        let layout = Layout::from_size_align_unchecked(new_size, alloc.layout.align());
        self.lock_allocations().insert(
            new_ptr.as_ptr() as usize,
            Allocation {
                allocator: alloc.allocator,
                layout,
            },
        );
        tracing::debug!(
            allocator = alloc.allocator.as_u32(),
            old_bytes = alloc.layout.size(),
            new_bytes = new_size,
            "reallocated"
        );
        Some(new_ptr)
    }

    /// Copy `bytes` bytes from `src` to `dst`. The regions may overlap.
    ///
    /// If either side lives in memory which is not host-accessible, the
    /// resource owning it performs the transfer.
    ///
    /// # Safety
    ///
    /// Both regions must be valid for `bytes` bytes.
    pub unsafe fn copy(&self, dst: *mut u8, src: *const u8, bytes: usize) {
        if bytes == 0 {
            return;
        }

        let transfer_resource = [dst as *const u8, src]
            .into_iter()
            .filter_map(|ptr| self.find_allocator(ptr))
            .filter_map(|id| self.resource(id))
            .find(|resource| !resource.host_accessible());

        match transfer_resource {
            Some(resource) => {
                tracing::trace!(resource = resource.name(), bytes, "transfer");
                resource.copy(dst, src, bytes);
            }
            None => std::ptr::copy(src, dst, bytes),
        }
    }

    fn take_allocation(&self, ptr: NonNull<u8>) -> Allocation {
        self.lock_allocations()
            .remove(&(ptr.as_ptr() as usize))
            .unwrap_or_else(|| panic!("pointer {:?} was not allocated by the resource manager", ptr))
    }

    fn expect_resource(&self, id: AllocatorId) -> Arc<dyn MemoryResource> {
        self.resource(id)
            .unwrap_or_else(|| panic!("{} is not registered", id))
    }

    fn read_resources(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn MemoryResource>>> {
        self.resources.read().unwrap_or_else(|err| err.into_inner())
    }

    fn lock_allocations(&self) -> std::sync::MutexGuard<'_, BTreeMap<usize, Allocation>> {
        self.allocations.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_resource(space: MemorySpace) -> Arc<dyn MemoryResource> {
    match space {
        MemorySpace::Host => Arc::new(HostResource::new()),
        #[cfg(feature = "device")]
        _ => Arc::new(
            DeviceResource::new(space)
                .with_transfer_tracking(env_flag("AXOM_TRACK_TRANSFERS", true)),
        ),
        #[cfg(not(feature = "device"))]
        MemorySpace::Dynamic => unreachable!("dynamic is not a concrete space"),
    }
}
