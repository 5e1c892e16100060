//! Memory spaces and allocation primitives.
//!
//! Memory is allocated from *resources*, each of which serves one
//! [`MemorySpace`] and is identified by an [`AllocatorId`]. A built-in
//! resource is registered for every concrete space, and custom resources
//! such as a [`PoolResource`] can be added with [`register`].
//!
//! Memory outside the host space is not necessarily addressable from host
//! code. Use [`is_host_accessible`] to check, and [`copy`] to move bytes in
//! and out of such memory.
//!
//! Without the `device` feature only host memory is available. With it, the
//! `Pinned`, `Device`, `Constant` and `Unified` spaces are served by an
//! emulated resource which keeps data in host RAM but reports the
//! accessibility of the space it stands in for.
//!
//! ```
//! use axom_memory::{allocate, deallocate, reallocate, MemorySpace};
//!
//! let mut ptr = allocate::<f32>(16, MemorySpace::Host);
//! assert!(ptr.is_some());
//!
//! ptr = unsafe { reallocate(ptr, 32) };
//! unsafe { deallocate(&mut ptr) };
//! assert!(ptr.is_none());
//! ```

use std::alloc::Layout;
use std::mem::size_of;
use std::ptr::NonNull;
use std::sync::Arc;

mod config;
pub mod env;
mod manager;
mod pool;
mod resource;
pub mod space;

pub use config::{default_config, MemoryConfig};
pub use manager::{AllocatorId, ResourceManager};
pub use pool::PoolResource;
#[cfg(feature = "device")]
pub use resource::DeviceResource;
pub use resource::{HostResource, MemoryResource, ResourceStats};
pub use space::{MemorySpace, ParseSpaceError, Space};

/// Allocate uninitialized space for `n` values of type `T` in `space`.
///
/// Returns `None` if `n` is zero or the request cannot be satisfied.
/// Zero-sized types get a dangling pointer which never reaches a resource.
///
/// Panics if `space` is [`MemorySpace::Dynamic`].
pub fn allocate<T>(n: usize, space: MemorySpace) -> Option<NonNull<T>> {
    allocate_in(n, allocator_id(space))
}

/// Allocate uninitialized space for `n` values of type `T` from allocator
/// `id`.
///
/// See [`allocate`].
pub fn allocate_in<T>(n: usize, id: AllocatorId) -> Option<NonNull<T>> {
    if n == 0 {
        return None;
    }
    if size_of::<T>() == 0 {
        return Some(NonNull::dangling());
    }
    let layout = Layout::array::<T>(n).ok()?;

    // Safety: `layout` has a non-zero size.
    unsafe { ResourceManager::global().allocate(id, layout) }.map(NonNull::cast)
}

/// Free memory returned by [`allocate`] or [`reallocate`] and set `ptr` to
/// `None`.
///
/// Does nothing if `ptr` is `None`. Values stored in the memory are not
/// dropped.
///
/// # Safety
///
/// `ptr` must have been allocated for values of type `T` through this crate
/// and not freed since.
pub unsafe fn deallocate<T>(ptr: &mut Option<NonNull<T>>) {
    if let Some(ptr) = ptr.take() {
        if size_of::<T>() != 0 {
            ResourceManager::global().deallocate(ptr.cast());
        }
    }
}

/// Resize an allocation to hold `n` values of type `T`.
///
/// The first `min(old, n)` values are preserved, bitwise. Resizing to zero
/// frees the memory and returns `None`. Resizing `None` allocates in the
/// default space of [`default_config`].
///
/// Returns `None` if the request cannot be satisfied, in which case the
/// original memory is still valid.
///
/// # Safety
///
/// As for [`deallocate`].
pub unsafe fn reallocate<T>(ptr: Option<NonNull<T>>, n: usize) -> Option<NonNull<T>> {
    let Some(old) = ptr else {
        return default_config().allocate(n);
    };
    if n == 0 {
        let mut ptr = Some(old);
        deallocate(&mut ptr);
        return None;
    }
    if size_of::<T>() == 0 {
        return Some(old);
    }
    let layout = Layout::array::<T>(n).ok()?;
    ResourceManager::global()
        .reallocate(old.cast(), layout.size())
        .map(NonNull::cast)
}

/// Return the id of the built-in allocator for `space`.
///
/// Panics if `space` is [`MemorySpace::Dynamic`].
pub fn allocator_id(space: MemorySpace) -> AllocatorId {
    ResourceManager::global().allocator_id(space)
}

/// Return the memory space of allocator `id`, or `None` if it is not
/// registered.
pub fn allocator_space(id: AllocatorId) -> Option<MemorySpace> {
    ResourceManager::global().allocator_space(id)
}

/// Return the allocator owning the allocation that contains `ptr`.
pub fn find_allocator<T>(ptr: *const T) -> Option<AllocatorId> {
    ResourceManager::global().find_allocator(ptr)
}

/// Return true if host code may dereference memory from allocator `id`.
pub fn is_host_accessible(id: AllocatorId) -> bool {
    ResourceManager::global().is_host_accessible(id)
}

/// Return usage counters of allocator `id`.
pub fn stats(id: AllocatorId) -> Option<ResourceStats> {
    ResourceManager::global().stats(id)
}

/// Add a resource to the global registry and return its id.
pub fn register(resource: Arc<dyn MemoryResource>) -> AllocatorId {
    ResourceManager::global().register(resource)
}

/// Copy `bytes` bytes from `src` to `dst`, where either side may be in any
/// memory space. The regions may overlap.
///
/// # Safety
///
/// Both regions must be valid for `bytes` bytes.
pub unsafe fn copy(dst: *mut u8, src: *const u8, bytes: usize) {
    ResourceManager::global().copy(dst, src, bytes)
}

/// Copy `n` values of type `T` from `src` to `dst`. See [`copy`].
///
/// # Safety
///
/// Both regions must be valid for `n` values. The copy is bitwise, so the
/// caller is responsible for ensuring values are not dropped twice.
pub unsafe fn copy_values<T>(dst: *mut T, src: *const T, n: usize) {
    copy(dst as *mut u8, src as *const u8, n * size_of::<T>())
}
