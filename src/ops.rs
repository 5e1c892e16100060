//! Construction, destruction and relocation of array elements in any memory
//! space.
//!
//! Array buffers are untyped memory from an allocator. [`ElementOps`] turns
//! ranges of that memory into live values and back. When the memory is
//! host-accessible, values are constructed and dropped in place. Otherwise
//! the operation runs on a host scratch buffer and the bytes are transferred
//! with [`axom_memory::copy`], so that element constructors and destructors
//! always run on the host.

use std::mem::{needs_drop, ManuallyDrop, MaybeUninit};
use std::ops::Range;
use std::ptr;

use axom_memory::{allocate_in, copy_values, deallocate, AllocatorId, Space};

use crate::execution::ExecutionSpace;

/// Abort the process after failing to allocate `n` values of type `T`.
pub(crate) fn alloc_failure<T>(n: usize) -> ! {
    let layout = std::alloc::Layout::array::<T>(n)
        .unwrap_or_else(|_| panic!("capacity overflow allocating {} elements", n));
    tracing::error!(
        elements = n,
        bytes = layout.size(),
        "array allocation failed"
    );
    std::alloc::handle_alloc_error(layout)
}

/// Pointer which may be shared with the threads of a parallel loop.
struct SendPtr<T>(*mut T);

impl<T> SendPtr<T> {
    fn get(&self) -> *mut T {
        self.0
    }
}

// Safety: Parallel loops only write disjoint elements through the pointer.
unsafe impl<T: Send> Send for SendPtr<T> {}
unsafe impl<T: Send> Sync for SendPtr<T> {}

/// Convert a buffer of initialized `MaybeUninit<T>` values into a `Vec<T>`.
///
/// # Safety
///
/// All elements of `buf` must be initialized.
unsafe fn assume_init_vec<T>(buf: Vec<MaybeUninit<T>>) -> Vec<T> {
    let mut buf = ManuallyDrop::new(buf);
    Vec::from_raw_parts(buf.as_mut_ptr() as *mut T, buf.len(), buf.capacity())
}

/// Element lifecycle operations for memory owned by one allocator.
///
/// All methods are unsafe since they operate on raw buffers. The caller is
/// responsible for tracking which slots hold live values: construction
/// methods require uninitialized slots, and destruction methods require live
/// ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementOps {
    allocator: AllocatorId,

    /// True if the memory is not host-accessible and operations must go
    /// through a host scratch buffer.
    staged: bool,
}

impl ElementOps {
    /// Return the operations for memory from `allocator`, labeled with space
    /// `S`.
    ///
    /// If `S` determines host accessibility statically, the registry is not
    /// consulted.
    #[inline]
    pub fn for_allocator<S: Space>(allocator: AllocatorId) -> ElementOps {
        ElementOps {
            allocator,
            staged: !S::host_accessible(allocator),
        }
    }

    pub fn allocator(&self) -> AllocatorId {
        self.allocator
    }

    /// Return true if operations transfer through host scratch memory.
    pub fn is_staged(&self) -> bool {
        self.staged
    }

    /// Return the execution space used by loops over this memory.
    pub fn execution_space(&self) -> ExecutionSpace {
        if self.staged {
            ExecutionSpace::Parallel
        } else {
            ExecutionSpace::Sequential
        }
    }

    /// Default-construct values in the slots `range` of `data`.
    ///
    /// # Safety
    ///
    /// The slots must be valid for writes and uninitialized.
    pub unsafe fn init<T: Default>(&self, data: *mut T, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let start = range.start;
        if self.staged {
            let values: Vec<T> = range.map(|_| T::default()).collect();
            self.move_from_vec(data.add(start), values);
        } else {
            for i in range {
                data.add(i).write(T::default());
            }
        }
    }

    /// Construct clones of `value` in the first `n` slots of `data`.
    ///
    /// Slots from `n` onwards are not touched.
    ///
    /// # Safety
    ///
    /// The slots must be valid for writes and uninitialized.
    pub unsafe fn fill<T: Clone>(&self, data: *mut T, n: usize, value: &T) {
        if n == 0 {
            return;
        }
        if self.staged {
            self.move_from_vec(data, vec![value.clone(); n]);
        } else {
            for i in 0..n {
                data.add(i).write(value.clone());
            }
        }
    }

    /// Write `value` to the first `n` slots of `data` with a loop in this
    /// memory's execution space.
    ///
    /// Unlike [`fill`](ElementOps::fill) this writes directly into the
    /// destination memory without a host scratch buffer.
    ///
    /// # Safety
    ///
    /// The slots must be valid for writes.
    pub unsafe fn fill_copy<T: Copy + Send + Sync>(&self, data: *mut T, n: usize, value: T) {
        let data = SendPtr(data);
        self.execution_space().for_all(n, |i| {
            // Safety: Each iteration writes a distinct slot below `n`.
            unsafe { data.get().add(i).write(value) }
        });
    }

    /// Construct `value` in slot `index` of `data`.
    ///
    /// # Safety
    ///
    /// The slot must be valid for writes and uninitialized.
    pub unsafe fn emplace<T>(&self, data: *mut T, index: usize, value: T) {
        if self.staged {
            let value = ManuallyDrop::new(value);
            copy_values(data.add(index), &*value as *const T, 1);
        } else {
            data.add(index).write(value);
        }
    }

    /// Move the values out of `values` into the slots starting at `dst`.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for `values.len()` writes and the slots must be
    /// uninitialized.
    pub unsafe fn move_from_vec<T>(&self, dst: *mut T, mut values: Vec<T>) {
        let n = values.len();
        if self.staged {
            copy_values(dst, values.as_ptr(), n);
        } else {
            ptr::copy_nonoverlapping(values.as_ptr(), dst, n);
        }
        // The values are now owned by `dst`.
        values.set_len(0);
    }

    /// Drop the values in slots `range` of `data`, leaving them
    /// uninitialized.
    ///
    /// Does nothing for types without drop glue.
    ///
    /// # Safety
    ///
    /// The slots must hold live values.
    pub unsafe fn destroy<T>(&self, data: *mut T, range: Range<usize>) {
        if !needs_drop::<T>() || range.is_empty() {
            return;
        }
        if self.staged {
            let host = self.read_to_host(data.add(range.start), range.len());
            drop(assume_init_vec(host));
        } else {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                data.add(range.start),
                range.len(),
            ));
        }
    }

    /// Move the values in slots `src` of `data` to the slots starting at
    /// `dst`. The ranges may overlap.
    ///
    /// Afterwards the slots of `src` not covered by the destination are
    /// logically uninitialized.
    ///
    /// # Safety
    ///
    /// `src` must hold live values and the destination slots must be valid
    /// for writes. Values in destination slots outside `src` are overwritten
    /// without being dropped.
    pub unsafe fn relocate<T>(&self, data: *mut T, src: Range<usize>, dst: usize) {
        let n = src.len();
        if n == 0 || src.start == dst {
            return;
        }
        if self.staged {
            let mut tmp = allocate_in::<T>(n, self.allocator);
            let Some(tmp_ptr) = tmp else {
                alloc_failure::<T>(n)
            };
            copy_values(tmp_ptr.as_ptr(), data.add(src.start), n);
            copy_values(data.add(dst), tmp_ptr.as_ptr(), n);
            deallocate(&mut tmp);
        } else {
            ptr::copy(data.add(src.start), data.add(dst), n);
        }
    }

    /// Move the value out of slot `index`, leaving it uninitialized.
    ///
    /// # Safety
    ///
    /// The slot must hold a live value.
    pub unsafe fn take<T>(&self, data: *mut T, index: usize) -> T {
        if self.staged {
            let mut value = MaybeUninit::<T>::uninit();
            copy_values(value.as_mut_ptr(), data.add(index), 1);
            value.assume_init()
        } else {
            data.add(index).read()
        }
    }

    /// Clone `n` values from `src`, whose memory is described by `src_ops`,
    /// into the uninitialized slots starting at `dst`.
    ///
    /// # Safety
    ///
    /// `src` must hold `n` live values and `dst` must be valid for `n`
    /// writes. The regions must not overlap.
    pub unsafe fn clone_into<T: Clone>(
        &self,
        dst: *mut T,
        src: *const T,
        n: usize,
        src_ops: &ElementOps,
    ) {
        if n == 0 {
            return;
        }
        src_ops.inspect(src, n, |values| {
            if self.staged {
                self.move_from_vec(dst, values.to_vec());
            } else {
                for (i, value) in values.iter().enumerate() {
                    dst.add(i).write(value.clone());
                }
            }
        })
    }

    /// Call `f` with a host-readable slice of the `n` values at `data`.
    ///
    /// For memory which is not host-accessible the slice is a snapshot in a
    /// scratch buffer. Changes made through interior mutability are not
    /// written back.
    ///
    /// # Safety
    ///
    /// `data` must hold `n` live values.
    pub unsafe fn inspect<T, R>(&self, data: *const T, n: usize, f: impl FnOnce(&[T]) -> R) -> R {
        if n == 0 {
            return f(&[]);
        }
        if self.staged {
            // Dropping the scratch buffer frees it without dropping the
            // values, which are still owned by `data`.
            let host = self.read_to_host(data, n);
            f(std::slice::from_raw_parts(host.as_ptr() as *const T, n))
        } else {
            f(std::slice::from_raw_parts(data, n))
        }
    }

    /// Copy `n` values from `src` into a new host buffer.
    unsafe fn read_to_host<T>(&self, src: *const T, n: usize) -> Vec<MaybeUninit<T>> {
        let mut host: Vec<MaybeUninit<T>> = Vec::with_capacity(n);
        copy_values(host.as_mut_ptr() as *mut T, src, n);
        host.set_len(n);
        host
    }
}
