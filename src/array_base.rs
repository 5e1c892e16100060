use axom_memory::{allocator_space, AllocatorId, MemorySpace, Space};

use crate::layout::Layout;
use crate::ops::ElementOps;

/// Capabilities shared by owning arrays and views.
///
/// Implementors provide the data pointer, layout and owning allocator. The
/// trait supplies shape queries, bounds-checked element access and
/// space-aware copying on top of those.
///
/// Shape queries are provided by this trait rather than as inherent methods,
/// so it needs to be imported to use them. The simplest way is via the
/// [prelude](crate::prelude).
pub trait ArrayBase {
    /// Type of element stored.
    type Elem;

    /// Type of the layout which maps indices to offsets.
    type Layout: Layout;

    /// Space marker the array is labeled with.
    type Space: Space;

    /// True for non-owning views.
    const IS_VIEW: bool;

    /// Return the layout of this array.
    fn layout(&self) -> &Self::Layout;

    /// Return a pointer to the first element.
    ///
    /// For arrays without storage this is a dangling, non-null pointer.
    fn as_ptr(&self) -> *const Self::Elem;

    /// Return the allocator which owns the data.
    fn allocator_id(&self) -> AllocatorId;

    /// Return the element operations for this array's memory.
    fn element_ops(&self) -> ElementOps {
        ElementOps::for_allocator::<Self::Space>(self.allocator_id())
    }

    /// Return the total number of elements.
    fn len(&self) -> usize {
        self.layout().len()
    }

    /// Return true if the array has no elements.
    fn is_empty(&self) -> bool {
        self.layout().is_empty()
    }

    /// Return the number of dimensions.
    fn ndim(&self) -> usize {
        self.layout().ndim()
    }

    /// Return the size of each dimension.
    fn shape(&self) -> <Self::Layout as Layout>::Index {
        self.layout().shape()
    }

    /// Return the size of dimension `dim`.
    fn size(&self, dim: usize) -> usize {
        self.layout().size(dim)
    }

    /// Return the stride of each dimension, in elements.
    fn strides(&self) -> <Self::Layout as Layout>::Index {
        self.layout().strides()
    }

    /// Return the stride of dimension `dim`.
    fn stride(&self, dim: usize) -> usize {
        self.layout().stride(dim)
    }

    /// Return the element at a given index, or `None` if out of bounds.
    ///
    /// The data must be [host-accessible](ArrayBase::is_host_accessible).
    /// This is checked in debug builds.
    fn get(&self, index: <Self::Layout as Layout>::Index) -> Option<&Self::Elem> {
        debug_check_host(self);
        let offset = self.layout().try_offset(index)?;
        // Safety: `offset` is within the layout, whose elements are live.
        Some(unsafe { &*self.as_ptr().add(offset) })
    }

    /// Return the element at offset `index` in row-major order, or `None` if
    /// out of bounds.
    fn get_flat(&self, index: usize) -> Option<&Self::Elem> {
        debug_check_host(self);
        if index >= self.len() {
            return None;
        }
        // Safety: `index` is less than the number of live elements.
        Some(unsafe { &*self.as_ptr().add(index) })
    }

    /// Return true if the data can be read directly by host code.
    fn is_host_accessible(&self) -> bool {
        <Self::Space as Space>::host_accessible(self.allocator_id())
    }

    /// Return the memory space where the data resides.
    fn memory_space(&self) -> MemorySpace {
        allocator_space(self.allocator_id()).unwrap_or(<Self::Space as Space>::SPACE)
    }

    /// Return a copy of the elements in row-major order, in host memory.
    fn to_vec(&self) -> Vec<Self::Elem>
    where
        Self::Elem: Clone,
    {
        // Safety: The array holds `len` live elements.
        unsafe {
            self.element_ops()
                .inspect(self.as_ptr(), self.len(), |values| values.to_vec())
        }
    }
}

/// Capabilities of arrays and views which allow element mutation.
pub trait ArrayBaseMut: ArrayBase {
    /// Return a mutable pointer to the first element.
    fn as_mut_ptr(&mut self) -> *mut Self::Elem;

    /// Return a mutable reference to the element at a given index, or `None`
    /// if out of bounds.
    fn get_mut(&mut self, index: <Self::Layout as Layout>::Index) -> Option<&mut Self::Elem> {
        debug_check_host(self);
        let offset = self.layout().try_offset(index)?;
        // Safety: `offset` is within the layout and `self` is borrowed
        // mutably.
        Some(unsafe { &mut *self.as_mut_ptr().add(offset) })
    }

    /// Return a mutable reference to the element at flat offset `index`, or
    /// `None` if out of bounds.
    fn get_flat_mut(&mut self, index: usize) -> Option<&mut Self::Elem> {
        debug_check_host(self);
        if index >= self.len() {
            return None;
        }
        // Safety: `index` is less than the number of live elements.
        Some(unsafe { &mut *self.as_mut_ptr().add(index) })
    }
}

/// Compare two arrays for equality.
///
/// Arrays are equal if they have the same allocator, the same shape and equal
/// elements.
pub(crate) fn array_eq<A, B>(a: &A, b: &B) -> bool
where
    A: ArrayBase,
    B: ArrayBase<Elem = A::Elem, Layout = A::Layout>,
    A::Elem: PartialEq,
{
    if a.allocator_id() != b.allocator_id() || a.shape() != b.shape() {
        return false;
    }

    // Safety: Both arrays hold `len` live elements.
    unsafe {
        a.element_ops().inspect(a.as_ptr(), a.len(), |a_elems| {
            b.element_ops()
                .inspect(b.as_ptr(), b.len(), |b_elems| a_elems == b_elems)
        })
    }
}

/// Check that memory from `allocator` may be labeled with space `S`.
#[inline]
pub(crate) fn debug_check_space<S: Space>(allocator: AllocatorId) {
    debug_assert!(
        S::accepts(allocator),
        "input allocator does not match the explicitly provided memory space"
    );
}

/// Check that host code may dereference the elements of `array`.
///
/// Elements in memory which is not host-accessible can only be reached
/// through [`ElementOps`], which stages them on the host.
#[inline]
pub(crate) fn debug_check_host<A: ArrayBase + ?Sized>(array: &A) {
    debug_assert!(
        array.is_host_accessible(),
        "array data in the {} memory space is not host-accessible",
        array.memory_space()
    );
}
