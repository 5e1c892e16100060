use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::ptr::NonNull;

use axom_memory::space::Dynamic;
use axom_memory::{allocator_id, find_allocator, AllocatorId, MemorySpace, Space};

use crate::array::Array;
use crate::array_base::{array_eq, debug_check_host, debug_check_space, ArrayBase, ArrayBaseMut};
use crate::errors::FromDataError;
use crate::layout::{Layout, NdLayout};

/// Return the allocator owning `ptr` for a view labeled with space `S`.
///
/// For a static space this is the space's default allocator. For
/// [`Dynamic`] the registry is searched, and memory it does not know about
/// is assumed to be ordinary host memory.
fn view_allocator<S: Space, T>(ptr: *const T) -> AllocatorId {
    if S::SPACE == MemorySpace::Dynamic {
        find_allocator(ptr).unwrap_or_else(|| allocator_id(MemorySpace::Host))
    } else {
        S::default_allocator()
    }
}

/// Check that a buffer of `len` elements can back a layout of `shape`.
fn check_len<const N: usize>(shape: [usize; N], len: usize) -> Result<(), FromDataError> {
    match NdLayout::checked_len(shape) {
        Some(required) if required <= len => Ok(()),
        // A shape whose element count overflows needs more data than any
        // slice can hold.
        _ => Err(FromDataError::StorageTooShort),
    }
}

/// A non-owning view of an N-dimensional array's elements.
///
/// Views never allocate or free memory. They borrow either an [`Array`] or
/// a slice, or wrap a raw pointer. Elements can be read but not modified.
/// See [`ArrayViewMut`] for the mutable variant.
///
/// Like `Array`, the `S` parameter labels the memory space. With a static
/// space, the source allocator must belong to that space.
pub struct ArrayView<'a, T, const N: usize = 1, S: Space = Dynamic> {
    ptr: NonNull<T>,
    layout: NdLayout<N>,
    allocator: AllocatorId,
    _marker: PhantomData<(&'a T, S)>,
}

impl<T, const N: usize, S: Space> Clone for ArrayView<'_, T, N, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const N: usize, S: Space> Copy for ArrayView<'_, T, N, S> {}

// Safety: The view is equivalent to a shared slice borrow.
unsafe impl<T: Sync, const N: usize, S: Space> Send for ArrayView<'_, T, N, S> {}
unsafe impl<T: Sync, const N: usize, S: Space> Sync for ArrayView<'_, T, N, S> {}

impl<'a, T, const N: usize, S: Space> ArrayView<'a, T, N, S> {
    /// Create a view of the elements of an array or another view.
    ///
    /// In debug builds, panics if `S` is a static space which the source's
    /// allocator does not belong to.
    pub fn new<A>(array: &'a A) -> Self
    where
        A: ArrayBase<Elem = T, Layout = NdLayout<N>>,
    {
        debug_check_space::<S>(array.allocator_id());
        ArrayView {
            // Safety: `as_ptr` never returns null.
            ptr: unsafe { NonNull::new_unchecked(array.as_ptr() as *mut T) },
            layout: *array.layout(),
            allocator: array.allocator_id(),
            _marker: PhantomData,
        }
    }

    /// Create a view of the first `shape.iter().product()` elements of
    /// `data`.
    ///
    /// Panics if `data` is too short.
    pub fn from_slice(data: &'a [T], shape: [usize; N]) -> Self {
        Self::try_from_slice(data, shape).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Variant of [`from_slice`](ArrayView::from_slice) which returns an
    /// error if `data` is too short.
    pub fn try_from_slice(data: &'a [T], shape: [usize; N]) -> Result<Self, FromDataError> {
        check_len(shape, data.len())?;
        // Safety: `data` has enough elements and outlives the view.
        Ok(unsafe { Self::from_raw_parts(data.as_ptr(), shape) })
    }

    /// Create a view of `shape.iter().product()` elements starting at `ptr`.
    ///
    /// With the [`Dynamic`] space, the allocator is looked up from the
    /// pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and point to enough live elements, which must
    /// not be mutated during `'a`.
    pub unsafe fn from_raw_parts(ptr: *const T, shape: [usize; N]) -> Self {
        ArrayView {
            ptr: NonNull::new_unchecked(ptr as *mut T),
            layout: NdLayout::from_shape(shape),
            allocator: view_allocator::<S, T>(ptr),
            _marker: PhantomData,
        }
    }

    /// Return the elements as a slice with the lifetime of the source.
    ///
    /// The data must be [host-accessible](ArrayBase::is_host_accessible).
    /// This is checked in debug builds.
    pub fn as_slice(&self) -> &'a [T] {
        debug_check_host(self);
        // Safety: The view covers `len` live elements for `'a`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    /// Return an iterator over elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.as_slice().iter()
    }

    /// Return a deep copy of the viewed elements as an owning array in
    /// allocator `allocator`.
    pub fn to_array_in<S2: Space>(&self, allocator: AllocatorId) -> Array<T, N, S2>
    where
        T: Clone,
    {
        let mut array = Array::with_capacity_in(allocator, self.shape());
        array.append(self);
        array
    }
}

impl<T, const N: usize, S: Space> ArrayBase for ArrayView<'_, T, N, S> {
    type Elem = T;
    type Layout = NdLayout<N>;
    type Space = S;
    const IS_VIEW: bool = true;

    fn layout(&self) -> &NdLayout<N> {
        &self.layout
    }

    fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    fn allocator_id(&self) -> AllocatorId {
        self.allocator
    }
}

impl<'a, T, const N: usize, S1: Space, S2: Space> From<&'a Array<T, N, S1>>
    for ArrayView<'a, T, N, S2>
{
    fn from(array: &'a Array<T, N, S1>) -> Self {
        ArrayView::new(array)
    }
}

/// A non-owning, mutable view of an N-dimensional array's elements.
///
/// Writes through the view modify the source. Only sources borrowed
/// mutably can be viewed this way, so a view of mutable elements cannot be
/// created from `&Array`:
///
/// ```compile_fail
/// use axom_core::{Array, ArrayViewMut};
///
/// let arr = Array::<i32>::from_data([2], vec![1, 2]);
/// let view = ArrayViewMut::<i32>::new(&arr);
/// ```
///
/// Use [`ArrayView`] for read-only access instead.
pub struct ArrayViewMut<'a, T, const N: usize = 1, S: Space = Dynamic> {
    ptr: NonNull<T>,
    layout: NdLayout<N>,
    allocator: AllocatorId,
    _marker: PhantomData<(&'a mut T, S)>,
}

// Safety: The view is equivalent to a mutable slice borrow.
unsafe impl<T: Send, const N: usize, S: Space> Send for ArrayViewMut<'_, T, N, S> {}
unsafe impl<T: Sync, const N: usize, S: Space> Sync for ArrayViewMut<'_, T, N, S> {}

impl<'a, T, const N: usize, S: Space> ArrayViewMut<'a, T, N, S> {
    /// Create a mutable view of the elements of an array or another mutable
    /// view.
    ///
    /// In debug builds, panics if `S` is a static space which the source's
    /// allocator does not belong to.
    pub fn new<A>(array: &'a mut A) -> Self
    where
        A: ArrayBaseMut<Elem = T, Layout = NdLayout<N>>,
    {
        debug_check_space::<S>(array.allocator_id());
        ArrayViewMut {
            // Safety: `as_mut_ptr` never returns null.
            ptr: unsafe { NonNull::new_unchecked(array.as_mut_ptr()) },
            layout: *array.layout(),
            allocator: array.allocator_id(),
            _marker: PhantomData,
        }
    }

    /// Create a mutable view of the first `shape.iter().product()` elements
    /// of `data`.
    ///
    /// Panics if `data` is too short.
    pub fn from_slice(data: &'a mut [T], shape: [usize; N]) -> Self {
        Self::try_from_slice(data, shape).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Variant of [`from_slice`](ArrayViewMut::from_slice) which returns an
    /// error if `data` is too short.
    pub fn try_from_slice(data: &'a mut [T], shape: [usize; N]) -> Result<Self, FromDataError> {
        check_len(shape, data.len())?;
        // Safety: `data` has enough elements and is borrowed mutably for
        // `'a`.
        Ok(unsafe { Self::from_raw_parts(data.as_mut_ptr(), shape) })
    }

    /// Create a mutable view of `shape.iter().product()` elements starting
    /// at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and point to enough live elements, which must
    /// not be accessed other than through the view during `'a`.
    pub unsafe fn from_raw_parts(ptr: *mut T, shape: [usize; N]) -> Self {
        ArrayViewMut {
            ptr: NonNull::new_unchecked(ptr),
            layout: NdLayout::from_shape(shape),
            allocator: view_allocator::<S, T>(ptr),
            _marker: PhantomData,
        }
    }

    /// Return a read-only view of the elements.
    pub fn view(&self) -> ArrayView<'_, T, N, S> {
        ArrayView::new(self)
    }

    /// Return a mutable view with a shorter lifetime, leaving `self` usable
    /// once it is dropped.
    pub fn reborrow(&mut self) -> ArrayViewMut<'_, T, N, S> {
        ArrayViewMut::new(self)
    }

    /// Convert this view into a read-only view with the same lifetime.
    pub fn into_view(self) -> ArrayView<'a, T, N, S> {
        ArrayView {
            ptr: self.ptr,
            layout: self.layout,
            allocator: self.allocator,
            _marker: PhantomData,
        }
    }

    /// Return the elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        debug_check_host(self);
        // Safety: The view covers `len` live elements.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    /// Return the elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        debug_check_host(self);
        // Safety: The view covers `len` live elements, borrowed uniquely.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }

    /// Consume the view and return the elements as a mutable slice with the
    /// lifetime of the source.
    pub fn into_slice_mut(self) -> &'a mut [T] {
        debug_check_host(&self);
        // Safety: The view covers `len` live elements, borrowed uniquely for
        // `'a`.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }

    /// Return a mutable iterator over elements in row-major order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Replace every element with a clone of `value`.
    ///
    /// For memory which is not host-accessible, the new values are built on
    /// the host and transferred.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        let len = self.len();
        let ops = self.element_ops();
        // Safety: The view's `len` elements are live before `destroy` and
        // are reconstructed by `fill`.
        unsafe {
            ops.destroy(self.ptr.as_ptr(), 0..len);
            ops.fill(self.ptr.as_ptr(), len, &value);
        }
    }
}

impl<T, const N: usize, S: Space> ArrayBase for ArrayViewMut<'_, T, N, S> {
    type Elem = T;
    type Layout = NdLayout<N>;
    type Space = S;
    const IS_VIEW: bool = true;

    fn layout(&self) -> &NdLayout<N> {
        &self.layout
    }

    fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    fn allocator_id(&self) -> AllocatorId {
        self.allocator
    }
}

impl<T, const N: usize, S: Space> ArrayBaseMut for ArrayViewMut<'_, T, N, S> {
    fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }
}

impl<'a, T, const N: usize, S1: Space, S2: Space> From<&'a mut Array<T, N, S1>>
    for ArrayViewMut<'a, T, N, S2>
{
    fn from(array: &'a mut Array<T, N, S1>) -> Self {
        ArrayViewMut::new(array)
    }
}

macro_rules! impl_view_traits {
    ($view:ident) => {
        impl<T: PartialEq, const N: usize, S: Space, V> PartialEq<V> for $view<'_, T, N, S>
        where
            V: ArrayBase<Elem = T, Layout = NdLayout<N>>,
        {
            fn eq(&self, other: &V) -> bool {
                array_eq(self, other)
            }
        }

        impl<T, const N: usize, S: Space> Index<[usize; N]> for $view<'_, T, N, S> {
            type Output = T;

            fn index(&self, index: [usize; N]) -> &T {
                debug_check_host(self);
                let offset = self.layout.offset(index);
                // Safety: `offset` was bounds-checked against the view.
                unsafe { &*self.ptr.as_ptr().add(offset) }
            }
        }

        impl<T, const N: usize, S: Space> Index<usize> for $view<'_, T, N, S> {
            type Output = T;

            fn index(&self, index: usize) -> &T {
                debug_check_host(self);
                let len = self.len();
                assert!(
                    index < len,
                    "index out of bounds: the len is {} but the index is {}",
                    len,
                    index
                );
                // Safety: `index` is within the view.
                unsafe { &*self.ptr.as_ptr().add(index) }
            }
        }
    };
}

impl_view_traits!(ArrayView);
impl_view_traits!(ArrayViewMut);

impl<T, const N: usize, S: Space> IndexMut<[usize; N]> for ArrayViewMut<'_, T, N, S> {
    fn index_mut(&mut self, index: [usize; N]) -> &mut T {
        debug_check_host(self);
        let offset = self.layout.offset(index);
        // Safety: `offset` was bounds-checked against the view.
        unsafe { &mut *self.ptr.as_ptr().add(offset) }
    }
}

impl<T, const N: usize, S: Space> IndexMut<usize> for ArrayViewMut<'_, T, N, S> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}
