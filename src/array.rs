use std::marker::PhantomData;
use std::ops::{Index, IndexMut, Range};
use std::ptr::NonNull;

use axom_memory::space::Dynamic;
use axom_memory::{allocate_in, deallocate, reallocate, AllocatorId, Space};

use crate::array_base::{array_eq, debug_check_host, ArrayBase, ArrayBaseMut};
use crate::array_view::{ArrayView, ArrayViewMut};
use crate::errors::{ExpandError, FromDataError};
use crate::layout::{Layout, NdLayout};
use crate::ops::alloc_failure;

/// Growth factor applied to the current size when an array needs more
/// capacity.
pub const DEFAULT_RESIZE_RATIO: f64 = 2.0;

/// An owning, resizable N-dimensional array whose buffer lives in any memory
/// space.
///
/// Elements are stored contiguously in row-major order. The array can grow
/// and shrink along the leading dimension. Memory is obtained from an
/// allocator, identified by an [`AllocatorId`], which determines the memory
/// space. The `S` parameter labels the space statically. With the default,
/// [`Dynamic`], the space is looked up from the allocator at runtime.
///
/// Element constructors and destructors always run on the host. For memory
/// which is not host-accessible they operate on a host copy which is then
/// transferred, see [`ElementOps`](crate::ElementOps).
///
/// Capacity is counted in elements and is always a multiple of the number of
/// elements in one step along the leading dimension. When an operation needs
/// more capacity than is available, the new capacity is the larger of the
/// required size and the current size scaled by the
/// [resize ratio](Array::set_resize_ratio).
///
/// Shape and element queries come from the [`ArrayBase`] trait.
///
/// ```
/// use axom_core::prelude::*;
/// use axom_core::Array;
///
/// let mut arr = Array::<i32>::from_data([3], vec![1, 2, 3]);
/// arr.push(4);
/// assert_eq!(arr.shape(), [4]);
/// assert_eq!(arr.as_slice(), &[1, 2, 3, 4]);
/// ```
///
/// Element access requires a shared borrow, and mutation requires an
/// exclusive one. So elements cannot be modified through `&Array`:
///
/// ```compile_fail
/// use axom_core::Array;
///
/// let arr = Array::<i32>::from_data([2], vec![1, 2]);
/// let shared = &arr;
/// shared[0] = 5;
/// ```
pub struct Array<T, const N: usize = 1, S: Space = Dynamic> {
    /// Buffer with space for `capacity` elements, of which the first
    /// `layout.len()` are live.
    data: Option<NonNull<T>>,
    layout: NdLayout<N>,
    capacity: usize,
    resize_ratio: f64,
    allocator: AllocatorId,
    _marker: PhantomData<(T, S)>,
}

// Safety: The array uniquely owns its elements, as a `Vec` does.
unsafe impl<T: Send, const N: usize, S: Space> Send for Array<T, N, S> {}
unsafe impl<T: Sync, const N: usize, S: Space> Sync for Array<T, N, S> {}

/// Round `n` up to a multiple of `block`, panicking on overflow.
fn round_up(n: usize, block: usize) -> usize {
    if block <= 1 {
        return n;
    }
    n.div_ceil(block)
        .checked_mul(block)
        .unwrap_or_else(|| panic!("capacity overflow rounding {} up to blocks of {}", n, block))
}

/// Return the number of elements in an array of shape `shape`.
///
/// Panics if the count, or the size of one step along the leading dimension,
/// overflows `usize`.
fn shape_len<const N: usize>(shape: [usize; N]) -> usize {
    NdLayout::checked_len(shape)
        .unwrap_or_else(|| panic!("capacity overflow for shape {:?}", shape))
}

/// Add `extra` elements to a length of `len`, panicking on overflow.
fn grown_len(len: usize, extra: usize) -> usize {
    len.checked_add(extra)
        .unwrap_or_else(|| panic!("capacity overflow adding {} elements to {}", extra, len))
}

/// Allocate a buffer for `capacity` elements, aborting on failure.
fn alloc_buffer<T>(allocator: AllocatorId, capacity: usize) -> Option<NonNull<T>> {
    if capacity == 0 {
        return None;
    }
    match allocate_in::<T>(capacity, allocator) {
        Some(ptr) => Some(ptr),
        None => alloc_failure::<T>(capacity),
    }
}

impl<T, const N: usize, S: Space> Array<T, N, S> {
    /// Create an array with storage for `capacity` elements and shape
    /// `shape`, except that the leading dimension is zero.
    fn alloc_in(allocator: AllocatorId, shape: [usize; N], capacity: usize) -> Self {
        assert!(
            S::accepts(allocator),
            "{} does not belong to the {} memory space",
            allocator,
            S::SPACE
        );
        let mut layout = NdLayout::from_shape(shape);
        layout.resize_dim(0, 0);
        let capacity = round_up(capacity, layout.block_size());

        Array {
            data: alloc_buffer(allocator, capacity),
            layout,
            capacity,
            resize_ratio: DEFAULT_RESIZE_RATIO,
            allocator,
            _marker: PhantomData,
        }
    }

    /// Create an empty array with a given shape and capacity, using the
    /// default allocator for `S`.
    ///
    /// `shape` is the shape the array can grow to without reallocating. The
    /// leading dimension of the result is zero, so no elements are
    /// constructed.
    pub fn with_capacity(shape: [usize; N]) -> Self {
        Self::with_capacity_in(S::default_allocator(), shape)
    }

    /// Variant of [`with_capacity`](Array::with_capacity) which takes an
    /// allocator.
    pub fn with_capacity_in(allocator: AllocatorId, shape: [usize; N]) -> Self {
        Self::alloc_in(allocator, shape, shape_len(shape))
    }

    /// Create an array from a vector of elements in row-major order, using
    /// the default allocator for `S`.
    ///
    /// Panics if the length of `data` does not match the product of `shape`.
    pub fn from_data(shape: [usize; N], data: Vec<T>) -> Self {
        Self::from_data_in(S::default_allocator(), shape, data)
    }

    /// Variant of [`from_data`](Array::from_data) which takes an allocator.
    pub fn from_data_in(allocator: AllocatorId, shape: [usize; N], data: Vec<T>) -> Self {
        Self::try_from_data_in(allocator, shape, data)
            .unwrap_or_else(|err| panic!("invalid array data: {}", err))
    }

    /// Variant of [`from_data`](Array::from_data) which returns an error
    /// instead of panicking.
    pub fn try_from_data(shape: [usize; N], data: Vec<T>) -> Result<Self, FromDataError> {
        Self::try_from_data_in(S::default_allocator(), shape, data)
    }

    /// Variant of [`from_data_in`](Array::from_data_in) which returns an
    /// error instead of panicking.
    pub fn try_from_data_in(
        allocator: AllocatorId,
        shape: [usize; N],
        data: Vec<T>,
    ) -> Result<Self, FromDataError> {
        // A shape whose element count overflows can never match.
        let len = match NdLayout::checked_len(shape) {
            Some(len) if len == data.len() => len,
            _ => return Err(FromDataError::StorageLengthMismatch),
        };
        let mut array = Self::alloc_in(allocator, shape, len);
        let ops = array.element_ops();

        // Safety: The buffer has space for `len` elements, none of which are
        // live.
        unsafe { ops.move_from_vec(array.as_mut_ptr(), data) };
        array.layout.resize_dim(0, shape[0]);
        Ok(array)
    }

    /// Return the number of elements the array can hold without
    /// reallocating.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the factor by which capacity grows when the array runs out of
    /// space.
    pub fn resize_ratio(&self) -> f64 {
        self.resize_ratio
    }

    /// Set the factor by which capacity grows when the array runs out of
    /// space.
    ///
    /// A ratio below 1.0 disables growth. Any operation which then needs more
    /// capacity panics, but [`reserve`](Array::reserve) still works.
    pub fn set_resize_ratio(&mut self, ratio: f64) {
        self.resize_ratio = ratio;
    }

    /// Return the elements as a slice, in row-major order.
    ///
    /// The array must be [host-accessible](ArrayBase::is_host_accessible).
    /// This is checked in debug builds.
    pub fn as_slice(&self) -> &[T] {
        debug_check_host(self);
        // Safety: The first `len` elements of the buffer are live.
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    /// Return the elements as a mutable slice, in row-major order.
    ///
    /// See [`as_slice`](Array::as_slice).
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        debug_check_host(self);
        let len = self.len();
        // Safety: The first `len` elements of the buffer are live.
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    /// Return an iterator over elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Return a mutable iterator over elements in row-major order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Return a view of this array's elements.
    pub fn view(&self) -> ArrayView<'_, T, N, S> {
        ArrayView::new(self)
    }

    /// Return a mutable view of this array's elements.
    ///
    /// Writes through the view modify this array.
    pub fn view_mut(&mut self) -> ArrayViewMut<'_, T, N, S> {
        ArrayViewMut::new(self)
    }

    /// Ensure the array can hold at least `capacity` elements without
    /// reallocating.
    ///
    /// Does nothing if the capacity is already sufficient.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.set_capacity(round_up(capacity, self.layout.block_size()));
        }
    }

    /// Reduce the capacity to the current number of elements.
    pub fn shrink(&mut self) {
        self.set_capacity(self.len());
    }

    /// Drop all elements, keeping the capacity and trailing dimensions.
    pub fn clear(&mut self) {
        self.truncate_rows(0);
    }

    /// Remove the entries at `index` along the leading dimension.
    ///
    /// For a 1D array this removes one element. Panics if `index` is out of
    /// bounds.
    pub fn erase(&mut self, index: usize) {
        self.erase_range(index..index + 1);
    }

    /// Remove the entries in `range` along the leading dimension, shifting
    /// later entries down.
    ///
    /// Panics if `range` is out of bounds.
    pub fn erase_range(&mut self, range: Range<usize>) {
        let rows = self.layout.size(0);
        assert!(
            range.start <= range.end && range.end <= rows,
            "erase range {:?} out of bounds for length {}",
            range,
            rows
        );
        let block = self.layout.block_size();
        let len = self.len();
        let (start, end) = (range.start * block, range.end * block);
        let ops = self.element_ops();
        let ptr = self.as_mut_ptr();

        // Shorten first, so that a panicking destructor leaks the tail
        // rather than exposing dropped values.
        self.layout.resize_dim(0, range.start);

        // Safety: `start..len` are live, and `start..end` is within it.
        unsafe {
            ops.destroy(ptr, start..end);
            ops.relocate(ptr, end..len, start);
        }
        self.layout.resize_dim(0, rows - range.len());
    }

    /// Shorten the array to `rows` entries along the leading dimension,
    /// dropping the rest.
    fn truncate_rows(&mut self, rows: usize) {
        let old_len = self.len();
        if rows >= self.layout.size(0) {
            return;
        }
        let ops = self.element_ops();
        let ptr = self.as_mut_ptr();
        self.layout.resize_dim(0, rows);
        let new_len = self.len();

        // Safety: Elements `new_len..old_len` were live, and are no longer
        // covered by the layout.
        unsafe { ops.destroy(ptr, new_len..old_len) };
    }

    /// Return the number of elements in `rows` entries along the leading
    /// dimension, panicking on overflow.
    fn rows_len(&self, rows: usize) -> usize {
        rows.checked_mul(self.layout.block_size())
            .unwrap_or_else(|| panic!("capacity overflow resizing to {} rows", rows))
    }

    /// Make room for at least `required` elements, growing by the resize
    /// ratio.
    fn grow_for(&mut self, required: usize) {
        if required <= self.capacity {
            return;
        }
        assert!(
            self.resize_ratio >= 1.0,
            "resize ratio of {} does not allow the array to grow",
            self.resize_ratio
        );
        let scaled = (self.len() as f64 * self.resize_ratio).round() as usize;
        let capacity = round_up(required.max(scaled), self.layout.block_size());
        self.set_capacity(capacity);
    }

    /// Reallocate the buffer to hold exactly `capacity` elements.
    fn set_capacity(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.len());
        if capacity == self.capacity {
            return;
        }

        self.data = if capacity == 0 {
            // Safety: No elements are live, since `len <= capacity`.
            unsafe { deallocate(&mut self.data) };
            None
        } else if self.data.is_none() {
            alloc_buffer(self.allocator, capacity)
        } else {
            // Safety: The buffer came from `self.allocator` and values are
            // moved bitwise, which is valid for any Rust type.
            match unsafe { reallocate(self.data, capacity) } {
                Some(ptr) => Some(ptr),
                None => alloc_failure::<T>(capacity),
            }
        };

        tracing::trace!(
            old_capacity = self.capacity,
            new_capacity = capacity,
            "resized array buffer"
        );
        self.capacity = capacity;
    }

    /// Create a deep copy of this array in another allocator.
    pub fn clone_in<S2: Space>(&self, allocator: AllocatorId) -> Array<T, N, S2>
    where
        T: Clone,
    {
        let mut out = Array::<T, N, S2>::alloc_in(allocator, self.layout.shape(), self.capacity);
        let ops = out.element_ops();

        // Safety: `out` has space for `len` elements, none live, and is a
        // distinct allocation from `self`.
        unsafe {
            ops.clone_into(
                out.as_mut_ptr(),
                self.as_ptr(),
                self.len(),
                &self.element_ops(),
            )
        };
        out.layout = self.layout;
        out.resize_ratio = self.resize_ratio;
        out
    }

    /// Create a deep copy of this array in the default allocator of space
    /// `S2`.
    pub fn to_space<S2: Space>(&self) -> Array<T, N, S2>
    where
        T: Clone,
    {
        self.clone_in(S2::default_allocator())
    }

    /// Clone the contents of `other` into this array, inserting them before
    /// entry `pos` of the leading dimension.
    ///
    /// Panics if the dimensions other than the leading one differ, or if
    /// `pos` is out of bounds.
    pub fn insert_from<A>(&mut self, pos: usize, other: &A)
    where
        A: ArrayBase<Elem = T, Layout = NdLayout<N>>,
        T: Clone,
    {
        self.try_insert_from(pos, other)
            .unwrap_or_else(|err| panic!("{}", err))
    }

    /// Variant of [`insert_from`](Array::insert_from) which returns an error
    /// if the shapes are incompatible.
    ///
    /// The array is not modified if an error is returned.
    pub fn try_insert_from<A>(&mut self, pos: usize, other: &A) -> Result<(), ExpandError>
    where
        A: ArrayBase<Elem = T, Layout = NdLayout<N>>,
        T: Clone,
    {
        if !self.layout.trailing_dims_match(other.layout()) {
            return Err(ExpandError::ShapeMismatch);
        }
        let rows = self.layout.size(0);
        assert!(
            pos <= rows,
            "insertion index (is {}) should be <= len (is {})",
            pos,
            rows
        );

        let len = self.len();
        let n = other.len();
        let new_rows = grown_len(rows, other.size(0));
        let at = pos * self.layout.block_size();
        self.grow_for(grown_len(len, n));

        let ops = self.element_ops();
        let ptr = self.as_mut_ptr();

        // If cloning panics, entries from `pos` on are leaked.
        self.layout.resize_dim(0, pos);

        // Safety: After growing, the buffer has space for `len + n`
        // elements. `other` cannot alias `self`, which is borrowed mutably.
        unsafe {
            ops.relocate(ptr, at..len, at + n);
            ops.clone_into(ptr.add(at), other.as_ptr(), n, &other.element_ops());
        }
        self.layout.resize_dim(0, new_rows);
        Ok(())
    }

    /// Clone the contents of `other` onto the end of this array.
    ///
    /// Panics if the dimensions other than the leading one differ.
    pub fn append<A>(&mut self, other: &A)
    where
        A: ArrayBase<Elem = T, Layout = NdLayout<N>>,
        T: Clone,
    {
        let rows = self.layout.size(0);
        self.insert_from(rows, other);
    }

    /// Replace every element with a clone of `value`.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        let rows = self.layout.size(0);
        let len = self.len();
        let ops = self.element_ops();
        let ptr = self.as_mut_ptr();
        self.layout.resize_dim(0, 0);

        // Safety: All `len` elements are live before `destroy`, and none
        // after it.
        unsafe {
            ops.destroy(ptr, 0..len);
            ops.fill(ptr, len, &value);
        }
        self.layout.resize_dim(0, rows);
    }

    /// Replace every element with `value`, using a loop in the execution
    /// space of this array's memory instead of a host copy.
    pub fn fill_copy(&mut self, value: T)
    where
        T: Copy + Send + Sync,
    {
        let len = self.len();
        let ops = self.element_ops();

        // Safety: The first `len` slots are valid, and `Copy` types have no
        // destructor to run before overwriting.
        unsafe { ops.fill_copy(self.as_mut_ptr(), len, value) };
    }

    /// Resize the leading dimension to `n`, filling new entries with clones
    /// of `value`.
    pub fn resize_with_value(&mut self, n: usize, value: T)
    where
        T: Clone,
    {
        if n <= self.layout.size(0) {
            self.truncate_rows(n);
            return;
        }
        let old_len = self.len();
        let new_len = self.rows_len(n);
        self.grow_for(new_len);
        let ops = self.element_ops();

        // Safety: Slots `old_len..new_len` are allocated and uninitialized.
        unsafe { ops.fill(self.as_mut_ptr().add(old_len), new_len - old_len, &value) };
        self.layout.resize_dim(0, n);
    }
}

impl<T: Default, const N: usize, S: Space> Array<T, N, S> {
    /// Create an array of default values, using the default allocator for
    /// `S`.
    pub fn new(shape: [usize; N]) -> Self {
        Self::new_in(S::default_allocator(), shape)
    }

    /// Variant of [`new`](Array::new) which takes an allocator.
    pub fn new_in(allocator: AllocatorId, shape: [usize; N]) -> Self {
        let len = shape_len(shape);
        let mut array = Self::alloc_in(allocator, shape, len);
        let ops = array.element_ops();

        // Safety: The buffer has space for `len` uninitialized elements.
        unsafe { ops.init(array.as_mut_ptr(), 0..len) };
        array.layout.resize_dim(0, shape[0]);
        array
    }

    /// Resize the leading dimension to `n`, default-constructing new
    /// entries and dropping removed ones.
    pub fn resize(&mut self, n: usize) {
        if n <= self.layout.size(0) {
            self.truncate_rows(n);
            return;
        }
        let old_len = self.len();
        let new_len = self.rows_len(n);
        self.grow_for(new_len);
        let ops = self.element_ops();

        // Safety: Slots `old_len..new_len` are allocated and uninitialized.
        unsafe { ops.init(self.as_mut_ptr(), old_len..new_len) };
        self.layout.resize_dim(0, n);
    }
}

impl<T: Clone, const N: usize, S: Space> Array<T, N, S> {
    /// Create an array filled with clones of `value`, using the default
    /// allocator for `S`.
    pub fn full(shape: [usize; N], value: T) -> Self {
        Self::full_in(S::default_allocator(), shape, value)
    }

    /// Variant of [`full`](Array::full) which takes an allocator.
    pub fn full_in(allocator: AllocatorId, shape: [usize; N], value: T) -> Self {
        let len = shape_len(shape);
        let mut array = Self::alloc_in(allocator, shape, len);
        let ops = array.element_ops();

        // Safety: The buffer has space for `len` uninitialized elements.
        unsafe { ops.fill(array.as_mut_ptr(), len, &value) };
        array.layout.resize_dim(0, shape[0]);
        array
    }
}

impl<T, S: Space> Array<T, 1, S> {
    /// Append an element.
    pub fn push(&mut self, value: T) {
        let len = self.len();
        self.insert(len, value);
    }

    /// Insert an element at `index`, shifting later elements up.
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        self.emplace(index, || value);
    }

    /// Construct an element at `index` with `make`, shifting later elements
    /// up.
    ///
    /// The element is created after space has been made for it.
    ///
    /// Panics if `index > len`.
    pub fn emplace<F: FnOnce() -> T>(&mut self, index: usize, make: F) {
        let len = self.len();
        assert!(
            index <= len,
            "insertion index (is {}) should be <= len (is {})",
            index,
            len
        );
        self.grow_for(grown_len(len, 1));
        let ops = self.element_ops();
        let ptr = self.as_mut_ptr();

        // If `make` panics, elements from `index` on are leaked.
        self.layout.resize_dim(0, index);

        // Safety: The buffer has space for `len + 1` elements.
        unsafe {
            ops.relocate(ptr, index..len, index + 1);
            ops.emplace(ptr, index, make());
        }
        self.layout.resize_dim(0, len + 1);
    }

    /// Clone `values` into the array before `index`.
    ///
    /// Panics if `index > len`.
    pub fn insert_slice(&mut self, index: usize, values: &[T])
    where
        T: Clone,
    {
        self.insert_from(index, &ArrayView::<T>::from_slice(values, [values.len()]));
    }

    /// Remove and return the last element, or `None` if the array is empty.
    pub fn pop(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let ops = self.element_ops();
        self.layout.resize_dim(0, len - 1);

        // Safety: Element `len - 1` was live and is no longer covered by the
        // layout.
        Some(unsafe { ops.take(self.as_mut_ptr(), len - 1) })
    }
}

impl<T, const N: usize, S: Space> ArrayBase for Array<T, N, S> {
    type Elem = T;
    type Layout = NdLayout<N>;
    type Space = S;
    const IS_VIEW: bool = false;

    fn layout(&self) -> &NdLayout<N> {
        &self.layout
    }

    fn as_ptr(&self) -> *const T {
        self.data.unwrap_or(NonNull::dangling()).as_ptr()
    }

    fn allocator_id(&self) -> AllocatorId {
        self.allocator
    }
}

impl<T, const N: usize, S: Space> ArrayBaseMut for Array<T, N, S> {
    fn as_mut_ptr(&mut self) -> *mut T {
        self.data.unwrap_or(NonNull::dangling()).as_ptr()
    }
}

impl<T, const N: usize, S: Space> Drop for Array<T, N, S> {
    fn drop(&mut self) {
        let len = self.len();
        let ops = self.element_ops();

        // Safety: The first `len` elements are live, and the buffer came
        // from `self.allocator`.
        unsafe {
            ops.destroy(self.as_mut_ptr(), 0..len);
            deallocate(&mut self.data);
        }
    }
}

impl<T, const N: usize, S: Space> Default for Array<T, N, S> {
    /// Create an empty array which has not allocated.
    fn default() -> Self {
        Self::alloc_in(S::default_allocator(), [0; N], 0)
    }
}

impl<T: Clone, const N: usize, S: Space> Clone for Array<T, N, S> {
    fn clone(&self) -> Self {
        self.clone_in(self.allocator)
    }
}

impl<T: PartialEq, const N: usize, S: Space, V> PartialEq<V> for Array<T, N, S>
where
    V: ArrayBase<Elem = T, Layout = NdLayout<N>>,
{
    fn eq(&self, other: &V) -> bool {
        array_eq(self, other)
    }
}

impl<T, const N: usize, S: Space> Index<[usize; N]> for Array<T, N, S> {
    type Output = T;

    /// Return the element at a given index.
    ///
    /// Panics if the index is out of bounds.
    fn index(&self, index: [usize; N]) -> &T {
        debug_check_host(self);
        let offset = self.layout.offset(index);
        // Safety: `offset` was bounds-checked against the live elements.
        unsafe { &*self.as_ptr().add(offset) }
    }
}

impl<T, const N: usize, S: Space> IndexMut<[usize; N]> for Array<T, N, S> {
    fn index_mut(&mut self, index: [usize; N]) -> &mut T {
        debug_check_host(self);
        let offset = self.layout.offset(index);
        // Safety: `offset` was bounds-checked against the live elements.
        unsafe { &mut *self.as_mut_ptr().add(offset) }
    }
}

impl<T, const N: usize, S: Space> Index<usize> for Array<T, N, S> {
    type Output = T;

    /// Return the element at a given offset in row-major order.
    ///
    /// Panics if the offset is out of bounds.
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T, const N: usize, S: Space> IndexMut<usize> for Array<T, N, S> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T, S: Space> FromIterator<T> for Array<T, 1, S> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let data: Vec<T> = iter.into_iter().collect();
        Self::from_data([data.len()], data)
    }
}

impl<T, S: Space> From<Vec<T>> for Array<T, 1, S> {
    fn from(data: Vec<T>) -> Self {
        Self::from_data([data.len()], data)
    }
}

impl<T, S: Space> Extend<T> for Array<T, 1, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(grown_len(self.len(), lower));
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T, const N: usize, S: Space> IntoIterator for &'a Array<T, N, S> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests;
