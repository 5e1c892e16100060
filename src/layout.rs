//! Shape, strides and the mapping from indices to buffer offsets.

/// Layouts describe the shape of an array, ie. the number of dimensions and
/// size of each, and the mapping between indices and offsets in the data
/// buffer.
pub trait Layout {
    /// Type used to represent indices, shapes and strides.
    type Index: AsRef<[usize]> + Copy + std::fmt::Debug + PartialEq;

    /// Map an index to a buffer offset.
    ///
    /// Panics if any dimension of the index is out of bounds.
    #[inline]
    fn offset(&self, index: Self::Index) -> usize {
        self.try_offset(index).unwrap_or_else(|| {
            panic!(
                "index {:?} out of bounds for shape {:?}",
                index.as_ref(),
                self.shape().as_ref()
            );
        })
    }

    /// Map an index to a buffer offset, without checking if it is valid for
    /// the array's shape.
    ///
    /// This method is not itself unsafe, because it only computes an offset
    /// but does not access any data.
    fn offset_unchecked(&self, index: Self::Index) -> usize {
        index
            .as_ref()
            .iter()
            .zip(self.strides().as_ref())
            .map(|(idx, stride)| idx * stride)
            .sum()
    }

    /// Map an index to a buffer offset, or return `None` if the index is out
    /// of bounds along any dimension.
    fn try_offset(&self, index: Self::Index) -> Option<usize>;

    /// Return the number of dimensions.
    fn ndim(&self) -> usize;

    /// Returns the number of elements in the array.
    fn len(&self) -> usize;

    /// Returns true if the array has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an array of the sizes of each dimension.
    fn shape(&self) -> Self::Index;

    /// Returns the size of the dimension `dim`.
    fn size(&self, dim: usize) -> usize {
        self.shape().as_ref()[dim]
    }

    /// Returns an array of the strides of each dimension.
    fn strides(&self) -> Self::Index;

    /// Returns the offset between adjacent indices along dimension `dim`.
    fn stride(&self, dim: usize) -> usize {
        self.strides().as_ref()[dim]
    }
}

/// Row-major layout of an N-dimensional array, where N is known at compile
/// time.
///
/// The last dimension is contiguous and the strides are always those of a
/// contiguous array with the current shape. There is no way to set strides
/// directly. Changing the shape recomputes them.
///
/// The number of elements in one step along the leading dimension is the
/// [block size](NdLayout::block_size). Arrays grow and shrink in multiples of
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NdLayout<const N: usize> {
    shape: [usize; N],
    strides: [usize; N],
}

impl<const N: usize> Layout for NdLayout<N> {
    type Index = [usize; N];

    fn ndim(&self) -> usize {
        N
    }

    fn len(&self) -> usize {
        self.shape.iter().product()
    }

    #[inline]
    fn try_offset(&self, index: [usize; N]) -> Option<usize> {
        if !self.index_valid(index) {
            return None;
        }
        Some(self.offset_unchecked(index))
    }

    #[inline]
    fn offset_unchecked(&self, index: [usize; N]) -> usize {
        let mut offset = 0;
        for i in 0..N {
            offset += index[i] * self.strides[i];
        }
        offset
    }

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.shape
    }

    #[inline]
    fn strides(&self) -> [usize; N] {
        self.strides
    }
}

impl<const N: usize> NdLayout<N> {
    /// Return true if all components of `index` are in-bounds.
    pub fn index_valid(&self, index: [usize; N]) -> bool {
        let mut valid = true;
        for i in 0..N {
            valid = valid && index[i] < self.shape[i]
        }
        valid
    }

    /// Return the strides that a contiguous layout with a given shape would
    /// have.
    pub fn contiguous_strides(shape: [usize; N]) -> [usize; N] {
        let mut strides = [0; N];
        for i in 0..N {
            strides[i] = shape[i + 1..].iter().product();
        }
        strides
    }

    /// Return the number of elements in a layout with a given shape, or
    /// `None` if either it or the block size overflows `usize`.
    pub fn checked_len(shape: [usize; N]) -> Option<usize> {
        let block = shape[1..]
            .iter()
            .try_fold(1usize, |len, &size| len.checked_mul(size))?;
        block.checked_mul(shape[0])
    }

    /// Create a layout with a given shape.
    pub fn from_shape(shape: [usize; N]) -> Self {
        const { assert!(N > 0, "arrays must have at least one dimension") };
        Self {
            shape,
            strides: Self::contiguous_strides(shape),
        }
    }

    /// Recompute the strides from the current shape.
    pub fn update_strides(&mut self) {
        self.strides = Self::contiguous_strides(self.shape);
    }

    /// Change the size of dimension `dim`.
    pub fn resize_dim(&mut self, dim: usize, new_size: usize) {
        self.shape[dim] = new_size;
        self.update_strides();
    }

    /// Return the number of elements in one step along the leading dimension,
    /// ie. the product of the trailing dimensions.
    pub fn block_size(&self) -> usize {
        self.strides[0]
    }

    /// Return true if `other` has the same trailing dimensions as this
    /// layout, so that the two can be joined along the leading dimension.
    pub fn trailing_dims_match(&self, other: &NdLayout<N>) -> bool {
        self.shape[1..] == other.shape[1..]
    }
}

impl<const N: usize> Default for NdLayout<N> {
    fn default() -> Self {
        Self::from_shape([0; N])
    }
}

impl<const N: usize> From<[usize; N]> for NdLayout<N> {
    fn from(shape: [usize; N]) -> Self {
        Self::from_shape(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::{Layout, NdLayout};
    use axom_testing::TestCases;

    #[test]
    fn test_contiguous_strides() {
        #[derive(Debug)]
        struct Case {
            shape: [usize; 3],
            strides: [usize; 3],
        }

        let cases = [
            Case {
                shape: [2, 3, 4],
                strides: [12, 4, 1],
            },
            Case {
                shape: [0, 3, 4],
                strides: [12, 4, 1],
            },
            Case {
                shape: [5, 0, 2],
                strides: [0, 2, 1],
            },
        ];

        cases.test_each(|case| {
            let layout = NdLayout::from_shape(case.shape);
            assert_eq!(layout.strides(), case.strides);
            assert_eq!(layout.block_size(), case.strides[0]);
        });
    }

    #[test]
    fn test_offset() {
        let layout = NdLayout::from_shape([2, 3, 4]);
        assert_eq!(layout.offset([0, 0, 0]), 0);
        assert_eq!(layout.offset([1, 2, 3]), 23);
        assert_eq!(layout.try_offset([2, 0, 0]), None);
        assert_eq!(layout.try_offset([0, 3, 0]), None);
        assert_eq!(layout.offset_unchecked([2, 0, 0]), 24);
        assert_eq!(layout.len(), 24);
        assert_eq!(layout.ndim(), 3);
        assert_eq!(layout.size(2), 4);
        assert_eq!(layout.stride(1), 4);
    }

    #[test]
    #[should_panic(expected = "index [1, 3] out of bounds for shape [2, 3]")]
    fn test_offset_out_of_bounds() {
        NdLayout::from_shape([2, 3]).offset([1, 3]);
    }

    #[test]
    fn test_resize_dim() {
        let mut layout = NdLayout::from_shape([2, 3]);
        layout.resize_dim(0, 5);
        assert_eq!(layout.shape(), [5, 3]);
        assert_eq!(layout.strides(), [3, 1]);

        layout.resize_dim(1, 4);
        assert_eq!(layout.shape(), [5, 4]);
        assert_eq!(layout.strides(), [4, 1]);
        assert_eq!(layout.block_size(), 4);
    }

    #[test]
    fn test_one_dimensional() {
        let layout = NdLayout::from_shape([7]);
        assert_eq!(layout.strides(), [1]);
        assert_eq!(layout.block_size(), 1);
        assert_eq!(NdLayout::<1>::default().len(), 0);
        assert!(NdLayout::<1>::default().is_empty());
    }

    #[test]
    fn test_trailing_dims_match() {
        let a = NdLayout::from_shape([2, 3, 4]);
        assert!(a.trailing_dims_match(&NdLayout::from_shape([5, 3, 4])));
        assert!(!a.trailing_dims_match(&NdLayout::from_shape([2, 4, 3])));
    }

    #[test]
    fn test_checked_len() {
        assert_eq!(NdLayout::checked_len([2, 3, 4]), Some(24));
        assert_eq!(NdLayout::checked_len([0, 3]), Some(0));
        assert_eq!(NdLayout::checked_len([usize::MAX, 2]), None);

        // The block size overflows even though the element count is zero.
        assert_eq!(NdLayout::checked_len([0, usize::MAX, 4]), None);
    }
}
