use std::fmt::{Debug, Error, Formatter};

use axom_memory::Space;

use crate::array_base::ArrayBase;
use crate::layout::NdLayout;
use crate::{Array, ArrayView, ArrayViewMut};

/// Entry in the formatted representation of an array's data.
enum Entry<'a, T: Debug> {
    Value(&'a T),

    /// "..." used to elide long dimensions.
    Ellipsis,
}

impl<T: Debug> Debug for Entry<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Entry::Value(val) => write!(f, "{:?}", val),
            Entry::Ellipsis => write!(f, "..."),
        }
    }
}

/// Configuration for debug formatting of an array.
struct FormatOptions {
    /// Maximum number of columns to print before eliding.
    pub max_columns: usize,

    /// Maximum number of rows to print before eliding.
    pub max_rows: usize,

    /// Maximum number of sub-matrices to print before eliding.
    pub max_matrices: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            max_columns: 10,
            max_rows: 10,
            max_matrices: 10,
        }
    }
}

/// A [`Debug`]-implementing wrapper around an array reference with custom
/// formatting options.
///
/// Elements of memory which is not host-accessible are formatted from a host
/// copy.
struct FormatArray<'a, A> {
    array: &'a A,
    opts: FormatOptions,
}

impl<'a, A> FormatArray<'a, A> {
    fn new(array: &'a A, opts: FormatOptions) -> Self {
        Self { array, opts }
    }

    /// Format one row of values as a list (`[0, 1, 2, ... n]`).
    fn write_vector<T: Debug>(&self, f: &mut Formatter<'_>, row: &[T]) -> Result<(), Error> {
        let len = row.len();
        let head = &row[..len.min(self.opts.max_columns / 2)];
        let tail = &row[len.saturating_sub(self.opts.max_columns / 2).max(head.len())..];

        let mut data_fmt = f.debug_list();
        if len > self.opts.max_columns {
            data_fmt.entries(head.iter().map(Entry::Value));
            data_fmt.entry(&Entry::<T>::Ellipsis);
            data_fmt.entries(tail.iter().map(Entry::Value));
        } else {
            data_fmt.entries(row.iter().map(Entry::Value));
        }
        data_fmt.finish()
    }

    /// Format a row-major matrix with `cols` columns.
    ///
    /// `extra_indent` specifies the amount of additional indentation to
    /// apply to rows after the first one.
    fn write_matrix<T: Debug>(
        &self,
        f: &mut Formatter<'_>,
        mat: &[T],
        cols: usize,
        extra_indent: usize,
    ) -> Result<(), Error> {
        let rows = mat.len() / cols;
        let shown_rows = rows.min(self.opts.max_rows);

        write!(f, "[")?;
        for (row, data) in mat.chunks(cols).take(shown_rows).enumerate() {
            self.write_vector(f, data)?;

            if row < shown_rows - 1 {
                write!(f, ",\n{:>width$}", ' ', width = extra_indent + 1)?;
            } else if rows > self.opts.max_rows {
                write!(f, ",\n{}...", " ".repeat(extra_indent + 1))?;
            }
        }
        write!(f, "]")
    }

    fn write_data<T: Debug, const N: usize>(
        &self,
        f: &mut Formatter<'_>,
        data: &[T],
        shape: [usize; N],
    ) -> Result<(), Error> {
        if N == 1 {
            return self.write_vector(f, data);
        }

        let outer_dims = N.saturating_sub(2);
        let cols = shape[N - 1];
        let mat_len = shape[outer_dims] * cols;
        if mat_len == 0 || data.is_empty() {
            return write!(f, "{}{}", "[".repeat(N), "]".repeat(N));
        }

        let n_matrices = data.len() / mat_len;
        let shown = n_matrices.min(self.opts.max_matrices);

        write!(f, "{}", "[".repeat(outer_dims))?;
        for (i, mat) in data.chunks(mat_len).take(shown).enumerate() {
            if i > 0 {
                write!(f, "{}", " ".repeat(outer_dims))?;
            }

            self.write_matrix(f, mat, cols, outer_dims)?;

            if i < shown - 1 {
                write!(f, ",\n\n")?;
            } else if n_matrices > self.opts.max_matrices {
                write!(f, "\n\n{}...\n\n", " ".repeat(outer_dims))?;
            }
        }
        write!(f, "{}", "]".repeat(outer_dims))
    }
}

impl<T: Debug, const N: usize, A> Debug for FormatArray<'_, A>
where
    A: ArrayBase<Elem = T, Layout = NdLayout<N>>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let array = self.array;

        // Safety: The array holds `len` live elements.
        unsafe {
            array
                .element_ops()
                .inspect(array.as_ptr(), array.len(), |data| {
                    self.write_data(f, data, array.shape())
                })?;
        }

        write!(
            f,
            ", shape={:?}, strides={:?}, space={}",
            array.shape(),
            array.strides(),
            array.memory_space()
        )
    }
}

impl<T: Debug, const N: usize, S: Space> Debug for Array<T, N, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{:?}", FormatArray::new(self, FormatOptions::default()))
    }
}

impl<T: Debug, const N: usize, S: Space> Debug for ArrayView<'_, T, N, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{:?}", FormatArray::new(self, FormatOptions::default()))
    }
}

impl<T: Debug, const N: usize, S: Space> Debug for ArrayViewMut<'_, T, N, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{:?}", FormatArray::new(self, FormatOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::{FormatArray, FormatOptions};
    use crate::Array;

    #[test]
    fn test_debug() {
        struct Case<'a> {
            array: Array<f32>,
            opts: FormatOptions,
            expected: &'a str,
        }

        let cases = [
            // Empty vector
            Case {
                array: Array::default(),
                opts: FormatOptions::default(),
                expected: "[], shape=[0], strides=[1], space=host",
            },
            // Short vector
            Case {
                array: Array::from(vec![1., 2., 3., 4.]),
                opts: FormatOptions::default(),
                expected: "[1.0, 2.0, 3.0, 4.0], shape=[4], strides=[1], space=host",
            },
            // Long vector
            Case {
                array: (1..22).map(|x| x as f32).collect(),
                opts: FormatOptions {
                    max_columns: 10,
                    ..Default::default()
                },
                expected: "[1.0, 2.0, 3.0, 4.0, 5.0, ..., 17.0, 18.0, 19.0, 20.0, 21.0], shape=[21], strides=[1], space=host",
            },
        ];

        for Case {
            array,
            opts,
            expected,
        } in cases
        {
            let debug_str = format!("{:?}", FormatArray::new(&array, opts));
            assert_eq!(debug_str, expected);
        }
    }

    #[test]
    fn test_debug_matrix() {
        let mat = Array::<i32, 2>::from_data([2, 2], vec![1, 2, 3, 4]);
        assert_eq!(
            format!("{:?}", mat),
            "
[[1, 2],
 [3, 4]], shape=[2, 2], strides=[2, 1], space=host"
                .trim()
        );

        let elided = Array::<i32, 2>::from_data([3, 1], vec![1, 2, 3]);
        let opts = FormatOptions {
            max_rows: 2,
            ..Default::default()
        };
        assert_eq!(
            format!("{:?}", FormatArray::new(&elided, opts)),
            "
[[1],
 [2],
 ...], shape=[3, 1], strides=[1, 1], space=host"
                .trim()
        );
    }

    #[test]
    fn test_debug_3d() {
        let arr = Array::<i32, 3>::from_data([2, 1, 2], vec![1, 2, 3, 4]);
        let opts = FormatOptions {
            max_matrices: 1,
            ..Default::default()
        };
        assert_eq!(
            format!("{:?}", FormatArray::new(&arr, opts)),
            "
[[[1, 2]]

 ...

], shape=[2, 1, 2], strides=[2, 2, 1], space=host"
                .trim()
        );

        let empty = Array::<i32, 3>::with_capacity([2, 2, 2]);
        assert_eq!(
            format!("{:?}", empty),
            "[[[]]], shape=[0, 2, 2], strides=[4, 2, 1], space=host"
        );
    }

    #[test]
    fn test_debug_view() {
        let arr = Array::<u8>::from_data([2], vec![5, 6]);
        assert_eq!(
            format!("{:?}", arr.view()),
            "[5, 6], shape=[2], strides=[1], space=host"
        );
    }

    #[cfg(feature = "device")]
    #[test]
    fn test_debug_device() {
        use axom_memory::space::Device;

        let arr = Array::<u8, 1, Device>::from_data([2], vec![5, 6]);
        assert_eq!(
            format!("{:?}", arr),
            "[5, 6], shape=[2], strides=[1], space=device"
        );
    }
}
