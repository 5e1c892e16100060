//! axom_core provides N-dimensional arrays whose elements can live in any
//! memory space: ordinary host memory, or device-style memory which host code
//! cannot read directly.
//!
//! # Memory spaces and allocators
//!
//! Memory is obtained from allocators registered with the global
//! [resource manager](axom_memory::ResourceManager) of the
//! [axom_memory] crate. Each allocator is identified by an [`AllocatorId`]
//! and belongs to a [`MemorySpace`]. Every concrete space has a built-in
//! allocator, and further allocators (such as
//! [pools](axom_memory::PoolResource)) can be registered at runtime.
//!
//! Array types take a [`Space`] marker as a type parameter. The default,
//! [`Dynamic`](space::Dynamic), accepts memory from any allocator and decides
//! at runtime how to access it. A static marker such as
//! [`Host`](space::Host) restricts the array to allocators in that space.
//!
//! # Array types and traits
//!
//! | Rank    | Owned     | Borrowed      | Mutably borrowed |
//! | ----    | -----     | --------      | ---------------- |
//! | Static  | [Array]   | [ArrayView]   | [ArrayViewMut]   |
//!
//! All of these implement [ArrayBase], which provides shape queries and
//! element access. The preferred way to import the traits is via the
//! prelude:
//!
//! ```
//! use axom_core::prelude::*;
//! use axom_core::Array;
//!
//! let mut arr = Array::<i32, 2>::from_data([2, 3], (0..6).collect());
//! assert_eq!(arr.strides(), [3, 1]);
//! assert_eq!(arr[[1, 2]], 5);
//!
//! arr.resize(3);
//! assert_eq!(arr.shape(), [3, 3]);
//! ```
//!
//! # Elements in memory which is not host-accessible
//!
//! Element constructors, destructors and clones always run on the host. For
//! memory which is not host-accessible they operate on a host copy which is
//! then transferred. See [`ElementOps`].
//!
//! # Serialization
//!
//! Arrays can be serialized and deserialized using [serde](https://serde.rs)
//! if the `serde` feature is enabled. The serialized representation includes
//! the shape and elements in row-major order:
//!
//! ```json
//! {
//!   "shape": [2, 2],
//!   "data": [0.5, 1.0, 1.5, 2.0]
//! }
//! ```
//!
//! # Environment variables
//!
//! - `AXOM_DEFAULT_MEMORY_SPACE` sets the space used by arrays with the
//!   dynamic space marker when no allocator is given.
//! - `AXOM_NUM_THREADS` sets the size of the thread pool used for loops
//!   over memory which is not host-accessible.
//! - `AXOM_TRACK_TRANSFERS` enables or disables counting of transfers by
//!   the built-in device allocators.

mod array;
mod array_base;
mod array_view;
pub mod errors;
pub mod execution;
pub mod layout;
mod ops;

mod impl_debug;
#[cfg(feature = "serde")]
mod impl_serialize;

// Re-exports for convenience.
pub use array::{Array, DEFAULT_RESIZE_RATIO};
pub use array_base::{ArrayBase, ArrayBaseMut};
pub use array_view::{ArrayView, ArrayViewMut};
pub use axom_memory::space;
pub use axom_memory::{AllocatorId, MemorySpace, Space};
pub use execution::ExecutionSpace;
pub use layout::{Layout, NdLayout};
pub use ops::ElementOps;

/// This module provides a convenient way to import the most common traits
/// from this library via a glob import.
pub mod prelude {
    pub use super::{ArrayBase, ArrayBaseMut, Layout};
}
