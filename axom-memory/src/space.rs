//! Memory spaces and the marker types used to select them statically.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::AllocatorId;

/// Identifies where a block of memory resides.
///
/// `Host` memory is always available. The other concrete spaces are only
/// enumerated when the crate is built with the `device` feature.
///
/// [`MemorySpace::Dynamic`] is a placeholder meaning "determined at runtime
/// by asking the allocator registry". It is never the space of an actual
/// allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemorySpace {
    /// Space is determined at runtime from the allocator.
    Dynamic,

    /// Ordinary host memory.
    Host,

    /// Page-locked host memory, suitable for fast transfers to a device.
    #[cfg(feature = "device")]
    Pinned,

    /// Device-resident memory. Not addressable from host code.
    #[cfg(feature = "device")]
    Device,

    /// Read-only device memory. Not addressable from host code.
    #[cfg(feature = "device")]
    Constant,

    /// Memory migrated on demand between host and device.
    #[cfg(feature = "device")]
    Unified,
}

#[cfg(not(feature = "device"))]
const CONCRETE_SPACES: [MemorySpace; 1] = [MemorySpace::Host];

#[cfg(feature = "device")]
const CONCRETE_SPACES: [MemorySpace; 5] = [
    MemorySpace::Host,
    MemorySpace::Pinned,
    MemorySpace::Device,
    MemorySpace::Constant,
    MemorySpace::Unified,
];

impl MemorySpace {
    /// Return all the concrete spaces enumerated in this build, in the order
    /// in which their built-in allocators are registered.
    pub fn concrete() -> &'static [MemorySpace] {
        &CONCRETE_SPACES
    }

    /// Return true if this is a real space, rather than [`MemorySpace::Dynamic`].
    pub fn is_concrete(self) -> bool {
        self != MemorySpace::Dynamic
    }

    /// Return true if host code can read and write memory in this space
    /// directly.
    ///
    /// Panics if called on [`MemorySpace::Dynamic`], whose accessibility
    /// depends on the allocator.
    pub fn is_host_accessible(self) -> bool {
        match self {
            MemorySpace::Dynamic => {
                panic!("host accessibility of the dynamic space depends on the allocator")
            }
            MemorySpace::Host => true,
            #[cfg(feature = "device")]
            MemorySpace::Pinned | MemorySpace::Unified => true,
            #[cfg(feature = "device")]
            MemorySpace::Device | MemorySpace::Constant => false,
        }
    }

    /// Return the lowercase name of the space, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            MemorySpace::Dynamic => "dynamic",
            MemorySpace::Host => "host",
            #[cfg(feature = "device")]
            MemorySpace::Pinned => "pinned",
            #[cfg(feature = "device")]
            MemorySpace::Device => "device",
            #[cfg(feature = "device")]
            MemorySpace::Constant => "constant",
            #[cfg(feature = "device")]
            MemorySpace::Unified => "unified",
        }
    }
}

impl Display for MemorySpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when parsing an unknown memory space name.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseSpaceError {
    name: String,
}

impl Display for ParseSpaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown memory space \"{}\"", self.name)
    }
}

impl Error for ParseSpaceError {}

impl FromStr for MemorySpace {
    type Err = ParseSpaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        [MemorySpace::Dynamic]
            .iter()
            .chain(MemorySpace::concrete())
            .copied()
            .find(|space| space.name() == lower)
            .ok_or_else(|| ParseSpaceError {
                name: s.to_string(),
            })
    }
}

/// Trait implemented by the marker types which select a memory space at
/// compile time.
///
/// Arrays and views are generic over a `Space`. When the space is known
/// statically, whether element operations must be staged through host
/// memory is a constant and no registry lookup is performed. The
/// [`Dynamic`] marker defers the decision to the allocator registry.
pub trait Space: Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    /// The space this marker selects.
    const SPACE: MemorySpace;

    /// Whether the space is host-accessible, or `None` if this depends on
    /// the allocator.
    const HOST_ACCESSIBLE: Option<bool>;

    /// Return the allocator used when none is given explicitly.
    fn default_allocator() -> AllocatorId;

    /// Return true if memory owned by allocator `id` is host-accessible.
    #[inline]
    fn host_accessible(id: AllocatorId) -> bool {
        match Self::HOST_ACCESSIBLE {
            Some(accessible) => accessible,
            None => crate::is_host_accessible(id),
        }
    }

    /// Return true if memory owned by allocator `id` may be labeled with
    /// this space.
    fn accepts(id: AllocatorId) -> bool {
        Self::SPACE == MemorySpace::Dynamic || crate::allocator_space(id) == Some(Self::SPACE)
    }
}

/// Marker for memory whose space is only known at runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dynamic;

impl Space for Dynamic {
    const SPACE: MemorySpace = MemorySpace::Dynamic;
    const HOST_ACCESSIBLE: Option<bool> = None;

    fn default_allocator() -> AllocatorId {
        crate::default_config().default_allocator()
    }
}

macro_rules! impl_space {
    ($name:ident, $space:ident, $host:literal) => {
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $name;

        impl Space for $name {
            const SPACE: MemorySpace = MemorySpace::$space;
            const HOST_ACCESSIBLE: Option<bool> = Some($host);

            fn default_allocator() -> AllocatorId {
                crate::allocator_id(MemorySpace::$space)
            }
        }
    };
}

impl_space!(Host, Host, true);
#[cfg(feature = "device")]
impl_space!(Pinned, Pinned, true);
#[cfg(feature = "device")]
impl_space!(Device, Device, false);
#[cfg(feature = "device")]
impl_space!(Constant, Constant, false);
#[cfg(feature = "device")]
impl_space!(Unified, Unified, true);
