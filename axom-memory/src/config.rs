use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::env::env_value;
use crate::{allocate_in, allocator_id, AllocatorId, MemorySpace};

/// Configuration of untargeted allocations.
///
/// The default memory space is the space used when an allocation does not
/// name one. Rather than a mutable global, it is held in a plain value that
/// callers pass to where allocations happen. [`default_config`] returns the
/// process-wide instance read from the environment, which is what the
/// `Dynamic` space marker uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryConfig {
    default_space: MemorySpace,
}

impl MemoryConfig {
    /// Create a config whose default space is host memory.
    pub fn new() -> MemoryConfig {
        MemoryConfig {
            default_space: MemorySpace::Host,
        }
    }

    /// Create a config from the `AXOM_DEFAULT_MEMORY_SPACE` environment
    /// variable, falling back to host memory if it is unset or invalid.
    pub fn from_env() -> MemoryConfig {
        let mut config = MemoryConfig::new();
        if let Some(space) = env_value::<MemorySpace>("AXOM_DEFAULT_MEMORY_SPACE") {
            if space.is_concrete() {
                config.default_space = space;
            } else {
                tracing::warn!("AXOM_DEFAULT_MEMORY_SPACE must name a concrete space");
            }
        }
        config
    }

    /// Return a copy of this config with a different default space.
    pub fn with_default_space(mut self, space: MemorySpace) -> MemoryConfig {
        self.set_default_space(space);
        self
    }

    /// Change the space used by subsequent untargeted allocations made with
    /// this config.
    ///
    /// Panics if `space` is [`MemorySpace::Dynamic`].
    pub fn set_default_space(&mut self, space: MemorySpace) {
        assert!(
            space.is_concrete(),
            "the default memory space must be a concrete space"
        );
        self.default_space = space;
    }

    /// Return the space used for untargeted allocations.
    pub fn default_space(&self) -> MemorySpace {
        self.default_space
    }

    /// Return the allocator used for untargeted allocations.
    pub fn default_allocator(&self) -> AllocatorId {
        allocator_id(self.default_space)
    }

    /// Allocate space for `n` values of type `T` in the default space.
    ///
    /// See [`allocate`](crate::allocate).
    pub fn allocate<T>(&self, n: usize) -> Option<NonNull<T>> {
        allocate_in(n, self.default_allocator())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Return the process-wide config, read from the environment on first use.
pub fn default_config() -> &'static MemoryConfig {
    static CONFIG: OnceLock<MemoryConfig> = OnceLock::new();
    CONFIG.get_or_init(MemoryConfig::from_env)
}
