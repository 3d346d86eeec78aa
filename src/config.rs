//! Capacity hints for a new [`TypeArray`](crate::TypeArray).

/// Up-front sizing for a [`TypeArray`](crate::TypeArray).
///
/// Both values are hints: the array grows past them as needed. Pre-sizing
/// avoids moving the arena while the first values go in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayConfig {
    /// Bytes to allocate for the arena up front.
    pub initial_bytes: usize,

    /// Number of distinct types to size the offset and destructor tables for.
    pub initial_types: usize,
}

impl ArrayConfig {
    /// A config that allocates nothing up front.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial arena size in bytes.
    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.initial_bytes = bytes;
        self
    }

    /// Sets the number of types to size the tables for.
    pub fn with_types(mut self, types: usize) -> Self {
        self.initial_types = types;
        self
    }

    /// Sizes a config to hold one value of each of the given layouts,
    /// assuming worst-case padding between them.
    pub fn for_layouts(layouts: &[std::alloc::Layout]) -> Self {
        let initial_bytes = layouts
            .iter()
            .map(|layout| layout.size() + layout.align() - 1)
            .sum();
        Self {
            initial_bytes,
            initial_types: layouts.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::Layout;

    #[test]
    fn default_allocates_nothing() {
        let config = ArrayConfig::default();
        assert_eq!(config.initial_bytes, 0);
        assert_eq!(config.initial_types, 0);
    }

    #[test]
    fn builder_sets_fields() {
        let config = ArrayConfig::new().with_bytes(512).with_types(4);
        assert_eq!(config, ArrayConfig { initial_bytes: 512, initial_types: 4 });
    }

    #[test]
    fn for_layouts_covers_worst_case_padding() {
        let config = ArrayConfig::for_layouts(&[Layout::new::<u8>(), Layout::new::<u64>()]);
        assert_eq!(config.initial_bytes, 1 + 15);
        assert_eq!(config.initial_types, 2);
    }
}
