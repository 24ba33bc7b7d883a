//! Pattern registry for index-based pattern selection.

use super::{Pattern, PatternInfo};

/// Registered patterns, selectable by index in registration order.
#[derive(Default)]
pub struct PatternRegistry {
    patterns: Vec<Box<dyn Pattern>>,
}

impl core::fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.patterns.iter().map(|p| p.name()))
            .finish()
    }
}

impl PatternRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern and return its index.
    pub fn register(&mut self, pattern: Box<dyn Pattern>) -> usize {
        self.patterns.push(pattern);
        self.patterns.len() - 1
    }

    /// Get a pattern by index.
    pub fn get(&self, index: usize) -> Option<&dyn Pattern> {
        self.patterns.get(index).map(|p| p.as_ref())
    }

    /// Get a mutable pattern by index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Pattern + 'static)> {
        self.patterns.get_mut(index).map(|p| p.as_mut())
    }

    /// Get the number of registered patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Name and index of every pattern.
    pub fn infos(&self) -> impl Iterator<Item = PatternInfo> + '_ {
        self.patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| PatternInfo::new(index, pattern.name()))
    }
}
