//! Per-position result caches

use crate::error::{FormulaError, FormulaResult};
use ahash::AHashMap;
use gridcalc_core::CellPosition;

/// One cache layer: successful results and errors, keyed by position
///
/// A position holds at most one of the two.
#[derive(Debug)]
pub struct CacheLayer<T> {
    results: AHashMap<CellPosition, T>,
    errors: AHashMap<CellPosition, FormulaError>,
}

impl<T: Clone> CacheLayer<T> {
    /// Create an empty layer
    pub fn new() -> Self {
        Self {
            results: AHashMap::new(),
            errors: AHashMap::new(),
        }
    }

    /// Cached outcome for `position`, if any
    pub fn lookup(&self, position: &CellPosition) -> Option<FormulaResult<T>> {
        if let Some(result) = self.results.get(position) {
            return Some(Ok(result.clone()));
        }
        self.errors.get(position).map(|e| Err(e.clone()))
    }

    /// Remember an outcome, replacing whatever was cached before
    pub fn store(&mut self, position: CellPosition, outcome: FormulaResult<T>) {
        match outcome {
            Ok(result) => {
                self.errors.remove(&position);
                self.results.insert(position, result);
            }
            Err(e) => {
                self.results.remove(&position);
                self.errors.insert(position, e);
            }
        }
    }

    /// Forget both the result and the error for `position`
    pub fn purge(&mut self, position: &CellPosition) {
        self.results.remove(position);
        self.errors.remove(position);
    }

    /// Number of cached outcomes
    pub fn len(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for CacheLayer<T> {
    fn default() -> Self {
        Self::new()
    }
}
