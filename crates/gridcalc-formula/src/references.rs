//! Dependency tracking between cells

use gridcalc_core::CellPosition;
use std::collections::{BTreeMap, BTreeSet};

/// Bidirectional dependency graph
///
/// Every edge is stored twice: once under the cell that reads (`references`) and once
/// under the cell being read (`referenced_by`). The two maps are always mirror images.
#[derive(Debug, Default, Clone)]
pub struct ReferencesMap {
    /// Cell -> cells it reads
    references: BTreeMap<CellPosition, BTreeSet<CellPosition>>,
    /// Cell -> cells that read it
    referenced_by: BTreeMap<CellPosition, BTreeSet<CellPosition>>,
}

impl ReferencesMap {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` reads every position in `to`
    ///
    /// `from` gets an entry even when `to` is empty, which marks it as known to the graph.
    pub fn add_references<I>(&mut self, from: &CellPosition, to: I)
    where
        I: IntoIterator<Item = CellPosition>,
    {
        let forward = self.references.entry(from.clone()).or_default();
        for target in to {
            self.referenced_by
                .entry(target.clone())
                .or_default()
                .insert(from.clone());
            forward.insert(target);
        }
    }

    /// Drop every edge leaving `from`
    pub fn remove_references_from(&mut self, from: &CellPosition) {
        let Some(targets) = self.references.remove(from) else {
            return;
        };

        for target in targets {
            if let Some(readers) = self.referenced_by.get_mut(&target) {
                readers.remove(from);
                if readers.is_empty() {
                    self.referenced_by.remove(&target);
                }
            }
        }
    }

    /// Check whether the graph has any edge entry for `position`
    pub fn is_known(&self, position: &CellPosition) -> bool {
        self.references.contains_key(position) || self.referenced_by.contains_key(position)
    }

    /// Cells `position` reads directly
    pub fn references_of(&self, position: &CellPosition) -> impl Iterator<Item = &CellPosition> {
        self.references.get(position).into_iter().flatten()
    }

    /// Cells that read `position` directly
    pub fn dependents_of(&self, position: &CellPosition) -> impl Iterator<Item = &CellPosition> {
        self.referenced_by.get(position).into_iter().flatten()
    }

    /// Every cell whose value may change when `position` changes
    ///
    /// Includes `position` itself. Returns nothing for a position the graph has never seen.
    pub fn cells_depending_on(&self, position: &CellPosition) -> Vec<CellPosition> {
        if !self.is_known(position) {
            return Vec::new();
        }

        let mut result = Vec::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![position.clone()];

        while let Some(cell) = stack.pop() {
            if !visited.insert(cell.clone()) {
                continue;
            }
            stack.extend(
                self.dependents_of(&cell)
                    .filter(|dependent| !visited.contains(*dependent))
                    .cloned(),
            );
            result.push(cell);
        }

        result
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.references.clear();
        self.referenced_by.clear();
    }

    /// Check that every forward edge is mirrored and vice versa
    #[cfg(test)]
    fn is_mirrored(&self) -> bool {
        let forward_ok = self.references.iter().all(|(from, targets)| {
            targets
                .iter()
                .all(|t| self.referenced_by.get(t).is_some_and(|r| r.contains(from)))
        });
        let reverse_ok = self.referenced_by.iter().all(|(target, readers)| {
            !readers.is_empty()
                && readers
                    .iter()
                    .all(|r| self.references.get(r).is_some_and(|t| t.contains(target)))
        });
        forward_ok && reverse_ok
    }
}
