//! Spreadsheet facade
//!
//! Wraps an [`Environment`] and fans its change notifications out to any number of
//! listeners.

use gridcalc_core::{CellContent, CellPosition};
use gridcalc_formula::{
    CalculationStats, Environment, EnvironmentConfig, FormulaResult, FormulaValue,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Events a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetEvent {
    /// An edit changed, or may have changed, the value of these cells
    CellsChanged,
}

/// Handle returned by [`Spreadsheet::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&[CellPosition])>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, SheetEvent, Listener)>,
}

impl Listeners {
    fn add(&mut self, event: SheetEvent, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, event, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _, _)| *entry != id);
        self.entries.len() != before
    }

    fn subscribed_to(&self, event: SheetEvent) -> Vec<Listener> {
        self.entries
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect()
    }
}

/// A spreadsheet: cell contents, lazily computed values and change listeners
///
/// # Example
///
/// ```rust
/// use gridcalc::prelude::*;
///
/// let mut sheet = Spreadsheet::new();
/// sheet.set_text("A1", "1");
/// sheet.set_text("A2", "=A1*2");
/// assert_eq!(sheet.get_value("A2").unwrap(), FormulaValue::Number(2.0));
///
/// sheet.set_text("A1", "=3+2");
/// assert_eq!(sheet.get_value("A2").unwrap(), FormulaValue::Number(10.0));
/// ```
pub struct Spreadsheet {
    environment: Environment,
    listeners: Rc<RefCell<Listeners>>,
}

impl Spreadsheet {
    /// Create an empty spreadsheet with the standard functions
    pub fn new() -> Self {
        Self::with_config(EnvironmentConfig::default())
    }

    /// Create a spreadsheet from a config
    ///
    /// A change callback already set on the config keeps being called, before any
    /// listener.
    pub fn with_config(mut config: EnvironmentConfig) -> Self {
        let listeners = Rc::new(RefCell::new(Listeners::default()));
        let existing = config.take_change_callback();
        let fanout = Rc::clone(&listeners);

        let config = config.on_change(move |cells| {
            if let Some(callback) = &existing {
                callback(cells);
            }
            // Snapshot so listeners may add or remove listeners while being notified
            let snapshot = fanout.borrow().subscribed_to(SheetEvent::CellsChanged);
            tracing::trace!(listeners = snapshot.len(), cells = cells.len(), "notifying");
            for listener in snapshot {
                listener(cells);
            }
        });

        Self {
            environment: Environment::new(config),
            listeners,
        }
    }

    /// Raw content of a cell as display text
    pub fn get_text(&self, position: impl Into<CellPosition>) -> String {
        self.environment.get_text(&position.into())
    }

    /// Replace the content of a cell, returning the cells whose value may have changed
    pub fn set_text(
        &mut self,
        position: impl Into<CellPosition>,
        content: impl Into<CellContent>,
    ) -> Vec<CellPosition> {
        self.environment.set_text(&position.into(), content)
    }

    /// Value of a cell
    pub fn get_value(&self, position: impl Into<CellPosition>) -> FormulaResult<FormulaValue> {
        self.environment.get_value(&position.into())
    }

    /// Evaluate text as if it were a cell, without storing it
    pub fn evaluate_query(&self, text: &str) -> FormulaResult<FormulaValue> {
        self.environment.evaluate_query(text)
    }

    /// Iterate non-empty cells in position order
    pub fn cells(&self) -> impl Iterator<Item = (&CellPosition, &CellContent)> {
        self.environment.cells()
    }

    /// Subscribe to an event
    pub fn add_listener(
        &self,
        event: SheetEvent,
        listener: impl Fn(&[CellPosition]) + 'static,
    ) -> ListenerId {
        self.listeners.borrow_mut().add(event, Rc::new(listener))
    }

    /// Unsubscribe, returning whether the listener was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(id)
    }

    /// Work counters of the underlying environment
    pub fn stats(&self) -> CalculationStats {
        self.environment.stats()
    }

    /// The underlying environment
    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Spreadsheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spreadsheet")
            .field("environment", &self.environment)
            .field("listeners", &self.listeners.borrow().entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_listener_ids_are_unique() {
        let sheet = Spreadsheet::new();
        let a = sheet.add_listener(SheetEvent::CellsChanged, |_| {});
        let b = sheet.add_listener(SheetEvent::CellsChanged, |_| {});
        assert_ne!(a, b);
        assert!(sheet.remove_listener(a));
        assert!(!sheet.remove_listener(a));
        assert!(sheet.remove_listener(b));
    }

    #[test]
    fn test_existing_callback_is_kept() {
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let config = EnvironmentConfig::default()
            .cell("A1", "1")
            .on_change(move |_| *counter.borrow_mut() += 1);

        let mut sheet = Spreadsheet::with_config(config);
        sheet.get_value("A1").unwrap();
        sheet.set_text("A1", "2");
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_delegation() {
        let mut sheet = Spreadsheet::new();
        sheet.set_text("B2", 4.0);
        assert_eq!(sheet.get_text("B2"), "4");
        assert_eq!(sheet.evaluate_query("=B2/8").unwrap(), FormulaValue::Number(0.5));
        assert_eq!(sheet.cells().count(), 1);
    }
}
