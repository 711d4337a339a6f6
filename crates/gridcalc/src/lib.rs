//! # gridcalc
//!
//! An incremental spreadsheet formula engine.
//!
//! Cells hold text; text starting with `=` is a formula. Values are computed on first
//! read and cached, and editing a cell invalidates exactly the cells that read it,
//! directly or through other cells.
//!
//! ## Features
//!
//! - Arithmetic, comparison and string concatenation with no implicit coercions
//! - Ranges such as `A1:C3` as function arguments
//! - Circular reference detection that names the full cycle
//! - Eager and lazy (short-circuiting) functions, plus a small standard set
//! - Change listeners
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut sheet = Spreadsheet::new();
//! sheet.set_text("A1", "10");
//! sheet.set_text("A2", "=A1 * 2");
//! sheet.set_text("A3", "=IF(A2 > 15, \"big\", \"small\")");
//! assert_eq!(sheet.get_value("A3").unwrap(), FormulaValue::String("big".into()));
//!
//! let changed = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&changed);
//! sheet.add_listener(SheetEvent::CellsChanged, move |cells| {
//!     sink.borrow_mut().extend(cells.iter().cloned());
//! });
//!
//! sheet.set_text("A1", "5");
//! assert_eq!(changed.borrow().len(), 3);
//! assert_eq!(sheet.get_value("A3").unwrap(), FormulaValue::String("small".into()));
//! ```

pub mod prelude;
pub mod spreadsheet;

pub use spreadsheet::{ListenerId, SheetEvent, Spreadsheet};

// Re-export core types
pub use gridcalc_core::{CellContent, CellPosition, CellRange, OpaqueValue};

// Re-export formula types
pub use gridcalc_formula::{
    CalculationStats, Environment, EnvironmentConfig, Expression, FormulaError, FormulaResult,
    FormulaValue, FunctionDescriptor, FunctionRegistry, LazyArg,
};
