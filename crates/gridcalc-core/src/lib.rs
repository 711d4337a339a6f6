//! # gridcalc-core
//!
//! Core data model for the gridcalc formula engine.
//!
//! This crate provides the types shared by the parser, evaluator and facade:
//! - [`CellPosition`] - Opaque, case-sensitive cell keys such as `A1`
//! - [`CellRange`] - Row-major expansion of an inclusive `A1:C3` span
//! - [`CellContent`] - What a cell holds before it is parsed
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellContent, CellPosition, CellRange};
//!
//! let range = CellRange::new(&CellPosition::from("A1"), &CellPosition::from("B2")).unwrap();
//! assert_eq!(range.cells().count(), 4);
//!
//! let content = CellContent::from("=A1*2");
//! assert!(content.is_formula());
//! ```

pub mod content;
pub mod error;
pub mod position;

pub use content::{format_number, CellContent, OpaqueValue};
pub use error::{Error, Result};
pub use position::{column_to_letters, letters_to_column, CellPosition, CellRange, Coordinates};
