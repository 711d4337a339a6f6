//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    // Cell types
    CellContent,
    CellPosition,
    // Configuration
    EnvironmentConfig,
    // Error types
    FormulaError,
    FormulaResult,
    FormulaValue,
    // Functions
    FunctionDescriptor,
    FunctionRegistry,
    LazyArg,
    // Main types
    ListenerId,
    SheetEvent,
    Spreadsheet,
};
