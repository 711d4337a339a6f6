//! Cell store with dependency-tracked caching
//!
//! The [`Environment`] owns the raw cell contents, the function registry, two cache layers
//! (parsed expressions and evaluated values, each holding results and errors) and the
//! dependency graph. Cells are parsed and evaluated on first access; editing a cell purges
//! the cached values of everything that transitively reads it.
//!
//! # Example
//!
//! ```rust
//! use gridcalc_formula::{Environment, EnvironmentConfig, FormulaValue};
//!
//! let mut env = Environment::new(
//!     EnvironmentConfig::default()
//!         .cell("A1", "1")
//!         .cell("A2", "=A1*2"),
//! );
//! assert_eq!(env.get_value(&"A2".into()).unwrap(), FormulaValue::Number(2.0));
//!
//! let affected = env.set_text(&"A1".into(), "=3+2");
//! assert_eq!(affected.len(), 2);
//! assert_eq!(env.get_value(&"A2".into()).unwrap(), FormulaValue::Number(10.0));
//! ```

use crate::ast::Expression;
use crate::cache::CacheLayer;
use crate::error::{EvalFailure, EvalResult, FormulaError, FormulaResult};
use crate::evaluator::{self, CellLookup, EvalContext};
use crate::functions::{FunctionDescriptor, FunctionRegistry};
use crate::parser::{parse_cell, parse_text};
use crate::references::ReferencesMap;
use crate::value::FormulaValue;
use gridcalc_core::{CellContent, CellPosition};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Callback receiving the positions affected by an edit
pub type ChangeCallback = Box<dyn Fn(&[CellPosition])>;

/// Construction-time settings for an [`Environment`]
pub struct EnvironmentConfig {
    /// Initial cell contents
    pub cells: BTreeMap<CellPosition, CellContent>,
    /// Functions available to formulas
    pub functions: FunctionRegistry,
    /// Called after an edit that affects at least one cell
    pub on_change: Option<ChangeCallback>,
}

impl EnvironmentConfig {
    /// Add one initial cell
    pub fn cell(
        mut self,
        position: impl Into<CellPosition>,
        content: impl Into<CellContent>,
    ) -> Self {
        self.insert_cell(position.into(), content.into());
        self
    }

    /// Add several initial cells
    pub fn cells<I, P, C>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<CellPosition>,
        C: Into<CellContent>,
    {
        for (position, content) in cells {
            self.insert_cell(position.into(), content.into());
        }
        self
    }

    /// Replace the function registry
    pub fn functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Register one more function
    pub fn function(mut self, name: &str, function: impl Into<FunctionDescriptor>) -> Self {
        self.functions.register(name, function);
        self
    }

    /// Set the change callback
    pub fn on_change(mut self, callback: impl Fn(&[CellPosition]) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Remove and return the change callback
    pub fn take_change_callback(&mut self) -> Option<ChangeCallback> {
        self.on_change.take()
    }

    fn insert_cell(&mut self, position: CellPosition, content: CellContent) {
        if content.is_empty() {
            self.cells.remove(&position);
        } else {
            self.cells.insert(position, content);
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            cells: BTreeMap::new(),
            functions: FunctionRegistry::standard(),
            on_change: None,
        }
    }
}

impl fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("cells", &self.cells)
            .field("functions", &self.functions.names())
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Counters for the work an environment has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Number of cells parsed
    pub parses: usize,
    /// Number of cells evaluated
    pub evaluations: usize,
    /// Number of parsed-expression cache hits
    pub parse_cache_hits: usize,
    /// Number of value cache hits
    pub value_cache_hits: usize,
    /// Number of cache purges caused by edits
    pub invalidations: usize,
}

/// Cell store, caches and dependency graph
pub struct Environment {
    cells: BTreeMap<CellPosition, CellContent>,
    functions: FunctionRegistry,
    parsed: RefCell<CacheLayer<Rc<Expression>>>,
    evaluated: RefCell<CacheLayer<FormulaValue>>,
    references: RefCell<ReferencesMap>,
    on_change: Option<ChangeCallback>,
    stats: Cell<CalculationStats>,
}

impl Environment {
    /// Create an environment from a config
    pub fn new(config: EnvironmentConfig) -> Self {
        Self {
            cells: config.cells,
            functions: config.functions,
            parsed: RefCell::new(CacheLayer::new()),
            evaluated: RefCell::new(CacheLayer::new()),
            references: RefCell::new(ReferencesMap::new()),
            on_change: config.on_change,
            stats: Cell::new(CalculationStats::default()),
        }
    }

    /// Raw content of a cell as display text, empty if the cell is absent
    pub fn get_text(&self, position: &CellPosition) -> String {
        self.cells
            .get(position)
            .map(CellContent::display_text)
            .unwrap_or_default()
    }

    /// Raw content of a cell, if present
    pub fn content(&self, position: &CellPosition) -> Option<&CellContent> {
        self.cells.get(position)
    }

    /// Replace the content of a cell
    ///
    /// Returns every position whose value may have changed, the edited one included when
    /// it had been evaluated before. Nothing happens if the content is unchanged.
    pub fn set_text(
        &mut self,
        position: &CellPosition,
        content: impl Into<CellContent>,
    ) -> Vec<CellPosition> {
        let content = content.into();
        let unchanged = match self.cells.get(position) {
            Some(current) => *current == content,
            None => content.is_empty(),
        };
        if unchanged {
            return Vec::new();
        }

        if content.is_empty() {
            self.cells.remove(position);
        } else {
            self.cells.insert(position.clone(), content);
        }

        let affected = self.references.borrow().cells_depending_on(position);
        {
            let mut evaluated = self.evaluated.borrow_mut();
            evaluated.purge(position);
            for cell in &affected {
                evaluated.purge(cell);
            }
        }
        self.parsed.borrow_mut().purge(position);
        self.references.borrow_mut().remove_references_from(position);

        self.bump(|s| s.invalidations += affected.len());
        tracing::debug!(cell = %position, affected = affected.len(), "cell changed");

        if !affected.is_empty() {
            if let Some(callback) = &self.on_change {
                callback(affected.as_slice());
            }
        }

        affected
    }

    /// Parsed expression of a cell
    ///
    /// Parses on first access and registers the cell's references in the dependency
    /// graph. Syntax errors are cached like results.
    pub fn get_expression(&self, position: &CellPosition) -> FormulaResult<Rc<Expression>> {
        let cached = self.parsed.borrow().lookup(position);
        if let Some(outcome) = cached {
            tracing::trace!(cell = %position, "parse cache hit");
            self.bump(|s| s.parse_cache_hits += 1);
            return outcome;
        }

        tracing::debug!(cell = %position, "parsing cell");
        self.bump(|s| s.parses += 1);

        let parsed = match self.cells.get(position) {
            Some(content) => parse_cell(content),
            None => parse_cell(&CellContent::Empty),
        };

        match parsed {
            Ok(parsed) => {
                let expression = Rc::new(parsed.expression);
                self.parsed
                    .borrow_mut()
                    .store(position.clone(), Ok(Rc::clone(&expression)));
                self.references
                    .borrow_mut()
                    .add_references(position, parsed.references);
                Ok(expression)
            }
            Err(e) => {
                if e.is_syntax() {
                    self.parsed.borrow_mut().store(position.clone(), Err(e.clone()));
                }
                Err(e)
            }
        }
    }

    /// Value of a cell
    pub fn get_value(&self, position: &CellPosition) -> FormulaResult<FormulaValue> {
        let ctx = EvalContext::new();
        self.value_in(position, &ctx)
            .map_err(EvalFailure::into_error)
    }

    /// Value of a cell within an ongoing evaluation
    fn value_in(&self, position: &CellPosition, ctx: &EvalContext) -> EvalResult<FormulaValue> {
        let cached = self.evaluated.borrow().lookup(position);
        if let Some(outcome) = cached {
            tracing::trace!(cell = %position, "value cache hit");
            self.bump(|s| s.value_cache_hits += 1);
            return outcome.map_err(EvalFailure::Error);
        }

        let expression = self.get_expression(position)?;

        tracing::debug!(cell = %position, "evaluating cell");
        self.bump(|s| s.evaluations += 1);

        let result = evaluator::evaluate_cell_at(position, &expression, self, ctx);
        match &result {
            Ok(value) => self
                .evaluated
                .borrow_mut()
                .store(position.clone(), Ok(value.clone())),
            Err(EvalFailure::Error(e)) if e.is_runtime() => self
                .evaluated
                .borrow_mut()
                .store(position.clone(), Err(e.clone())),
            Err(_) => {}
        }

        result
    }

    /// Parse and evaluate text without touching any cache or the dependency graph
    pub fn evaluate_query(&self, text: &str) -> FormulaResult<FormulaValue> {
        let parsed = parse_text(text)?;
        evaluator::evaluate_query(&parsed.expression, self)
    }

    /// Function registered under `name`
    pub fn get_function(&self, name: &str) -> FormulaResult<FunctionDescriptor> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))
    }

    /// The function registry
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Iterate non-empty cells in position order
    pub fn cells(&self) -> impl Iterator<Item = (&CellPosition, &CellContent)> {
        self.cells.iter()
    }

    /// Check if a cell has content
    pub fn contains(&self, position: &CellPosition) -> bool {
        self.cells.contains_key(position)
    }

    /// Number of non-empty cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cell has content
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells a cell reads, as recorded when it was last parsed
    pub fn references_of(&self, position: &CellPosition) -> Vec<CellPosition> {
        self.references
            .borrow()
            .references_of(position)
            .cloned()
            .collect()
    }

    /// Cells that read a cell, among those parsed so far
    pub fn dependents_of(&self, position: &CellPosition) -> Vec<CellPosition> {
        self.references
            .borrow()
            .dependents_of(position)
            .cloned()
            .collect()
    }

    /// Work counters since creation
    pub fn stats(&self) -> CalculationStats {
        self.stats.get()
    }

    fn bump(&self, update: impl FnOnce(&mut CalculationStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(EnvironmentConfig::default())
    }
}

impl CellLookup for Environment {
    fn cell_value(&self, position: &CellPosition, ctx: &EvalContext) -> EvalResult<FormulaValue> {
        self.value_in(position, ctx)
    }

    fn function(&self, name: &str) -> FormulaResult<FunctionDescriptor> {
        self.get_function(name)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("cells", &self.cells)
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}
