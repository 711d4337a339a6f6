//! Tests for formula evaluation, invalidation and change notification

use gridcalc::prelude::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn pos(s: &str) -> CellPosition {
    CellPosition::from(s)
}

fn sorted(mut cells: Vec<CellPosition>) -> Vec<CellPosition> {
    cells.sort();
    cells
}

/// Sheet with A1 = 1, A2 = A1 * 2, A3 = A2 * 2
fn chain() -> Spreadsheet {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", "1");
    sheet.set_text("A2", "=A1*2");
    sheet.set_text("A3", "=A2*2");
    sheet
}

/// Test the edit-and-recompute scenario end to end
#[test]
fn test_chain_scenario() {
    let mut sheet = chain();
    assert_eq!(sheet.get_value("A3").unwrap(), FormulaValue::Number(4.0));

    sheet.set_text("A1", "=3+2");
    assert_eq!(sheet.get_value("A1").unwrap(), FormulaValue::Number(5.0));
    assert_eq!(sheet.get_value("A2").unwrap(), FormulaValue::Number(10.0));
    assert_eq!(sheet.get_value("A3").unwrap(), FormulaValue::Number(20.0));
}

/// Test that repeated reads do no extra work
#[test]
fn test_get_value_is_idempotent() {
    let sheet = chain();
    let first = sheet.get_value("A3").unwrap();
    let stats = sheet.stats();

    let second = sheet.get_value("A3").unwrap();
    assert_eq!(first, second);
    assert_eq!(sheet.stats().parses, stats.parses);
    assert_eq!(sheet.stats().evaluations, stats.evaluations);
}

/// Test that an edit reports exactly the transitive readers
#[test]
fn test_invalidation_closure() {
    let mut sheet = chain();
    sheet.get_value("A3").unwrap();

    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reported);
    sheet.add_listener(SheetEvent::CellsChanged, move |cells| {
        sink.borrow_mut().push(cells.to_vec());
    });

    let affected = sheet.set_text("A1", "7");
    assert_eq!(sorted(affected), vec![pos("A1"), pos("A2"), pos("A3")]);
    assert_eq!(reported.borrow().len(), 1);
    assert_eq!(
        sorted(reported.borrow()[0].clone()),
        vec![pos("A1"), pos("A2"), pos("A3")]
    );

    // Never evaluated and read by nothing
    assert!(sheet.set_text("D4", "=A1").is_empty());
    assert_eq!(reported.borrow().len(), 1);
}

/// Test that cells not read since the last edit are not reported
#[test]
fn test_invalidation_only_covers_evaluated_cells() {
    let mut sheet = chain();
    sheet.get_value("A2").unwrap();

    let affected = sheet.set_text("A1", "3");
    assert_eq!(sorted(affected), vec![pos("A1"), pos("A2")]);
}

/// Test circular reference detection
#[test]
fn test_circular_references() {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", "=A2");
    sheet.set_text("A2", "=A1");
    assert_eq!(
        sheet.get_value("A1").unwrap_err(),
        FormulaError::CircularReference(vec![pos("A1"), pos("A2"), pos("A1")])
    );

    // A range that covers the cell holding it
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", "1");
    sheet.set_text("B2", "=SUM(A1:C3)");
    assert_eq!(
        sheet.get_value("B2").unwrap_err(),
        FormulaError::CircularReference(vec![pos("B2"), pos("B2")])
    );
}

/// Test that breaking a cycle recovers the values
#[test]
fn test_cycle_recovers_after_edit() {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", "=A2+1");
    sheet.set_text("A2", "=A1");
    assert!(sheet.get_value("A1").is_err());

    sheet.set_text("A2", "41");
    assert_eq!(sheet.get_value("A1").unwrap(), FormulaValue::Number(42.0));
}

/// Test that fixing a syntax error recomputes the cells reading it
#[test]
fn test_syntax_error_invalidation() {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", "=1+");
    sheet.set_text("A2", "=A1*2");
    assert!(sheet.get_value("A1").unwrap_err().is_syntax());
    assert_eq!(
        sheet.get_value("A2").unwrap_err(),
        FormulaError::ReferencedCell(pos("A1"))
    );

    let affected = sheet.set_text("A1", "=3");
    assert_eq!(sorted(affected), vec![pos("A1"), pos("A2")]);
    assert_eq!(sheet.get_value("A1").unwrap(), FormulaValue::Number(3.0));
    assert_eq!(sheet.get_value("A2").unwrap(), FormulaValue::Number(6.0));
}

/// Test that a range only spans keys written the way its corners are
#[test]
fn test_range_corners_are_canonical() {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", "1");
    sheet.set_text("B2", "5");
    sheet.set_text("A01", "100");

    assert_eq!(
        sheet.evaluate_query("=SUM(A1:B2)").unwrap(),
        FormulaValue::Number(6.0)
    );
    assert_eq!(sheet.evaluate_query("=A01").unwrap(), FormulaValue::Number(100.0));
    assert!(sheet.evaluate_query("=SUM(a1:B2)").unwrap_err().is_syntax());
    assert!(sheet.evaluate_query("=SUM(A01:A01)").unwrap_err().is_syntax());
}

/// Test that dividing by an empty sum gives positive infinity
#[test]
fn test_division_by_empty_sum() {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("C1", "text");

    for formula in ["=1/SUM()", "=1/SUM(B1:B3)", "=1/SUM(C1:C1)"] {
        assert_eq!(
            sheet.evaluate_query(formula).unwrap(),
            FormulaValue::Number(f64::INFINITY),
            "{}",
            formula
        );
    }
}

/// Test string escapes
#[test]
fn test_string_escapes() {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", r#"="\"""#);
    assert_eq!(sheet.get_value("A1").unwrap(), FormulaValue::String("\"".into()));

    sheet.set_text("A2", r#"="\j""#);
    let err = sheet.get_value("A2").unwrap_err();
    assert!(err.is_syntax(), "expected syntax error, got {err}");
}

/// Test that lazy functions skip arguments they do not need
#[test]
fn test_lazy_short_circuit() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let throw = move |_: &[FormulaValue]| -> FormulaResult<FormulaValue> {
        counter.set(counter.get() + 1);
        Err(FormulaError::argument("THROW always fails"))
    };
    let sheet = Spreadsheet::with_config(EnvironmentConfig::default().function("THROW", throw));

    assert_eq!(
        sheet.evaluate_query("=IF(1,2,THROW())").unwrap(),
        FormulaValue::Number(2.0)
    );
    assert_eq!(
        sheet.evaluate_query("=AND(FALSE,THROW())").unwrap(),
        FormulaValue::Boolean(false)
    );
    assert_eq!(calls.get(), 0);

    assert!(matches!(
        sheet.evaluate_query("=AND(TRUE,THROW())").unwrap_err(),
        FormulaError::FunctionEvaluation { ref function, .. } if function == "THROW"
    ));
    assert_eq!(calls.get(), 1);
}

/// Test a user-defined lazy function
#[test]
fn test_custom_lazy_function() {
    // FIRSTOK(a, b, ...) returns the first argument that evaluates without error
    let first_ok = FunctionDescriptor::lazy(|args: &[LazyArg<'_>]| {
        args.iter()
            .find_map(|arg| arg.value().ok())
            .ok_or_else(|| FormulaError::argument("no argument succeeded"))
    });
    let config = EnvironmentConfig::default().function("FIRSTOK", first_ok);
    let mut sheet = Spreadsheet::with_config(config);
    sheet.set_text("A1", "=1+\"x\"");

    assert_eq!(
        sheet.evaluate_query("=FIRSTOK(A1, 7)").unwrap(),
        FormulaValue::Number(7.0)
    );
}

/// Test that operators never coerce between types
#[test]
fn test_type_boundary() {
    let sheet = Spreadsheet::new();
    assert_eq!(
        sheet.evaluate_query("=\"a\"+\"b\"").unwrap(),
        FormulaValue::String("ab".into())
    );
    assert!(matches!(
        sheet.evaluate_query("=1+\"a\"").unwrap_err(),
        FormulaError::Type { operator: "+", .. }
    ));
    assert!(sheet.evaluate_query("=TRUE+1").is_err());
}

/// Test errors in referenced cells
#[test]
fn test_referenced_cell_error() {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", "=NOPE()");
    sheet.set_text("A2", "=A1+1");

    assert_eq!(
        sheet.get_value("A1").unwrap_err(),
        FormulaError::UnknownFunction("NOPE".into())
    );
    assert_eq!(
        sheet.get_value("A2").unwrap_err(),
        FormulaError::ReferencedCell(pos("A1"))
    );
}

/// Test non-formula text classification
#[test]
fn test_plain_text_cells() {
    let mut sheet = Spreadsheet::new();
    sheet.set_text("A1", "-12.5");
    sheet.set_text("A2", "hello");
    sheet.set_text("A3", "=A1*2");

    assert_eq!(sheet.get_value("A1").unwrap(), FormulaValue::Number(-12.5));
    assert_eq!(sheet.get_value("A2").unwrap(), FormulaValue::String("hello".into()));
    assert_eq!(sheet.get_value("A3").unwrap(), FormulaValue::Number(-25.0));
    assert_eq!(sheet.get_text("A3"), "=A1*2");
}

/// Test the standard aggregate functions over a range
#[test]
fn test_aggregates_over_range() {
    let mut sheet = Spreadsheet::new();
    for (i, value) in ["4", "8", "text", "", "6"].iter().enumerate() {
        sheet.set_text(format!("A{}", i + 1), *value);
    }

    let query = |formula: &str| sheet.evaluate_query(formula).unwrap();
    assert_eq!(query("=SUM(A1:A5)"), FormulaValue::Number(18.0));
    assert_eq!(query("=AVERAGE(A1:A5)"), FormulaValue::Number(6.0));
    assert_eq!(query("=COUNT(A1:A5)"), FormulaValue::Number(3.0));
    assert_eq!(query("=MIN(A1:A5)"), FormulaValue::Number(4.0));
    assert_eq!(query("=MAX(A5:A1)"), FormulaValue::Number(8.0));
    assert_eq!(query("=CONCAT(A1:A3)"), FormulaValue::String("48text".into()));
}

/// Test that a removed listener is no longer notified
#[test]
fn test_listener_management() {
    let mut sheet = chain();
    sheet.get_value("A3").unwrap();

    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let id = sheet.add_listener(SheetEvent::CellsChanged, move |_| {
        counter.set(counter.get() + 1);
    });

    sheet.set_text("A1", "2");
    assert_eq!(hits.get(), 1);

    assert!(sheet.remove_listener(id));
    sheet.get_value("A3").unwrap();
    sheet.set_text("A1", "3");
    assert_eq!(hits.get(), 1);
}

/// Test that range corner order does not matter
#[test]
fn test_range_symmetry() {
    let mut sheet = Spreadsheet::new();
    for (i, cell) in ["A1", "B1", "C1", "A2", "B2", "C2", "A3", "B3", "C3"]
        .iter()
        .enumerate()
    {
        sheet.set_text(*cell, format!("{}", i * 3));
    }

    assert_eq!(
        sheet.evaluate_query("=SUM(A1:C3)").unwrap(),
        sheet.evaluate_query("=SUM(C3:A1)").unwrap()
    );
    assert_eq!(
        sheet.evaluate_query("=SUM(A3:C1)").unwrap(),
        FormulaValue::Number(108.0)
    );
}

proptest! {
    #[test]
    fn test_range_symmetry_holds_for_any_data(
        values in prop::collection::vec(-1000i32..1000, 9),
        corner in 0usize..4,
    ) {
        let mut sheet = Spreadsheet::new();
        let cells = ["A1", "B1", "C1", "A2", "B2", "C2", "A3", "B3", "C3"];
        for (cell, value) in cells.iter().zip(&values) {
            sheet.set_text(*cell, value.to_string());
        }

        let (start, end) = [("A1", "C3"), ("C3", "A1"), ("A3", "C1"), ("C1", "A3")][corner];
        let expected: i32 = values.iter().sum();
        prop_assert_eq!(
            sheet.evaluate_query(&format!("=SUM({}:{})", start, end)).unwrap(),
            FormulaValue::Number(expected as f64)
        );
    }
}
