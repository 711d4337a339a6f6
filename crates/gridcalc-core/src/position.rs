//! Cell positions and A1 coordinate helpers

use crate::error::{Error, Result};
use lazy_regex::{regex_captures, regex_is_match};
use std::borrow::Borrow;
use std::fmt;

/// A cell position such as `A1` or `AZ100`
///
/// Positions are opaque, case-sensitive keys: `a1` and `A1` name different cells and no
/// sheet bounds are enforced. Only range expansion looks inside the key, see
/// [`CellPosition::coordinates`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellPosition(String);

impl CellPosition {
    /// Create a position from any string key
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    /// The key as written
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether `text` has the textual shape of a reference: letters then digits
    ///
    /// # Examples
    /// ```
    /// use gridcalc_core::CellPosition;
    ///
    /// assert!(CellPosition::is_reference_shaped("A1"));
    /// assert!(CellPosition::is_reference_shaped("az100"));
    /// assert!(!CellPosition::is_reference_shaped("SUM"));
    /// assert!(!CellPosition::is_reference_shaped("A1B"));
    /// ```
    pub fn is_reference_shaped(text: &str) -> bool {
        regex_is_match!(r"^[A-Za-z]+[0-9]+$", text)
    }

    /// Split an A1-shaped key into column and row
    pub fn coordinates(&self) -> Result<Coordinates> {
        let (_, letters, digits) = regex_captures!(r"^([A-Za-z]+)([0-9]+)$", &self.0)
            .ok_or_else(|| Error::InvalidPosition(self.0.clone()))?;

        let column = letters_to_column(letters)
            .ok_or_else(|| Error::PositionOutOfRange(self.0.clone()))?;
        let row: u64 = digits
            .parse()
            .map_err(|_| Error::PositionOutOfRange(self.0.clone()))?;

        Ok(Coordinates {
            column,
            row,
            lowercase: letters.chars().all(|c| c.is_ascii_lowercase()),
        })
    }

    /// Render coordinates back into a position key
    pub fn from_coordinates(coordinates: Coordinates) -> Self {
        let mut letters = column_to_letters(coordinates.column);
        if coordinates.lowercase {
            letters.make_ascii_lowercase();
        }
        Self(format!("{}{}", letters, coordinates.row))
    }
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CellPosition {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellPosition {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CellPosition {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&CellPosition> for CellPosition {
    fn from(position: &CellPosition) -> Self {
        position.clone()
    }
}

/// Column/row split of an A1-shaped position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinates {
    /// Column index (0-based, A=0, B=1, ..., AA=26)
    pub column: u32,
    /// Row number exactly as written
    pub row: u64,
    /// Whether the column letters were written in lowercase
    pub lowercase: bool,
}

/// Convert column letters to a 0-based index (A = 0, Z = 25, AA = 26, ...)
///
/// Letters are read case-insensitively. Returns `None` for an empty string, a non-letter,
/// or a column that overflows `u32`.
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }

    Some(col - 1)
}

/// Convert a 0-based column index to uppercase letters (0 = A, 25 = Z, 26 = AA, ...)
pub fn column_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col as u64 + 1;

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// An inclusive rectangular span between two A1-shaped positions
///
/// The corners may be given in any order; iteration always runs row-major from the
/// top-left corner. Expanded positions are written in the corners' letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    first_col: u32,
    last_col: u32,
    first_row: u64,
    last_row: u64,
    lowercase: bool,
}

impl CellRange {
    /// Create a range from two corner positions
    ///
    /// Every expanded key must match the way the corners are written, so both corners
    /// need letters of a single case, the same case, and no leading zeros in the row.
    pub fn new(start: &CellPosition, end: &CellPosition) -> Result<Self> {
        let a = start.coordinates()?;
        let b = end.coordinates()?;

        let invalid = |reason| Error::InvalidRange {
            range: format!("{}:{}", start, end),
            reason,
        };
        if CellPosition::from_coordinates(a) != *start || CellPosition::from_coordinates(b) != *end
        {
            return Err(invalid("corners must use one letter case and no leading zeros"));
        }
        if a.lowercase != b.lowercase {
            return Err(invalid("corners differ in letter case"));
        }

        Ok(Self {
            first_col: a.column.min(b.column),
            last_col: a.column.max(b.column),
            first_row: a.row.min(b.row),
            last_row: a.row.max(b.row),
            lowercase: a.lowercase,
        })
    }

    /// Number of rows spanned
    pub fn row_count(&self) -> u64 {
        self.last_row - self.first_row + 1
    }

    /// Number of columns spanned
    pub fn col_count(&self) -> u64 {
        (self.last_col - self.first_col) as u64 + 1
    }

    /// Iterate every position in the range, row by row
    pub fn cells(&self) -> impl Iterator<Item = CellPosition> + '_ {
        (self.first_row..=self.last_row).flat_map(move |row| {
            (self.first_col..=self.last_col).map(move |column| {
                CellPosition::from_coordinates(Coordinates {
                    column,
                    row,
                    lowercase: self.lowercase,
                })
            })
        })
    }
}
