//! Tip rack geometry, well naming and the occupancy grid.
//!
//! Physical rows are labelled `A..` from the top of the rack and columns `1..`
//! from the left, so a 12x8 rack runs from `A1` to `H12`.
//!
//! Occupancy is stored per column in *scan order*: scan index `0` is the
//! bottom physical row (`H` on an 8-row rack) and the last scan index is the
//! top row (`A`). Allocation walks scan indices upward, which is why a
//! full-column pickup is addressed by its top well.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rack geometries keep to single-letter row labels.
const MAX_ROWS: usize = 26;

/// Dimensions of a rectangular tip rack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackGeometry {
    pub columns: usize,
    pub rows: usize,
}

impl Default for RackGeometry {
    /// The standard 96-tip layout: 12 columns of 8 rows.
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 8,
        }
    }
}

impl RackGeometry {
    /// Creates a validated geometry.
    pub fn new(columns: usize, rows: usize) -> Result<Self> {
        let geometry = Self { columns, rows };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Checks for at least one column and 1..=26 rows.
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 || self.rows > MAX_ROWS {
            return Err(Error::InvalidGeometry {
                columns: self.columns,
                rows: self.rows,
            });
        }
        Ok(())
    }

    /// Total number of tips on a full rack.
    pub fn capacity(&self) -> usize {
        self.columns * self.rows
    }

    /// Whether `location` lies on this rack.
    pub fn contains(&self, location: TipLocation) -> bool {
        location.column < self.columns && location.row < self.rows
    }
}

/// A single well of a tip rack.
///
/// Both indices are zero-based: `row` counts down from the top physical row,
/// `column` counts from the left. Displays and parses as a well name (`"A1"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TipLocation {
    pub column: usize,
    pub row: usize,
}

impl TipLocation {
    /// Creates a location from zero-based column and row indices.
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// Row letters, `"A"` for the top row.
    ///
    /// Rows past `Z` continue as `AA`, `AB`, ... so every row has a name.
    pub fn row_label(&self) -> String {
        let mut letters = Vec::new();
        let mut n = self.row;
        loop {
            letters.push(char::from(b'A' + (n % 26) as u8));
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        letters.iter().rev().collect()
    }

    /// One-based column number as printed on the rack.
    pub fn column_number(&self) -> usize {
        self.column + 1
    }
}

impl fmt::Display for TipLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{}{}", self.row_label(), self.column_number()))
    }
}

impl FromStr for TipLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidWellName(s.to_string());

        let name = s.trim();
        let split = name
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(name.len());
        let (letters, digits) = name.split_at(split);
        if letters.is_empty() {
            return Err(invalid());
        }

        let mut row: usize = 0;
        for letter in letters.bytes().map(|b| b.to_ascii_uppercase()) {
            row = row
                .checked_mul(26)
                .and_then(|r| r.checked_add((letter - b'A') as usize + 1))
                .ok_or_else(invalid)?;
        }

        let number: usize = digits.parse().map_err(|_| invalid())?;
        if number == 0 {
            return Err(invalid());
        }

        Ok(Self {
            column: number - 1,
            row: row - 1,
        })
    }
}

/// Occupancy state of one tip rack for the duration of a protocol run.
///
/// A tip, once consumed, is never made available again.
#[derive(Clone, Debug)]
pub struct TipRack {
    geometry: RackGeometry,
    /// `available[column][scan]`; scan index 0 is the bottom physical row.
    available: Vec<Vec<bool>>,
}

impl TipRack {
    /// Creates a rack with every tip present.
    pub fn new(geometry: RackGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            available: vec![vec![true; geometry.rows]; geometry.columns],
        })
    }

    /// Dimensions of this rack.
    pub fn geometry(&self) -> RackGeometry {
        self.geometry
    }

    /// Number of tips on the rack when full.
    pub fn capacity(&self) -> usize {
        self.geometry.capacity()
    }

    /// Number of tips still present.
    pub fn available(&self) -> usize {
        self.available
            .iter()
            .map(|column| column.iter().filter(|&&free| free).count())
            .sum()
    }

    /// Number of tips already taken.
    pub fn consumed(&self) -> usize {
        self.capacity() - self.available()
    }

    /// Whether the tip at `location` is still present.
    pub fn is_available(&self, location: TipLocation) -> Result<bool> {
        let (column, scan) = self.scan_index(location)?;
        Ok(self.available[column][scan])
    }

    /// Marks a single tip as used, e.g. one taken by hand before the run.
    ///
    /// Returns `true` if the tip was present until now.
    pub fn consume(&mut self, location: TipLocation) -> Result<bool> {
        let (column, scan) = self.scan_index(location)?;
        let was_free = std::mem::replace(&mut self.available[column][scan], false);
        Ok(was_free)
    }

    /// Length of the longest contiguous run of free tips in `column`.
    pub fn longest_free_run(&self, column: usize) -> Option<usize> {
        let cells = self.available.get(column)?;
        let mut longest = 0;
        let mut current = 0;
        for &free in cells {
            current = if free { current + 1 } else { 0 };
            longest = longest.max(current);
        }
        Some(longest)
    }

    /// Free/used flags of `column` in scan order (bottom row first).
    pub(crate) fn scan_column(&self, column: usize) -> &[bool] {
        &self.available[column]
    }

    /// Consumes scan indices `start..start + len` of `column`.
    pub(crate) fn take_run(&mut self, column: usize, start: usize, len: usize) {
        for cell in &mut self.available[column][start..start + len] {
            *cell = false;
        }
    }

    /// Translates a scan position into a physical well.
    pub(crate) fn location_at(&self, column: usize, scan: usize) -> TipLocation {
        TipLocation::new(column, self.geometry.rows - 1 - scan)
    }

    fn scan_index(&self, location: TipLocation) -> Result<(usize, usize)> {
        if !self.geometry.contains(location) {
            return Err(Error::LocationOutOfRange {
                column: location.column,
                row: location.row,
            });
        }
        Ok((location.column, self.geometry.rows - 1 - location.row))
    }
}

impl fmt::Display for TipRack {
    /// Prints the rack as seen from above, top row first; taken tips show as `--`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.geometry.rows {
            let cells: Vec<String> = (0..self.geometry.columns)
                .map(|column| {
                    let location = TipLocation::new(column, row);
                    let scan = self.geometry.rows - 1 - row;
                    if self.available[column][scan] {
                        format!("{location:<3}")
                    } else {
                        format!("{:<3}", "--")
                    }
                })
                .collect();
            writeln!(f, "{}", cells.join(" ").trim_end())?;
        }
        Ok(())
    }
}
