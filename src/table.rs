//! Bordered text tables for command output.

use std::fmt;

/// A table with a header row and any number of data rows.
///
/// Columns are sized to their widest cell. A table without rows still
/// renders its header.
///
/// # Examples
///
/// ```
/// use ctl_console::table::StringTable;
///
/// let mut table = StringTable::new(["Name", "Port"]);
/// table.add_row(["eth0", "1"]);
///
/// assert_eq!(
///     table.to_string(),
///     "+------+------+\n\
///      | Name | Port |\n\
///      +------+------+\n\
///      | eth0 | 1    |\n\
///      +------+------+"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl StringTable {
    /// Create a table with the given column headers.
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing cells render empty, extra cells are dropped.
    pub fn add_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        row.resize(self.header.len(), String::new());
        self.rows.push(row);
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }
}

fn write_border(f: &mut fmt::Formatter<'_>, widths: &[usize]) -> fmt::Result {
    f.write_str("+")?;
    for width in widths {
        write!(f, "{}+", "-".repeat(width + 2))?;
    }
    Ok(())
}

fn write_row(f: &mut fmt::Formatter<'_>, widths: &[usize], cells: &[String]) -> fmt::Result {
    f.write_str("|")?;
    for (width, cell) in widths.iter().zip(cells) {
        write!(f, " {:<width$} |", cell, width = *width)?;
    }
    Ok(())
}

impl fmt::Display for StringTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();

        write_border(f, &widths)?;
        f.write_str("\n")?;
        write_row(f, &widths, &self.header)?;
        f.write_str("\n")?;
        write_border(f, &widths)?;

        for row in &self.rows {
            f.write_str("\n")?;
            write_row(f, &widths, row)?;
        }
        if !self.rows.is_empty() {
            f.write_str("\n")?;
            write_border(f, &widths)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only() {
        let table = StringTable::new(["MAC Address", "VLAN"]);
        assert!(table.is_empty());
        assert_eq!(
            table.to_string(),
            "+-------------+------+\n| MAC Address | VLAN |\n+-------------+------+"
        );
    }

    #[test]
    fn test_columns_grow_to_widest_cell() {
        let mut table = StringTable::new(["A", "B"]);
        table.add_row(["long value", ""]);
        table.add_row(["x", "yy"]);

        let lines: Vec<String> = table.to_string().lines().map(str::to_string).collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "+------------+----+");
        assert_eq!(lines[3], "| long value |    |");
        assert_eq!(lines[4], "| x          | yy |");
        assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));
    }

    #[test]
    fn test_short_and_long_rows_normalized() {
        let mut table = StringTable::new(["A", "B"]);
        table.add_row(["only"]);
        table.add_row(["1", "2", "3"]);
        assert_eq!(table.len(), 2);
        assert!(!table.to_string().contains('3'));
    }

    #[test]
    fn test_width_counts_chars() {
        let mut table = StringTable::new(["Name"]);
        table.add_row(["grüß"]);
        assert!(table.to_string().contains("| grüß |"));
    }
}
