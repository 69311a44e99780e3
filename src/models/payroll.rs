use chrono::NaiveDate;
use std::fmt;

use crate::error::TimesheetError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Employee {
    pub name: String,
    /// Sheet column holding both the name and the employee's hours
    pub column: u32,
}

/// One pay period: a reporting date and the start of each of its two weeks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayPeriod {
    pub pay_date: NaiveDate,
    pub week1_start: NaiveDate,
    pub week2_start: NaiveDate,
}

/// A date cell that could not be parsed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidCell {
    pub row: u32,
    pub column: u32,
    pub value: String,
}

impl From<InvalidCell> for TimesheetError {
    fn from(cell: InvalidCell) -> Self {
        TimesheetError::InvalidDate {
            row: cell.row,
            column: cell.column,
            value: cell.value,
        }
    }
}

/// One data row of the payroll sheet.
///
/// `hours` is indexed like [`Payroll::employees`]; `None` means the cell was
/// empty or not a number.
#[derive(Clone, Debug, PartialEq)]
pub struct PayPeriodRow {
    pub row: u32,
    pub period: Result<PayPeriod, InvalidCell>,
    pub hours: Vec<Option<f64>>,
}

/// Snapshot of the payroll sheet for one run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payroll {
    pub employees: Vec<Employee>,
    pub rows: Vec<PayPeriodRow>,
}

impl Payroll {
    /// Hours of `employee` in the row at `row_index`, `None` when missing.
    pub fn hours(&self, employee: usize, row_index: usize) -> Option<f64> {
        self.rows
            .get(row_index)
            .and_then(|row| row.hours.get(employee).copied().flatten())
    }
}

impl fmt::Display for Payroll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Payroll:")?;
        writeln!(f, "  Employees: {}", self.employees.len())?;
        writeln!(f, "  Pay periods: {}", self.rows.len())?;

        for row in &self.rows {
            match &row.period {
                Ok(period) => writeln!(
                    f,
                    "    Row {}: pay date {} (weeks of {} and {})",
                    row.row, period.pay_date, period.week1_start, period.week2_start
                )?,
                Err(cell) => writeln!(
                    f,
                    "    Row {}: invalid date {:?} in column {}",
                    row.row, cell.value, cell.column
                )?,
            }
        }

        Ok(())
    }
}
