use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::SheetLayout;
use crate::error::{Result, TimesheetError};
use crate::models::payroll::{Employee, InvalidCell, PayPeriod, PayPeriodRow, Payroll};

/// Open the workbook at `path` and extract the payroll described by `layout`.
pub fn read_payroll<P: AsRef<Path>>(path: P, layout: &SheetLayout) -> Result<Payroll> {
    let path = path.as_ref();
    info!("Opening spreadsheet {}", path.display());

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| TimesheetError::SpreadsheetOpen(path.to_path_buf(), e.to_string()))?;

    if !workbook.sheet_names().iter().any(|name| name == &layout.sheet) {
        return Err(TimesheetError::SheetNotFound(layout.sheet.clone()));
    }

    let range = workbook.worksheet_range(&layout.sheet)?;
    info!(
        "Loaded worksheet {:?} spanning {:?} to {:?}",
        layout.sheet,
        range.start(),
        range.end()
    );

    Ok(extract_payroll(&range, layout))
}

/// Pull names, pay periods and hours out of fixed cell positions.
///
/// Positions are absolute, so leading blank rows or columns in the sheet do
/// not shift the layout.
pub fn extract_payroll(range: &Range<Data>, layout: &SheetLayout) -> Payroll {
    let cell = |row: u32, column: u32| range.get_value((row, column));

    let mut columns = Vec::with_capacity(layout.name_columns.len());
    let mut employees = Vec::with_capacity(layout.name_columns.len());

    for &column in &layout.name_columns {
        match cell(layout.name_row, column).and_then(cell_text) {
            Some(name) => {
                debug!("Found employee {:?} in column {}", name, column);
                employees.push(Employee { name, column });
                columns.push(column);
            }
            None => warn!(
                "No employee name in row {}, column {}; column ignored",
                layout.name_row, column
            ),
        }
    }

    let mut rows = Vec::with_capacity(layout.data_rows as usize);

    for row in layout.first_data_row..layout.first_data_row + layout.data_rows {
        let date_at = |column: u32| {
            let value = cell(row, column);
            value.and_then(cell_date).ok_or_else(|| InvalidCell {
                row,
                column,
                value: value.map(ToString::to_string).unwrap_or_default(),
            })
        };

        let period = date_at(layout.pay_date_column).and_then(|pay_date| {
            Ok(PayPeriod {
                pay_date,
                week1_start: date_at(layout.week1_column)?,
                week2_start: date_at(layout.week2_column)?,
            })
        });

        if let Err(invalid) = &period {
            warn!(
                "Row {} has an unreadable date {:?} in column {}",
                row, invalid.value, invalid.column
            );
        }

        let hours = columns
            .iter()
            .map(|&column| cell(row, column).and_then(cell_hours))
            .collect();

        rows.push(PayPeriodRow { row, period, hours });
    }

    info!(
        "Extracted {} employee(s) over {} pay period row(s)",
        employees.len(),
        rows.len()
    );

    Payroll { employees, rows }
}

fn cell_text(data: &Data) -> Option<String> {
    let text = match data {
        Data::String(s) => s.trim().to_string(),
        Data::Empty | Data::Error(_) => return None,
        other => other.to_string(),
    };

    (!text.is_empty()).then_some(text)
}

/// Hours cell as a number; blank, NaN and text that is not a number count as missing.
pub fn cell_hours(data: &Data) -> Option<f64> {
    let hours = match data {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        Data::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (!hours.is_nan()).then_some(hours)
}

/// Date cell as a calendar date.
pub fn cell_date(data: &Data) -> Option<NaiveDate> {
    match data {
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::String(s) | Data::DateTimeIso(s) => parse_date_text(s),
        _ => None,
    }
}

/// Excel counts days from 1899-12-30 (the 1900 leap-year bug folded in).
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|datetime| datetime.date())
        .or_else(|| {
            ["%Y-%m-%d", "%m/%d/%Y"]
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        })
}
