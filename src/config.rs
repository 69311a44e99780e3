use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, TimesheetError};

/// Default name of the config file looked up in the working directory
pub const CONFIG_FILE: &str = "timesheet.toml";

/// Configuration for a timesheet run
///
/// Every field has a default, so an empty or partial `timesheet.toml` is valid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetConfig {
    pub paths: PathsConfig,
    pub layout: SheetLayout,
    pub form: FormConfig,
    pub holidays: HolidayConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub spreadsheet: PathBuf,
    pub template: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            spreadsheet: PathBuf::from("2024adjuncts.xlsx"),
            template: PathBuf::from("time-sheets.pdf"),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Fixed cell positions of the payroll sheet, all 0-based absolute coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub sheet: String,
    pub name_row: u32,
    /// Columns holding employee names in `name_row` and their hours in each data row.
    pub name_columns: Vec<u32>,
    pub first_data_row: u32,
    pub data_rows: u32,
    pub pay_date_column: u32,
    pub week1_column: u32,
    pub week2_column: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet: "Sheet1".to_string(),
            name_row: 3,
            name_columns: vec![4, 5, 10, 11, 12, 13, 14, 15, 16, 19, 20, 21, 22],
            first_data_row: 6,
            data_rows: 13,
            pay_date_column: 0,
            week1_column: 2,
            week2_column: 3,
        }
    }
}

/// Fixed strings written on every form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub title: String,
    pub supervisor: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            title: "NTA V".to_string(),
            supervisor: "Steve Everett/MB".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayConfig {
    /// Year of the US federal holiday calendar
    pub year: i32,
    /// Additional closure days, `YYYY-MM-DD`
    pub extra: Vec<String>,
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            year: 2024,
            extra: Vec::new(),
        }
    }
}

impl TimesheetConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file at `path`, or fall back to the defaults when it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("No config at {}, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        info!("Loading config from {}", path.display());
        Self::from_toml(&fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<()> {
        let layout = &self.layout;

        if layout.name_columns.is_empty() {
            return Err(TimesheetError::Config(
                "layout.name_columns must not be empty".to_string(),
            ));
        }

        if layout.name_row >= layout.first_data_row {
            return Err(TimesheetError::Config(format!(
                "layout.name_row ({}) must be above layout.first_data_row ({})",
                layout.name_row, layout.first_data_row
            )));
        }

        Ok(())
    }
}
