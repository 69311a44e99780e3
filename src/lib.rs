//! Adjunct Timesheet Library
//!
//! This library reads a payroll spreadsheet, spreads each employee's hours over
//! the workdays of a pay period, and fills a timesheet PDF form per employee
//! per pay period.

pub mod config;
pub mod error;
pub mod helpers;
pub mod models;
pub mod service;

pub use config::TimesheetConfig;
pub use error::{Result, TimesheetError};
pub use service::{RecordOutcome, RunReport, TimesheetService};

// Re-export key types for convenience
pub use helpers::pdf::{FieldMap, FormTemplate};
pub use models::holiday::HolidayCalendar;
pub use models::payroll::{PayPeriod, Payroll};
pub use models::timesheet::{TimeSlot, TimesheetRecord, WeekAllocation};
