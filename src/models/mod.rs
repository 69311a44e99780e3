pub mod holiday;
pub mod payroll;
pub mod timesheet;
