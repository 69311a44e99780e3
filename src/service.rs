use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::{
    config::TimesheetConfig,
    error::{Result, TimesheetError},
    helpers::{pdf::FormTemplate, spreadsheet},
    models::{
        holiday::HolidayCalendar,
        payroll::{PayPeriod, Payroll},
        timesheet::TimesheetRecord,
    },
};

/// Why a record produced no document
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// Hours cell was empty or not a number
    MissingHours,
    /// Hours cell was zero or negative
    NoHours(f64),
}

/// Result of one (employee, pay period) pair
#[derive(Debug)]
pub enum RecordOutcome {
    Rendered {
        path: PathBuf,
        unmatched_fields: usize,
    },
    /// Rendered, but hours beyond the workday capacity were left out
    Truncated {
        path: PathBuf,
        unmatched_fields: usize,
        dropped_hours: f64,
    },
    Skipped(SkipReason),
    Failed(TimesheetError),
}

#[derive(Debug)]
pub struct RecordReport {
    pub employee: String,
    /// Sheet row of the pay period
    pub row: u32,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<RecordReport>,
}

impl RunReport {
    pub fn rendered(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Rendered { .. }))
    }

    pub fn truncated(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Truncated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

/// The timesheet batch: holiday calendar and template are loaded once and
/// shared read-only by every record.
pub struct TimesheetService {
    pub config: TimesheetConfig,
    pub holidays: HolidayCalendar,
    pub template: FormTemplate,
}

impl TimesheetService {
    /// Create a new timesheet service instance
    pub fn new(
        config: TimesheetConfig,
        holidays: HolidayCalendar,
        template: FormTemplate,
    ) -> Self {
        info!("Creating new TimesheetService instance");
        Self {
            config,
            holidays,
            template,
        }
    }

    /// Load the holiday calendar and template named by `config`.
    pub fn from_config(config: TimesheetConfig) -> Result<Self> {
        let holidays = HolidayCalendar::from_config(&config.holidays)?;
        let template = FormTemplate::load(&config.paths.template)?;
        Ok(Self::new(config, holidays, template))
    }

    /// Read the configured spreadsheet and process every record in it.
    pub fn run(&self) -> Result<RunReport> {
        let payroll =
            spreadsheet::read_payroll(&self.config.paths.spreadsheet, &self.config.layout)?;
        info!("{}", payroll);
        self.process_payroll(&payroll)
    }

    /// Render a timesheet for every employee and pay period with hours.
    ///
    /// A failing record is reported and the batch carries on with the next.
    pub fn process_payroll(&self, payroll: &Payroll) -> Result<RunReport> {
        fs::create_dir_all(&self.config.paths.output_dir)?;

        let mut report = RunReport::default();

        for (index, employee) in payroll.employees.iter().enumerate() {
            for (row_index, row) in payroll.rows.iter().enumerate() {
                let outcome = match payroll.hours(index, row_index) {
                    None => RecordOutcome::Skipped(SkipReason::MissingHours),
                    Some(hours) if hours.is_nan() => {
                        RecordOutcome::Skipped(SkipReason::MissingHours)
                    }
                    Some(hours) if hours <= 0.0 => {
                        RecordOutcome::Skipped(SkipReason::NoHours(hours))
                    }
                    Some(hours) => match &row.period {
                        Ok(period) => self.process_record(&employee.name, *period, hours),
                        Err(cell) => RecordOutcome::Failed(cell.clone().into()),
                    },
                };

                match &outcome {
                    RecordOutcome::Failed(e) => error!(
                        "Failed timesheet for {} (row {}): {}",
                        employee.name, row.row, e
                    ),
                    RecordOutcome::Truncated { dropped_hours, .. } => warn!(
                        "{} hour(s) of {} (row {}) did not fit into the workdays",
                        dropped_hours, employee.name, row.row
                    ),
                    _ => {}
                }

                report.records.push(RecordReport {
                    employee: employee.name.clone(),
                    row: row.row,
                    outcome,
                });
            }
        }

        info!(
            "Run finished: {} rendered, {} truncated, {} skipped, {} failed",
            report.rendered(),
            report.truncated(),
            report.skipped(),
            report.failed()
        );

        Ok(report)
    }

    fn process_record(&self, employee: &str, period: PayPeriod, hours: f64) -> RecordOutcome {
        let Some(record) = TimesheetRecord::assemble(
            employee,
            period,
            hours,
            &self.holidays,
            &self.config.form,
        ) else {
            return RecordOutcome::Skipped(SkipReason::NoHours(hours));
        };

        let path = self.config.paths.output_dir.join(record.file_name());
        info!(
            "Processing timesheet for {} paid {} ({} hour(s))",
            employee,
            record.pay_date(),
            hours
        );

        match self.template.render_to_file(&record.to_field_map(), &path) {
            Ok(stats) => {
                let dropped_hours = record.dropped_hours();
                if dropped_hours > 0.0 {
                    RecordOutcome::Truncated {
                        path,
                        unmatched_fields: stats.unmatched.len(),
                        dropped_hours,
                    }
                } else {
                    RecordOutcome::Rendered {
                        path,
                        unmatched_fields: stats.unmatched.len(),
                    }
                }
            }
            Err(e) => RecordOutcome::Failed(e),
        }
    }
}
