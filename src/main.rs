use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use adjunct_timesheets::{
    config::{CONFIG_FILE, TimesheetConfig},
    service::TimesheetService,
};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting adjunct timesheet run");

    let config = TimesheetConfig::load_or_default(CONFIG_FILE)
        .with_context(|| format!("failed to load {CONFIG_FILE}"))?;

    let service = TimesheetService::from_config(config)
        .context("failed to prepare the holiday calendar and form template")?;

    let report = service.run().with_context(|| {
        format!(
            "failed to process {}",
            service.config.paths.spreadsheet.display()
        )
    })?;

    if report.failed() > 0 {
        error!("{} timesheet(s) could not be produced", report.failed());
        std::process::exit(1);
    }

    info!(
        "Done: {} timesheet(s) written to {}",
        report.rendered() + report.truncated(),
        service.config.paths.output_dir.display()
    );

    Ok(())
}
