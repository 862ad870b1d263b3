use anyhow::Result;
use log::debug;

use crate::{
    application::{ActionReport, ReconcileOptions, Reconciler},
    directory::RemoteDirectory,
    domain::model::DesiredEntry,
    runtime::Runtime,
};

use super::config::{Config, ConfigOptions};

/// Track packages given as `namespace/name[/source]`.
#[tracing::instrument(skip(runtime, options))]
pub async fn add<R: Runtime>(
    runtime: R,
    options: &ConfigOptions,
    packages: &[String],
    update_source: bool,
) -> Result<()> {
    let entries = packages
        .iter()
        .map(|package| package.parse::<DesiredEntry>())
        .collect::<Result<Vec<_>>>()?;

    let config = Config::load(&runtime, options)?;
    config.require_token()?;
    let directory = config.directory()?;

    let reports = reconcile(
        &directory,
        &runtime,
        &entries,
        ReconcileOptions { update_source },
    )
    .await?;
    print_reports(&reports, config.site_url())
}

pub(crate) async fn reconcile<D: RemoteDirectory, R: Runtime>(
    directory: &D,
    runtime: &R,
    entries: &[DesiredEntry],
    options: ReconcileOptions,
) -> Result<Vec<ActionReport>> {
    debug!("Reconciling {} entries", entries.len());
    Reconciler::new(directory, runtime, options)
        .reconcile(entries)
        .await
}

/// Output lines for a reconciliation batch, in entry order.
pub(crate) fn report_lines(reports: &[ActionReport], site_url: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for report in reports {
        lines.extend(report.warnings.iter().cloned());
        if let Some(summary) = report.summary(site_url) {
            lines.push(summary);
        }
        if let Some(error) = &report.error {
            lines.push(format!("{}: failed: {}", report.key, error));
        }
    }
    lines
}

/// Print the batch outcome. Fails when any entry failed.
pub(crate) fn print_reports(reports: &[ActionReport], site_url: &str) -> Result<()> {
    for line in report_lines(reports, site_url) {
        println!("{}", line);
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} package(s) failed", failed, reports.len());
    }
    Ok(())
}
