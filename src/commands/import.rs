use anyhow::Result;
use log::info;
use std::path::Path;

use crate::{
    application::{ReconcileOptions, TagBatchReport, Tagger},
    codec::{self, Format},
    domain::model::{DesiredEntry, TagEntry},
    runtime::Runtime,
};

use super::add::{print_reports, reconcile};
use super::config::{Config, ConfigOptions};

/// Track every package listed in `input` (stdin when absent), then apply the
/// tags the rows carry.
#[tracing::instrument(skip(runtime, options))]
pub async fn import<R: Runtime>(
    runtime: R,
    options: &ConfigOptions,
    input: Option<&Path>,
    format: Format,
    update_source: bool,
) -> Result<()> {
    let content = match input {
        Some(path) => runtime.read_to_string(path)?,
        None => runtime.read_stdin()?,
    };
    let rows = codec::decode_rows(&content, format)?;
    info!("Read {} rows", rows.len());

    let config = Config::load(&runtime, options)?;
    config.require_token()?;
    let directory = config.directory()?;

    let entries: Vec<DesiredEntry> = rows.iter().map(|row| row.desired_entry()).collect();
    let tag_entries: Vec<TagEntry> = rows.iter().filter_map(|row| row.tag_entry()).collect();

    let reports = reconcile(
        &directory,
        &runtime,
        &entries,
        ReconcileOptions { update_source },
    )
    .await?;
    let reconciled = print_reports(&reports, config.site_url());

    let tagged = Tagger::new(&directory).tag_all(&tag_entries).await?;
    print_tag_report(&tagged)?;

    reconciled
}

fn tag_report_lines(report: &TagBatchReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .failures
        .iter()
        .map(|(entry, err)| {
            format!(
                "{}/{}: unable to tag {} as {}: {}",
                entry.namespace, entry.name, entry.version, entry.tag, err
            )
        })
        .collect();
    lines.extend(report.missing_version_warnings());
    lines
}

fn print_tag_report(report: &TagBatchReport) -> Result<()> {
    for line in tag_report_lines(report) {
        println!("{}", line);
    }
    if !report.failures.is_empty() {
        anyhow::bail!("{} tag(s) could not be applied", report.failures.len());
    }
    Ok(())
}
