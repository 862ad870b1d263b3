//! Reconcile use case - converges the remote tracked set with the user's declarations.
//!
//! Every declared package lands in one of four situations:
//! - absent from the directory: resolve a source if needed, create, track
//! - present but untracked: warn on source mismatch, track
//! - present and tracked: warn on source mismatch, nothing else
//! - present with a mismatched source and `update_source` set: overwrite the source
//!
//! The tracked set is read once per batch and only updated with our own
//! track calls; changes made elsewhere show up on the next run.

use std::collections::HashSet;
use std::fmt;

use anyhow::Result;
use log::{debug, info, warn};

use crate::directory::{PackageFilter, RemoteDirectory};
use crate::domain::model::{DesiredEntry, PackageKey, PackageRecord};
use crate::error::DirectoryError;
use crate::runtime::Runtime;

use super::resolve::{Resolution, SourceResolver};

/// A mutation (or deliberate non-mutation) performed for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    SourceUpdated,
    Tracked,
    Skipped,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Created => write!(f, "created"),
            Action::SourceUpdated => write!(f, "updated"),
            Action::Tracked => write!(f, "tracked"),
            Action::Skipped => write!(f, "skipped"),
        }
    }
}

/// What happened to one declared package.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub key: PackageKey,
    pub actions: Vec<Action>,
    pub warnings: Vec<String>,
    /// Set when a directory call failed part-way; `actions` keeps what did happen.
    pub error: Option<String>,
}

impl ActionReport {
    fn new(key: PackageKey) -> Self {
        Self {
            key,
            actions: Vec::new(),
            warnings: Vec::new(),
            error: None,
        }
    }

    /// `<site>/p/<namespace>/<name>/ was created and tracked`, or `None` when
    /// nothing was done.
    pub fn summary(&self, site_url: &str) -> Option<String> {
        if self.actions.is_empty() {
            return None;
        }
        let actions: Vec<String> = self.actions.iter().map(Action::to_string).collect();
        Some(format!(
            "{}/p/{}/{}/ was {}",
            site_url.trim_end_matches('/'),
            self.key.namespace,
            self.key.name,
            actions.join(" and ")
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Overwrite a differing remote source instead of only warning about it.
    pub update_source: bool,
}

/// Reconciler - applies a batch of desired entries to the directory, one at a time.
pub struct Reconciler<'a, D: RemoteDirectory + ?Sized, R: Runtime + ?Sized> {
    directory: &'a D,
    resolver: SourceResolver<'a, D, R>,
    options: ReconcileOptions,
}

impl<'a, D: RemoteDirectory + ?Sized, R: Runtime + ?Sized> Reconciler<'a, D, R> {
    pub fn new(directory: &'a D, runtime: &'a R, options: ReconcileOptions) -> Self {
        Self {
            directory,
            resolver: SourceResolver::new(directory, runtime),
            options,
        }
    }

    /// Reconcile `desired` in order. Blank entries are ignored.
    ///
    /// Directory failures are recorded on the entry they happened to and the
    /// batch goes on; an authentication failure or an unanswerable prompt
    /// stops the batch.
    #[tracing::instrument(skip(self, desired), fields(entries = desired.len()))]
    pub async fn reconcile(&self, desired: &[DesiredEntry]) -> Result<Vec<ActionReport>> {
        let mut tracked: HashSet<PackageKey> = self
            .directory
            .find_packages(&PackageFilter::tracked())
            .await?
            .iter()
            .map(PackageRecord::key)
            .collect();
        debug!("{} package(s) already tracked", tracked.len());

        let mut reports = Vec::new();
        for entry in desired {
            if entry.is_blank() {
                debug!("Skipping blank entry {:?}", entry);
                continue;
            }

            let mut report = ActionReport::new(entry.key());
            if let Err(err) = self.reconcile_entry(entry, &mut tracked, &mut report).await {
                match err.downcast::<DirectoryError>() {
                    Ok(e) if e.is_fatal() => return Err(e.into()),
                    Ok(e) => {
                        warn!("{}: {}", report.key, e);
                        report.error = Some(e.to_string());
                    }
                    Err(other) => return Err(other),
                }
            }
            reports.push(report);
        }

        Ok(reports)
    }

    async fn reconcile_entry(
        &self,
        entry: &DesiredEntry,
        tracked: &mut HashSet<PackageKey>,
        report: &mut ActionReport,
    ) -> Result<()> {
        let key = entry.key();
        let mut found = self
            .directory
            .find_packages(&PackageFilter::by_key(&key))
            .await?;

        match found.len() {
            0 => self.create(entry, tracked, report).await,
            1 => self.adopt(entry, found.remove(0), tracked, report).await,
            n => {
                report.error = Some(format!("{} packages match {}", n, key));
                Ok(())
            }
        }
    }

    /// The package is unknown to the directory.
    async fn create(
        &self,
        entry: &DesiredEntry,
        tracked: &mut HashSet<PackageKey>,
        report: &mut ActionReport,
    ) -> Result<()> {
        let key = entry.key();
        let source = match &entry.source {
            Some(source) => source.clone(),
            None => match self.resolver.resolve(&key).await? {
                Resolution::Source(source) => source,
                Resolution::Skip => {
                    info!("Skipping {} at user request", key);
                    report.actions.push(Action::Skipped);
                    return Ok(());
                }
            },
        };

        let record = match self.directory.create_package(&key, &source).await {
            Ok(record) => record,
            Err(
                e @ (DirectoryError::AlreadyExists { .. } | DirectoryError::SourceAlreadyExists(_)),
            ) => {
                report.warnings.push(e.to_string());
                report.actions.push(Action::Skipped);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        report.actions.push(Action::Created);

        self.directory.track_package(&record).await?;
        report.actions.push(Action::Tracked);
        tracked.insert(key);
        Ok(())
    }

    /// The package exists; make sure we track it and report source mismatches.
    async fn adopt(
        &self,
        entry: &DesiredEntry,
        mut record: PackageRecord,
        tracked: &mut HashSet<PackageKey>,
        report: &mut ActionReport,
    ) -> Result<()> {
        let key = record.key();
        let is_tracked = tracked.contains(&key);

        if let Some(declared) = entry.source.as_deref() {
            if record.source_differs(declared) {
                if self.options.update_source {
                    record = self
                        .directory
                        .update_package_source(&record, declared)
                        .await?;
                    report.actions.push(Action::SourceUpdated);
                } else {
                    report
                        .warnings
                        .push(mismatch_warning(&record, is_tracked));
                }
            }
        }

        if !is_tracked {
            self.directory.track_package(&record).await?;
            report.actions.push(Action::Tracked);
            tracked.insert(key);
        }
        Ok(())
    }
}

fn mismatch_warning(record: &PackageRecord, is_tracked: bool) -> String {
    let remote = match record.source.as_deref() {
        Some(source) => format!("with url {}", source),
        None => "without a source url".to_string(),
    };
    if is_tracked {
        format!(
            "Warning! You already track package {}, but {}.",
            record.key(),
            remote
        )
    } else {
        format!(
            "Warning! There is package {} in the directory, but {}.",
            record.key(),
            remote
        )
    }
}
