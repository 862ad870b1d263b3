//! Tagging use case - binds user labels to discovered versions.

use log::{debug, warn};

use crate::directory::{PackageFilter, RemoteDirectory, VersionFilter};
use crate::domain::model::{PackageRecord, ProjectRef, TagEntry};
use crate::error::{DirectoryError, TagError};

/// Find the single package `project` refers to.
pub async fn locate_project<D: RemoteDirectory + ?Sized>(
    directory: &D,
    project: &ProjectRef,
) -> Result<PackageRecord, TagError> {
    let mut found = directory
        .find_packages(&PackageFilter::by_project(project))
        .await?;

    match found.len() {
        0 => Err(TagError::ProjectNotFound(project.to_string())),
        1 => Ok(found.remove(0)),
        _ => Err(TagError::AmbiguousProject(
            found.iter().map(|record| record.key().to_string()).collect(),
        )),
    }
}

/// Outcome of a tagging batch. Every entry lands in exactly one list.
#[derive(Debug, Default)]
pub struct TagBatchReport {
    pub tagged: Vec<TagEntry>,
    /// Versions the directory has not discovered yet.
    pub missing_versions: Vec<TagEntry>,
    pub failures: Vec<(TagEntry, TagError)>,
}

impl TagBatchReport {
    /// Operator-facing lines for every missing version, in batch order.
    pub fn missing_version_warnings(&self) -> Vec<String> {
        self.missing_versions
            .iter()
            .map(|entry| {
                format!(
                    "{}/{}\n    Version {} not found. Tag will be bound to the version when it will be discovered.",
                    entry.namespace, entry.name, entry.version
                )
            })
            .collect()
    }
}

pub struct Tagger<'a, D: RemoteDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: RemoteDirectory + ?Sized> Tagger<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Bind `tag` to `version` of `project`.
    #[tracing::instrument(skip(self))]
    pub async fn tag_version(
        &self,
        project: &ProjectRef,
        version: &str,
        tag: &str,
    ) -> Result<(), TagError> {
        let record = locate_project(self.directory, project).await?;
        let key = record.key();

        let versions = self
            .directory
            .list_versions(&VersionFilter::exact(key.clone(), version))
            .await?;
        if versions.is_empty() {
            return Err(TagError::VersionNotFound {
                namespace: key.namespace,
                name: key.name,
                version: version.to_string(),
            });
        }

        self.directory.create_tag(&record, tag, version).await?;
        debug!("Tagged {} {} as {}", key, version, tag);
        Ok(())
    }

    /// Tag every entry, in order. Only an authentication failure stops the batch.
    pub async fn tag_all(&self, entries: &[TagEntry]) -> Result<TagBatchReport, DirectoryError> {
        let mut report = TagBatchReport::default();

        for entry in entries {
            match self
                .tag_version(&entry.project(), &entry.version, &entry.tag)
                .await
            {
                Ok(()) => report.tagged.push(entry.clone()),
                Err(TagError::VersionNotFound { .. }) => report.missing_versions.push(entry.clone()),
                Err(TagError::Directory(e)) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Unable to tag {}/{}: {}", entry.namespace, entry.name, e);
                    report.failures.push((entry.clone(), e));
                }
            }
        }

        Ok(report)
    }
}
