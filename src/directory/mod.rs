//! Remote changelog directory abstraction.
//!
//! The reconciliation and tagging workflows only talk to the directory through
//! [`RemoteDirectory`], so they can run against the real service
//! ([`AllMyChanges`]) or a mock in tests.

mod allmychanges;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::model::{PackageKey, PackageRecord, ProjectRef, Tag, VersionRecord};
use crate::error::DirectoryError;

pub use allmychanges::{AllMyChanges, DEFAULT_BASE_URL};

/// Lazily paged sequence of tags. Each call to `list_tags` starts a new one.
pub type TagStream = BoxStream<'static, Result<Tag, DirectoryError>>;

/// Package query. All set fields must match; unset fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageFilter {
    pub namespace: Option<String>,
    pub name: Option<String>,
    /// Only packages in the current actor's tracked set.
    pub tracked_only: bool,
    pub id_in: Vec<u64>,
}

impl PackageFilter {
    pub fn by_key(key: &PackageKey) -> Self {
        Self {
            namespace: Some(key.namespace.clone()),
            name: Some(key.name.clone()),
            ..Default::default()
        }
    }

    pub fn by_project(project: &ProjectRef) -> Self {
        Self {
            namespace: project.namespace.clone(),
            name: Some(project.name.clone()),
            ..Default::default()
        }
    }

    pub fn by_namespace(namespace: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    pub fn by_name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn tracked() -> Self {
        Self {
            tracked_only: true,
            ..Default::default()
        }
    }

    pub fn by_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            id_in: ids.into_iter().collect(),
            ..Default::default()
        }
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(namespace) = &self.namespace {
            query.push(("namespace", namespace.clone()));
        }
        if let Some(name) = &self.name {
            query.push(("name", name.clone()));
        }
        if self.tracked_only {
            query.push(("tracked", "True".to_string()));
        }
        if !self.id_in.is_empty() {
            let ids: Vec<String> = self.id_in.iter().map(u64::to_string).collect();
            query.push(("id__in", ids.join(",")));
        }
        query
    }
}

/// Version query for one package, optionally narrowed to an exact number.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionFilter {
    pub package: PackageKey,
    pub number: Option<String>,
}

impl VersionFilter {
    pub fn all(package: PackageKey) -> Self {
        Self {
            package,
            number: None,
        }
    }

    pub fn exact(package: PackageKey, number: &str) -> Self {
        Self {
            package,
            number: Some(number.to_string()),
        }
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("changelog__namespace", self.package.namespace.clone()),
            ("changelog__name", self.package.name.clone()),
        ];
        if let Some(number) = &self.number {
            query.push(("number", number.clone()));
        }
        query
    }
}

/// Tag query: every tag of the actor, or only those of one package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagFilter {
    pub changelog_id: Option<u64>,
}

impl TagFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_changelog(id: u64) -> Self {
        Self {
            changelog_id: Some(id),
        }
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        match self.changelog_id {
            Some(id) => vec![("project_id", id.to_string())],
            None => Vec::new(),
        }
    }
}

/// Operations the core needs from the remote changelog directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Packages matching `filter`, across all result pages.
    async fn find_packages(&self, filter: &PackageFilter)
    -> Result<Vec<PackageRecord>, DirectoryError>;

    /// Fails with `AlreadyExists` or `SourceAlreadyExists` on conflicts.
    async fn create_package(
        &self,
        key: &PackageKey,
        source: &str,
    ) -> Result<PackageRecord, DirectoryError>;

    async fn update_package_source(
        &self,
        record: &PackageRecord,
        source: &str,
    ) -> Result<PackageRecord, DirectoryError>;

    async fn track_package(&self, record: &PackageRecord) -> Result<(), DirectoryError>;

    async fn untrack_package(&self, record: &PackageRecord) -> Result<(), DirectoryError>;

    async fn list_versions(
        &self,
        filter: &VersionFilter,
    ) -> Result<Vec<VersionRecord>, DirectoryError>;

    /// Tags matching `filter`; pages are fetched as the stream is polled.
    fn list_tags(&self, filter: &TagFilter) -> TagStream;

    async fn create_tag(
        &self,
        record: &PackageRecord,
        tag: &str,
        version: &str,
    ) -> Result<(), DirectoryError>;

    /// Candidate source URLs for a package, best guess first.
    async fn guess_source(&self, key: &PackageKey) -> Result<Vec<String>, DirectoryError>;
}
