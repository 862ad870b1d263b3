//! Read-only views over versions and tags.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use regex::Regex;

use crate::directory::{PackageFilter, RemoteDirectory, TagFilter, VersionFilter};
use crate::domain::model::{ProjectRef, Tag};
use crate::error::DirectoryError;

use super::tag::locate_project;

/// One version of a project with the tags bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionTags {
    pub number: String,
    pub tags: Vec<String>,
}

/// One tag name with every `ns/name:number` it is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct TagGroup {
    pub tag: String,
    pub versions: Vec<String>,
}

/// Compile `pattern` so it has to match the whole tag name.
pub fn full_match_regex(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern))
        .with_context(|| format!("Invalid tag filter '{}'", pattern))
}

/// Versions of `project` in directory order, each with its tags.
#[tracing::instrument(skip(directory))]
pub async fn versions_with_tags<D: RemoteDirectory + ?Sized>(
    directory: &D,
    project: &ProjectRef,
) -> Result<Vec<VersionTags>> {
    let record = locate_project(directory, project).await?;
    let id = record.id().ok_or_else(|| {
        DirectoryError::Decode(format!(
            "package {} has no id in {:?}",
            record.key(),
            record.resource_uri
        ))
    })?;

    let versions = directory
        .list_versions(&VersionFilter::all(record.key()))
        .await?;
    // The service may ignore `project_id`; tags of other packages must not leak in.
    let tags: Vec<Tag> = directory
        .list_tags(&TagFilter::for_changelog(id))
        .try_filter(|tag| {
            let keep = tag.changelog == id;
            async move { keep }
        })
        .try_collect()
        .await?;

    let mut by_version: HashMap<String, Vec<String>> = HashMap::new();
    for tag in tags {
        by_version.entry(tag.version_number).or_default().push(tag.name);
    }

    Ok(versions
        .into_iter()
        .map(|version| VersionTags {
            tags: by_version.remove(&version.number).unwrap_or_default(),
            number: version.number,
        })
        .collect())
}

/// Every tag of the actor, grouped by name and sorted, optionally filtered.
#[tracing::instrument(skip(directory, filter))]
pub async fn tags_by_name<D: RemoteDirectory + ?Sized>(
    directory: &D,
    filter: Option<&Regex>,
) -> Result<Vec<TagGroup>> {
    let tags: Vec<Tag> = directory
        .list_tags(&TagFilter::all())
        .try_filter(|tag| {
            let keep = filter.is_none_or(|re| re.is_match(&tag.name));
            async move { keep }
        })
        .try_collect()
        .await?;

    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<u64> = tags.iter().map(|tag| tag.changelog).collect();
    ids.sort_unstable();
    ids.dedup();
    let packages: HashMap<u64, String> = directory
        .find_packages(&PackageFilter::by_ids(ids))
        .await?
        .into_iter()
        .filter_map(|record| record.id().map(|id| (id, record.key().to_string())))
        .collect();

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for tag in tags {
        let package = packages
            .get(&tag.changelog)
            .cloned()
            .unwrap_or_else(|| format!("#{}", tag.changelog));
        groups
            .entry(tag.name)
            .or_default()
            .push(format!("{}:{}", package, tag.version_number));
    }

    Ok(groups
        .into_iter()
        .map(|(tag, mut versions)| {
            versions.sort();
            TagGroup { tag, versions }
        })
        .collect())
}
