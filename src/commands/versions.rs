use anyhow::Result;

use crate::{
    application::{VersionTags, versions_with_tags},
    domain::model::ProjectRef,
    runtime::Runtime,
};

use super::config::{Config, ConfigOptions};

/// List the versions of a project with any tags bound to them.
#[tracing::instrument(skip(runtime, options))]
pub async fn versions<R: Runtime>(runtime: R, options: &ConfigOptions, project: &str) -> Result<()> {
    let project: ProjectRef = project.parse()?;
    let config = Config::load(&runtime, options)?;
    let directory = config.directory()?;

    for version in versions_with_tags(&directory, &project).await? {
        println!("{}", format_version(&version));
    }
    Ok(())
}

fn format_version(version: &VersionTags) -> String {
    if version.tags.is_empty() {
        version.number.clone()
    } else {
        format!("{}: {}", version.number, version.tags.join(", "))
    }
}
