use anyhow::Result;

use crate::{
    application::{TagBatchReport, Tagger},
    directory::RemoteDirectory,
    domain::model::{ProjectRef, TagEntry},
    error::TagError,
    runtime::Runtime,
};

use super::config::{Config, ConfigOptions};

/// Bind `tag` to `version` of `project`.
#[tracing::instrument(skip(runtime, options))]
pub async fn tag<R: Runtime>(
    runtime: R,
    options: &ConfigOptions,
    project: &str,
    version: &str,
    tag: &str,
) -> Result<()> {
    let project: ProjectRef = project.parse()?;
    let config = Config::load(&runtime, options)?;
    config.require_token()?;
    let directory = config.directory()?;

    if let Some(warning) = run(&directory, &project, version, tag).await? {
        println!("{}", warning);
    }
    Ok(())
}

/// Returns the warning to show when the version is not discovered yet.
async fn run<D: RemoteDirectory>(
    directory: &D,
    project: &ProjectRef,
    version: &str,
    tag: &str,
) -> Result<Option<String>> {
    match Tagger::new(directory).tag_version(project, version, tag).await {
        Ok(()) => Ok(None),
        Err(TagError::VersionNotFound {
            namespace,
            name,
            version,
        }) => {
            let report = TagBatchReport {
                missing_versions: vec![TagEntry {
                    namespace,
                    name,
                    version,
                    tag: tag.to_string(),
                }],
                ..Default::default()
            };
            Ok(report.missing_version_warnings().into_iter().next())
        }
        Err(e) => Err(e.into()),
    }
}
