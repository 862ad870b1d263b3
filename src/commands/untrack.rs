use anyhow::Result;
use log::warn;

use crate::{
    directory::{PackageFilter, RemoteDirectory},
    domain::model::PackageKey,
    runtime::Runtime,
};

use super::config::{Config, ConfigOptions};

/// Stop tracking packages given as `namespace/name`.
#[tracing::instrument(skip(runtime, options))]
pub async fn untrack<R: Runtime>(
    runtime: R,
    options: &ConfigOptions,
    packages: &[String],
) -> Result<()> {
    let keys = packages
        .iter()
        .map(|package| package.parse::<PackageKey>())
        .collect::<Result<Vec<_>>>()?;

    let config = Config::load(&runtime, options)?;
    config.require_token()?;
    let directory = config.directory()?;

    for line in run(&directory, &keys, config.site_url()).await? {
        println!("{}", line);
    }
    Ok(())
}

async fn run<D: RemoteDirectory>(
    directory: &D,
    keys: &[PackageKey],
    site_url: &str,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for key in keys {
        let found = directory.find_packages(&PackageFilter::by_key(key)).await?;
        if found.is_empty() {
            warn!("Package {} not found", key);
            lines.push(format!("Package {} not found.", key));
            continue;
        }
        for record in found {
            directory.untrack_package(&record).await?;
            lines.push(format!(
                "{}/p/{}/{}/ was untracked",
                site_url, record.namespace, record.name
            ));
        }
    }
    Ok(lines)
}
