use anyhow::Result;
use tabled::{Table, Tabled};

use crate::{
    directory::{PackageFilter, RemoteDirectory},
    domain::model::{PackageKey, PackageRecord},
    runtime::Runtime,
};

use super::config::{Config, ConfigOptions};

const DESCRIPTION_WIDTH: usize = 80;

#[derive(Tabled)]
struct PackageRow {
    namespace: String,
    name: String,
    version: String,
    description: String,
}

impl From<PackageRecord> for PackageRow {
    fn from(record: PackageRecord) -> Self {
        Self {
            description: short_description(record.description.as_deref()),
            version: record.latest_version.unwrap_or_default(),
            namespace: record.namespace,
            name: record.name,
        }
    }
}

/// Search the directory: `namespace/name`, or a bare word matched as a
/// namespace first and as a name otherwise.
#[tracing::instrument(skip(runtime, options))]
pub async fn search<R: Runtime>(runtime: R, options: &ConfigOptions, query: &str) -> Result<()> {
    let config = Config::load(&runtime, options)?;
    let directory = config.directory()?;

    let packages = find(&directory, query).await?;
    if packages.is_empty() {
        println!("No packages found.");
        return Ok(());
    }
    let rows: Vec<PackageRow> = packages.into_iter().map(PackageRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

async fn find<D: RemoteDirectory>(directory: &D, query: &str) -> Result<Vec<PackageRecord>> {
    if query.contains('/') {
        let key: PackageKey = query.parse()?;
        return Ok(directory.find_packages(&PackageFilter::by_key(&key)).await?);
    }

    let by_namespace = directory
        .find_packages(&PackageFilter::by_namespace(query))
        .await?;
    if !by_namespace.is_empty() {
        return Ok(by_namespace);
    }
    Ok(directory.find_packages(&PackageFilter::by_name(query)).await?)
}

fn short_description(description: Option<&str>) -> String {
    let description = description.map(str::trim).unwrap_or_default();
    if description.is_empty() {
        return "no description".to_string();
    }
    if description.chars().count() > DESCRIPTION_WIDTH {
        let mut short: String = description.chars().take(DESCRIPTION_WIDTH - 1).collect();
        short.push('…');
        short
    } else {
        description.to_string()
    }
}
