use anyhow::Result;
use tabled::{Table, Tabled};

use crate::{
    application::{TagGroup, full_match_regex, tags_by_name},
    runtime::Runtime,
};

use super::config::{Config, ConfigOptions};

#[derive(Tabled)]
struct TagRow {
    tag: String,
    versions: String,
}

/// List tags with the package versions they are bound to.
#[tracing::instrument(skip(runtime, options))]
pub async fn tags<R: Runtime>(
    runtime: R,
    options: &ConfigOptions,
    filter: Option<&str>,
) -> Result<()> {
    let filter = filter.map(full_match_regex).transpose()?;
    let config = Config::load(&runtime, options)?;
    config.require_token()?;
    let directory = config.directory()?;

    let groups = tags_by_name(&directory, filter.as_ref()).await?;
    if groups.is_empty() {
        println!("No tags found.");
        return Ok(());
    }
    println!("{}", render(groups));
    Ok(())
}

fn render(groups: Vec<TagGroup>) -> String {
    let rows = groups.into_iter().map(|group| TagRow {
        tag: group.tag,
        versions: group.versions.join(", "),
    });
    Table::new(rows).to_string()
}
