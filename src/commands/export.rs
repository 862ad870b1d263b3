use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    codec::{self, Format},
    directory::{PackageFilter, RemoteDirectory},
    runtime::Runtime,
};

use super::config::{Config, ConfigOptions};

/// Write every tracked package to `output` (stdout when absent).
#[tracing::instrument(skip(runtime, options))]
pub async fn export<R: Runtime>(
    runtime: R,
    options: &ConfigOptions,
    output: Option<&Path>,
    format: Format,
) -> Result<()> {
    let config = Config::load(&runtime, options)?;
    config.require_token()?;
    let directory = config.directory()?;

    let document = render(&directory, format).await?;
    match output {
        Some(path) => {
            runtime.write(path, document.as_bytes())?;
            debug!("Exported packages to {:?}", path);
        }
        None => print!("{}", document),
    }
    Ok(())
}

async fn render<D: RemoteDirectory>(directory: &D, format: Format) -> Result<String> {
    let mut packages = directory.find_packages(&PackageFilter::tracked()).await?;
    packages.sort_by(|a, b| a.key().cmp(&b.key()));
    codec::encode_packages(&packages, format)
}
