//! Source resolution - asks the user for a source URL when none was declared.

use anyhow::Result;
use log::{debug, warn};

use crate::directory::RemoteDirectory;
use crate::domain::model::PackageKey;
use crate::runtime::Runtime;

/// Typing this at the manual prompt gives up on the package.
pub const SKIP_ANSWER: &str = "skip";

/// Outcome of resolving a source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A non-empty source URL to create the package with.
    Source(String),
    /// The user chose not to add this package.
    Skip,
}

/// Drives the guess / choose / enter-manually loop for one package.
pub struct SourceResolver<'a, D: RemoteDirectory + ?Sized, R: Runtime + ?Sized> {
    directory: &'a D,
    runtime: &'a R,
}

impl<'a, D: RemoteDirectory + ?Sized, R: Runtime + ?Sized> SourceResolver<'a, D, R> {
    pub fn new(directory: &'a D, runtime: &'a R) -> Self {
        Self { directory, runtime }
    }

    /// Resolve a source for `key`. Never returns an empty source.
    ///
    /// Fails only when the user cannot be asked (input closed) or the
    /// directory rejects our credentials.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, key: &PackageKey) -> Result<Resolution> {
        loop {
            let candidates = self.candidates(key).await?;

            if !candidates.is_empty() {
                if let Some(source) = self.choose(key, &candidates)? {
                    return Ok(Resolution::Source(source));
                }
            }

            if let Some(resolution) = self.enter_manually(key)? {
                return Ok(resolution);
            }
        }
    }

    async fn candidates(&self, key: &PackageKey) -> Result<Vec<String>> {
        match self.directory.guess_source(key).await {
            Ok(candidates) => {
                debug!("{} source candidates for {}", candidates.len(), key);
                Ok(candidates)
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!("Unable to guess a source for {}: {}", key, e);
                Ok(Vec::new())
            }
        }
    }

    /// Numbered menu. `None` means the user picked manual entry.
    fn choose(&self, key: &PackageKey, candidates: &[String]) -> Result<Option<String>> {
        println!("Please choose a source URL for {}:", key);
        for (index, candidate) in candidates.iter().enumerate() {
            println!("  {}. {}", index + 1, candidate);
        }
        println!("  0. Enter URL manually");

        let max = candidates.len();
        loop {
            let answer = self
                .runtime
                .prompt(&format!("Your choice [0-{}]: ", max))?;
            match answer.parse::<usize>() {
                Ok(0) => return Ok(None),
                Ok(choice) if choice <= max => return Ok(Some(candidates[choice - 1].clone())),
                _ => println!("Please enter a number from 0 to {}.", max),
            }
        }
    }

    /// Free-form entry. `None` means the answer was empty and we should start over.
    fn enter_manually(&self, key: &PackageKey) -> Result<Option<Resolution>> {
        let answer = self.runtime.prompt(&format!(
            "Enter source URL for {} (or '{}' to skip it): ",
            key, SKIP_ANSWER
        ))?;

        if answer == SKIP_ANSWER {
            Ok(Some(Resolution::Skip))
        } else if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Resolution::Source(answer)))
        }
    }
}
