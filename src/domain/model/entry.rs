//! Records supplied by the user: desired packages, tag requests and project references.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::package::{PackageKey, deserialize_blank_as_none};

/// A package the user wants tracked.
/// Format: "namespace/name" or "namespace/name/source"
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DesiredEntry {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub source: Option<String>,
}

impl DesiredEntry {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, source: Option<&str>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            source: source.map(str::to_string),
        }
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.namespace, &self.name)
    }

    /// Rows without both a namespace and a name carry nothing to reconcile.
    pub fn is_blank(&self) -> bool {
        self.namespace.trim().is_empty() || self.name.trim().is_empty()
    }
}

impl FromStr for DesiredEntry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The source is a URL and keeps its own slashes.
        let mut parts = s.splitn(3, '/');
        let namespace = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if namespace.is_empty() || name.is_empty() {
            return Err(anyhow!(
                "Invalid package '{}'. Expected 'namespace/name' or 'namespace/name/source'.",
                s
            ));
        }
        let source = parts.next().filter(|source| !source.is_empty());
        Ok(DesiredEntry::new(namespace, name, source))
    }
}

/// A request to bind `tag` to `version` of a package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagEntry {
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub tag: String,
}

impl TagEntry {
    pub fn project(&self) -> ProjectRef {
        ProjectRef {
            namespace: Some(self.namespace.clone()),
            name: self.name.clone(),
        }
    }
}

/// A project named on the command line: "namespace/name" or a bare "name".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub namespace: Option<String>,
    pub name: String,
}

impl From<PackageKey> for ProjectRef {
    fn from(key: PackageKey) -> Self {
        ProjectRef {
            namespace: Some(key.namespace),
            name: key.name,
        }
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for ProjectRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = match s.split_once('/') {
            Some((namespace, name)) => (Some(namespace.to_string()), name),
            None => (None, s),
        };
        if name.is_empty() || namespace.as_deref() == Some("") {
            anyhow::bail!(
                "Invalid project '{}'. Expected 'namespace/name' or 'name'.",
                s
            );
        }
        Ok(ProjectRef {
            namespace,
            name: name.to_string(),
        })
    }
}
