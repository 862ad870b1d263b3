use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deserialize an optional string, treating `null` and `""` alike as absent.
pub(crate) fn deserialize_blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.trim().is_empty()))
}

/// Identifies a package in the directory (namespace/name format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageKey {
    pub namespace: String,
    pub name: String,
}

impl PackageKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for PackageKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(PackageKey::new(namespace, name))
            }
            _ => anyhow::bail!("Invalid package format. Expected 'namespace/name'."),
        }
    }
}

/// A package (changelog) as the directory returns it.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct PackageRecord {
    pub namespace: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub source: Option<String>,
    /// Canonical location of this record, e.g. `/v1/changelogs/42/`.
    #[serde(default)]
    pub resource_uri: String,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PackageRecord {
    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.namespace, &self.name)
    }

    /// Numeric id taken from the last segment of `resource_uri`.
    pub fn id(&self) -> Option<u64> {
        self.resource_uri
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
    }

    /// True when `declared` names a different source than the one on record.
    pub fn source_differs(&self, declared: &str) -> bool {
        self.source.as_deref() != Some(declared)
    }
}
