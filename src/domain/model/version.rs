use serde::{Deserialize, Serialize};

/// A version the directory discovered for a package.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct VersionRecord {
    #[serde(default)]
    pub id: Option<u64>,
    pub number: String,
}

/// A user label bound to a package version.
///
/// `changelog` is the numeric id of the tagged package; the version may not
/// have been discovered yet.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct Tag {
    pub name: String,
    pub changelog: u64,
    pub version_number: String,
}
