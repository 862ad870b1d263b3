//! Import and export formats for package lists.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::model::package::deserialize_blank_as_none;
use crate::domain::model::{DesiredEntry, PackageRecord, TagEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Yaml,
    /// Header row `namespace,name,source` with optional `version,tag` columns.
    Csv,
}

/// One row of an import file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportRow {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub tag: Option<String>,
}

impl ImportRow {
    pub fn desired_entry(&self) -> DesiredEntry {
        DesiredEntry::new(
            self.namespace.trim(),
            self.name.trim(),
            self.source.as_deref().map(str::trim),
        )
    }

    /// The tag request carried by this row, when it names both a version and a tag.
    pub fn tag_entry(&self) -> Option<TagEntry> {
        match (&self.version, &self.tag) {
            (Some(version), Some(tag)) => Some(TagEntry {
                namespace: self.namespace.trim().to_string(),
                name: self.name.trim().to_string(),
                version: version.trim().to_string(),
                tag: tag.trim().to_string(),
            }),
            _ => None,
        }
    }
}

/// One row of an export file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub source: &'a str,
}

impl<'a> From<&'a PackageRecord> for ExportRow<'a> {
    fn from(record: &'a PackageRecord) -> Self {
        Self {
            namespace: &record.namespace,
            name: &record.name,
            source: record.source.as_deref().unwrap_or_default(),
        }
    }
}

/// Decode an import document. Rows without a namespace and a name are dropped.
pub fn decode_rows(input: &str, format: Format) -> Result<Vec<ImportRow>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<ImportRow> = match format {
        Format::Json => serde_json::from_str(input).context("Failed to parse JSON input")?,
        Format::Yaml => serde_yaml::from_str(input).context("Failed to parse YAML input")?,
        Format::Csv => decode_csv(input).context("Failed to parse CSV input")?,
    };

    Ok(rows
        .into_iter()
        .filter(|row| !row.namespace.trim().is_empty() && !row.name.trim().is_empty())
        .collect())
}

/// Encode `records` as `(namespace, name, source)` rows.
pub fn encode_packages(records: &[PackageRecord], format: Format) -> Result<String> {
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    let mut output = match format {
        Format::Json => serde_json::to_string_pretty(&rows)?,
        Format::Yaml => serde_yaml::to_string(&rows)?,
        Format::Csv => encode_csv(&rows)?,
    };
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

fn decode_csv(input: &str) -> Result<Vec<ImportRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());
    reader.deserialize().collect()
}

fn encode_csv(rows: &[ExportRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record(["namespace", "name", "source"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to write CSV output")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
