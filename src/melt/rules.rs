//! Declarative extraction rules
//!
//! Tables are described as data: a JSON document maps each table name to an
//! anchor path and an ordered list of columns. The document is deserialized
//! into a [`MeltConfig`] and compiled once into a validated [`RuleSet`], so
//! nothing is re-parsed or re-checked per row.

use crate::error::ConfigError;
use crate::melt::path::DocPath;
use crate::melt::preset::Preset;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_CONFIG: &str = include_str!("../../config/tft.json");

/// Where a column value comes from, as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSpec {
    Root(String),
    Parent(String),
    Local(String),
    Join {
        path: String,
        #[serde(default = "default_join_separator")]
        separator: String,
    },
    External(String),
    Ordinal,
}

fn default_join_separator() -> String {
    String::from(";")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub source: SourceSpec,

    /// Strip the namespace prefix from the resolved value
    #[serde(default)]
    pub identifier: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    /// Anchor path; empty means one row per document
    #[serde(default)]
    pub path: String,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSpec {
    /// Field holding the identifier the partition key is cut from
    pub path: String,

    /// The key is the part of the identifier before the first separator
    pub separator: char,

    /// Used when the field is absent or has no separator
    pub fallback: String,

    /// External name under which the key is offered to `external` columns
    pub external: Option<String>,
}

impl Default for PartitionSpec {
    fn default() -> Self {
        PartitionSpec {
            path: String::from("metadata.match_id"),
            separator: '_',
            fallback: String::from("unknown"),
            external: Some(String::from("region")),
        }
    }
}

/// Raw configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeltConfig {
    #[serde(default)]
    pub partition: PartitionSpec,

    /// Top-level keys a document must carry to be accepted
    #[serde(default)]
    pub required_keys: Vec<String>,

    pub tables: IndexMap<String, TableSpec>,

    #[serde(default)]
    pub presets: IndexMap<String, Preset>,
}

/// Compiled field source
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// Read from the document root
    Root(DocPath),
    /// Read from the enclosing list element of the matched item
    Parent(DocPath),
    /// Read from the matched item
    Local(DocPath),
    /// Collapse a list on the matched item into delimited text
    Join { path: DocPath, separator: String },
    /// Caller-supplied value
    External(String),
    /// Position of the matched item in its list
    Ordinal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub source: FieldSource,
    pub identifier: bool,
}

/// One output table: where its items live and how each column is read
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRule {
    pub table: String,
    pub anchor: DocPath,
    pub columns: Vec<Column>,
}

impl ExtractionRule {
    /// Compile and validate one table definition
    pub fn compile(table: &str, spec: &TableSpec) -> Result<Self, ConfigError> {
        let anchor: DocPath = spec.path.parse()?;
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(spec.columns.len());

        for column in &spec.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ConfigError::DuplicateColumn {
                    table: table.to_string(),
                    column: column.name.clone(),
                });
            }

            let field_path = |raw: &str| -> Result<DocPath, ConfigError> {
                let path = DocPath::parse(raw)?;
                if path.has_expansion() {
                    return Err(ConfigError::ExpansionInFieldPath {
                        table: table.to_string(),
                        column: column.name.clone(),
                        path: raw.to_string(),
                    });
                }
                Ok(path)
            };

            let source = match &column.source {
                SourceSpec::Root(p) => FieldSource::Root(field_path(p)?),
                SourceSpec::Parent(p) => {
                    if !anchor.has_enclosing() {
                        return Err(ConfigError::NoEnclosingItem {
                            table: table.to_string(),
                            column: column.name.clone(),
                            anchor: spec.path.clone(),
                        });
                    }
                    FieldSource::Parent(field_path(p)?)
                }
                SourceSpec::Local(p) => FieldSource::Local(field_path(p)?),
                SourceSpec::Join { path, separator } => FieldSource::Join {
                    path: field_path(path)?,
                    separator: separator.clone(),
                },
                SourceSpec::External(name) => FieldSource::External(name.clone()),
                SourceSpec::Ordinal => {
                    if !anchor.ends_in_expansion() {
                        return Err(ConfigError::NoOrdinal {
                            table: table.to_string(),
                            column: column.name.clone(),
                            anchor: spec.path.clone(),
                        });
                    }
                    FieldSource::Ordinal
                }
            };

            columns.push(Column {
                name: column.name.clone(),
                source,
                identifier: column.identifier,
            });
        }

        Ok(ExtractionRule {
            table: table.to_string(),
            anchor,
            columns,
        })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Compiled partition settings
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub path: DocPath,
    pub separator: char,
    pub fallback: String,
    pub external: Option<String>,
}

/// Validated rules and presets, immutable for the lifetime of a run
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub rules: Vec<ExtractionRule>,
    pub partition: Partition,
    pub required_keys: Vec<String>,
    presets: IndexMap<String, Preset>,
}

impl RuleSet {
    /// Compile a configuration, failing on the first structural error
    pub fn from_config(config: MeltConfig) -> Result<Self, ConfigError> {
        let rules = config
            .tables
            .iter()
            .map(|(name, spec)| ExtractionRule::compile(name, spec))
            .collect::<Result<Vec<_>, _>>()?;

        let partition = Partition {
            path: DocPath::parse(&config.partition.path)?,
            separator: config.partition.separator,
            fallback: config.partition.fallback,
            external: config.partition.external,
        };

        let mut presets = config.presets;
        for (name, preset) in presets.iter_mut() {
            preset.name = name.clone();
            for table in preset.table_names() {
                if !config.tables.contains_key(table) {
                    tracing::warn!(preset = %name, table = %table, "preset references a table no rule defines");
                }
            }
        }

        Ok(RuleSet {
            rules,
            partition,
            required_keys: config.required_keys,
            presets,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MeltConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// The bundled match tables and presets
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_CONFIG)
    }

    pub fn rule(&self, table: &str) -> Option<&ExtractionRule> {
        self.rules.iter().find(|r| r.table == table)
    }

    pub fn preset(&self, name: &str) -> Result<&Preset, ConfigError> {
        self.presets.get(name).ok_or_else(|| ConfigError::UnknownPreset {
            name: name.to_string(),
            available: self.preset_names().join(", "),
        })
    }

    /// External name the partition key is offered under, `region` when unset
    pub fn partition_external(&self) -> &str {
        self.partition.external.as_deref().unwrap_or("region")
    }

    pub fn preset_names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }
}
