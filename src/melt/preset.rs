//! Column presets
//!
//! A preset maps table names to the columns kept on output. Tables a preset
//! does not mention are not written under that preset.

use crate::melt::types::{Row, Table};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;

/// Keyword selecting every declared column
pub const ALL_COLUMNS: &str = "__all__";

/// Columns kept for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Columns(Vec<String>),
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Keyword(String),
            Columns(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Keyword(k) if k == ALL_COLUMNS => Ok(Selection::All),
            Raw::Keyword(k) => Err(D::Error::custom(format!(
                "unknown column selection '{}', expected \"{}\" or a list of columns",
                k, ALL_COLUMNS
            ))),
            Raw::Columns(columns) => Ok(Selection::Columns(columns)),
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str(ALL_COLUMNS),
            Selection::Columns(columns) => serializer.collect_seq(columns),
        }
    }
}

/// A named column-selection policy across tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preset {
    #[serde(skip)]
    pub name: String,
    tables: IndexMap<String, Selection>,
}

impl Preset {
    pub fn new(name: impl Into<String>, tables: IndexMap<String, Selection>) -> Self {
        Preset {
            name: name.into(),
            tables,
        }
    }

    pub fn selection(&self, table: &str) -> Option<&Selection> {
        self.tables.get(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Project every table this preset names; drop the rest
    pub fn apply(&self, tables: Vec<Table>) -> Vec<Table> {
        tables
            .into_iter()
            .filter_map(|table| match self.selection(&table.name) {
                Some(selection) => Some(project(table, selection)),
                None => {
                    tracing::debug!(preset = %self.name, table = %table.name, "table not in preset, skipping");
                    None
                }
            })
            .collect()
    }
}

/// Apply one selection to a table
///
/// Declared columns keep the rule's order; allowlisted columns the rule never
/// declared follow in allowlist order and are `null` on every row.
pub fn project(table: Table, selection: &Selection) -> Table {
    let keep = match selection {
        Selection::All => return table,
        Selection::Columns(keep) => keep,
    };

    let columns = projected_columns(&table.columns, keep);
    let rows = table
        .rows
        .into_iter()
        .map(|mut row| {
            columns
                .iter()
                .map(|c| (c.clone(), row.remove(c).unwrap_or(Value::Null)))
                .collect::<Row>()
        })
        .collect();

    Table {
        name: table.name,
        columns,
        rows,
    }
}

fn projected_columns(declared: &[String], keep: &[String]) -> Vec<String> {
    let wanted: HashSet<&str> = keep.iter().map(String::as_str).collect();
    let declared_set: HashSet<&str> = declared.iter().map(String::as_str).collect();

    let mut columns: Vec<String> = declared
        .iter()
        .filter(|c| wanted.contains(c.as_str()))
        .cloned()
        .collect();

    for column in keep {
        if !declared_set.contains(column.as_str()) && !columns.contains(column) {
            columns.push(column.clone());
        }
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_table() -> Table {
        let rows = vec![
            json!({"match_id": "NA1_1", "puuid": "p1", "placement": 1}),
            json!({"match_id": "NA1_1", "puuid": "p2", "placement": 2}),
        ]
        .into_iter()
        .map(|v| serde_json::from_value::<Row>(v).unwrap())
        .collect();

        Table::new(
            "participant",
            vec!["match_id".into(), "puuid".into(), "placement".into()],
        )
        .with_rows(rows)
    }

    #[test]
    fn test_all_is_identity() {
        let table = sample_table();
        let projected = project(table.clone(), &Selection::All);

        assert_eq!(projected, table);
        let keys: Vec<_> = projected.rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["match_id", "puuid", "placement"]);
    }

    #[test]
    fn test_allowlist_keeps_declared_order() {
        let selection = Selection::Columns(vec!["placement".into(), "match_id".into()]);
        let projected = project(sample_table(), &selection);

        assert_eq!(projected.columns, vec!["match_id", "placement"]);
        let keys: Vec<_> = projected.rows[1].keys().cloned().collect();
        assert_eq!(keys, vec!["match_id", "placement"]);
        assert_eq!(projected.rows[1]["placement"], 2);
    }

    #[test]
    fn test_unknown_column_is_null() {
        let selection = Selection::Columns(vec!["puuid".into(), "gold_left".into()]);
        let projected = project(sample_table(), &selection);

        assert_eq!(projected.columns, vec!["puuid", "gold_left"]);
        assert!(projected.rows.iter().all(|r| r["gold_left"].is_null()));
    }

    #[test]
    fn test_empty_table_stays_empty() {
        let table = Table::new("unit", vec!["a".into()]);
        let projected = project(table, &Selection::Columns(vec!["a".into()]));
        assert!(projected.is_empty());
    }

    #[test]
    fn test_preset_deserialize_and_apply() {
        let preset: Preset = serde_json::from_value(json!({
            "participant": ["puuid"],
            "match": "__all__"
        }))
        .unwrap();

        assert_eq!(preset.selection("match"), Some(&Selection::All));

        let other = Table::new("trait", vec![]);
        let out = preset.apply(vec![sample_table(), other]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].columns, vec!["puuid"]);
    }

    #[test]
    fn test_preset_new_keeps_name() {
        let mut tables = IndexMap::new();
        tables.insert("participant".to_string(), Selection::All);
        let preset = Preset::new("full", tables);

        assert_eq!(preset.name, "full");
        assert_eq!(preset.table_names().collect::<Vec<_>>(), vec!["participant"]);
        assert_eq!(preset.apply(vec![sample_table()])[0], sample_table());
    }

    #[test]
    fn test_bad_keyword_rejected() {
        let result: Result<Preset, _> = serde_json::from_value(json!({"match": "__some__"}));
        assert!(result.is_err());
    }
}
