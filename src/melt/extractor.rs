//! Rule-driven row extraction
//!
//! For one rule, the anchor is resolved against the document and one row is
//! built per match. Every column is evaluated on its own; a miss yields
//! `null` for that column and never affects its siblings.

use crate::melt::identifier::{normalize, normalize_value};
use crate::melt::path::{self, DocPath, Match};
use crate::melt::rules::{Column, ExtractionRule, FieldSource};
use crate::melt::types::Row;
use serde_json::Value;
use std::collections::HashMap;

/// Out-of-band values offered to `external` columns
pub type Externals = HashMap<String, Value>;

/// Extracts rows from documents, resolving `external` columns from its own values
#[derive(Debug, Clone, Default)]
pub struct RowExtractor {
    externals: Externals,
}

impl RowExtractor {
    pub fn new(externals: Externals) -> Self {
        RowExtractor { externals }
    }

    /// Offer a value under `name` unless one is already present
    pub fn offer_external(&mut self, name: &str, value: Value) {
        self.externals.entry(name.to_string()).or_insert(value);
    }

    /// One row per item the rule's anchor matches in `document`
    pub fn extract(&self, document: &Value, rule: &ExtractionRule) -> Vec<Row> {
        path::resolve(document, &rule.anchor)
            .iter()
            .map(|matched| {
                rule.columns
                    .iter()
                    .map(|column| (column.name.clone(), self.evaluate(document, matched, column)))
                    .collect::<Row>()
            })
            .collect()
    }

    fn evaluate(&self, document: &Value, matched: &Match<'_>, column: &Column) -> Value {
        let value = match &column.source {
            FieldSource::Root(p) => read(Some(document), p),
            FieldSource::Parent(p) => read(matched.enclosing, p),
            FieldSource::Local(p) => read(Some(matched.node), p),
            FieldSource::Join { path: p, separator } => {
                return join_list(
                    path::lookup(matched.node, p),
                    separator,
                    column.identifier,
                );
            }
            FieldSource::External(name) => self.externals.get(name).cloned().unwrap_or(Value::Null),
            FieldSource::Ordinal => matched.ordinal.map(Value::from).unwrap_or(Value::Null),
        };

        if column.identifier {
            normalize_value(value)
        } else {
            value
        }
    }
}

fn read(start: Option<&Value>, p: &DocPath) -> Value {
    start
        .and_then(|v| path::lookup(v, p))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Collapse a list of strings into one delimited value; anything but a list yields ""
fn join_list(value: Option<&Value>, separator: &str, identifier: bool) -> Value {
    let Some(Value::Array(items)) = value else {
        return Value::String(String::new());
    };

    let parts: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(|s| if identifier { normalize(Some(s)) } else { s.to_string() })
        .collect();

    Value::String(parts.join(separator))
}
