//! Batch orchestration
//!
//! The builder runs every rule against every accepted document, appending rows
//! to one accumulator per table. It derives the partition key once, from the
//! first accepted document, and collects per-document errors instead of
//! aborting the batch.

use crate::error::{DocumentError, DocumentErrorKind};
use crate::melt::extractor::{Externals, RowExtractor};
use crate::melt::path;
use crate::melt::rules::{Partition, RuleSet};
use crate::melt::types::Table;
use crate::source::SourceDocument;
use serde_json::Value;

/// Everything one batch produced
#[derive(Debug)]
pub struct Batch {
    /// Partition key shared by every table of this batch
    pub partition: String,

    /// One table per rule, in rule declaration order
    pub tables: Vec<Table>,

    /// Documents that were skipped, in input order
    pub errors: Vec<DocumentError>,

    pub documents_accepted: usize,
}

impl Batch {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn documents_skipped(&self) -> usize {
        self.errors.len()
    }
}

/// Accumulates tables across the documents of one batch
pub struct TableBuilder<'r> {
    rules: &'r RuleSet,
    extractor: RowExtractor,
    tables: Vec<Table>,
    partition: Option<String>,
    errors: Vec<DocumentError>,
    accepted: usize,
}

impl<'r> TableBuilder<'r> {
    pub fn new(rules: &'r RuleSet, externals: Externals) -> Self {
        let tables = rules
            .rules
            .iter()
            .map(|r| Table::new(r.table.clone(), r.column_names()))
            .collect();

        TableBuilder {
            rules,
            extractor: RowExtractor::new(externals),
            tables,
            partition: None,
            errors: Vec::new(),
            accepted: 0,
        }
    }

    /// Feed one document, or the error the source hit producing it
    pub fn push(&mut self, document: Result<SourceDocument, DocumentError>) {
        let document = match document.and_then(|d| self.check_shape(d)) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "skipping document");
                self.errors.push(e);
                return;
            }
        };

        if self.partition.is_none() {
            let key = partition_key(&document.value, &self.rules.partition);
            tracing::debug!(partition = %key, document = %document.label, "derived partition key");
            if let Some(name) = &self.rules.partition.external {
                self.extractor.offer_external(name, Value::String(key.clone()));
            }
            self.partition = Some(key);
        }

        for (rule, table) in self.rules.rules.iter().zip(self.tables.iter_mut()) {
            let rows = self.extractor.extract(&document.value, rule);
            table.rows.extend(rows);
        }

        self.accepted += 1;
        tracing::debug!(document = %document.label, "extracted document");
    }

    pub fn finish(self) -> Batch {
        let partition = self
            .partition
            .unwrap_or_else(|| self.rules.partition.fallback.clone());

        tracing::info!(
            partition = %partition,
            accepted = self.accepted,
            skipped = self.errors.len(),
            "batch complete"
        );

        Batch {
            partition,
            tables: self.tables,
            errors: self.errors,
            documents_accepted: self.accepted,
        }
    }

    fn check_shape(&self, document: SourceDocument) -> Result<SourceDocument, DocumentError> {
        let Some(obj) = document.value.as_object() else {
            return Err(DocumentError::new(document.label, DocumentErrorKind::NotAnObject));
        };

        if let Some(key) = self.rules.required_keys.iter().find(|k| !obj.contains_key(*k)) {
            return Err(DocumentError::new(
                document.label,
                DocumentErrorKind::MissingKey(key.clone()),
            ));
        }

        Ok(document)
    }
}

/// Build all configured tables from a sequence of documents
pub fn build<I>(documents: I, rules: &RuleSet, externals: Externals) -> Batch
where
    I: IntoIterator<Item = Result<SourceDocument, DocumentError>>,
{
    let mut builder = TableBuilder::new(rules, externals);
    for document in documents {
        builder.push(document);
    }
    builder.finish()
}

/// The part of the partition field before the first separator, or the fallback
pub fn partition_key(document: &Value, partition: &Partition) -> String {
    path::lookup(document, &partition.path)
        .and_then(Value::as_str)
        .and_then(|id| id.split_once(partition.separator))
        .map(|(head, _)| head)
        .filter(|head| !head.is_empty())
        .map_or_else(|| partition.fallback.clone(), str::to_string)
}
