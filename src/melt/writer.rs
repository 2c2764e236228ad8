use crate::error::WriteError;
use crate::melt::types::{Row, Table};
use serde_json::Value;
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes tables as CSV files, one per table, inside a partition directory
pub struct TableWriter {
    root: PathBuf,
    dir_prefix: String,
}

impl TableWriter {
    /// Artifacts land in `{root}/matches_{partition}/{table}.csv`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        TableWriter {
            root: root.as_ref().to_path_buf(),
            dir_prefix: String::from("matches_"),
        }
    }

    pub fn with_dir_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.dir_prefix = prefix.into();
        self
    }

    pub fn partition_dir(&self, partition: &str) -> PathBuf {
        self.root.join(format!("{}{}", self.dir_prefix, partition))
    }

    /// Write one table. Empty tables produce no file and return `None`.
    pub fn write(&self, partition: &str, table: &Table) -> Result<Option<PathBuf>, WriteError> {
        if table.is_empty() {
            tracing::debug!(table = %table.name, "no rows, skipping");
            return Ok(None);
        }

        let dir = self.partition_dir(partition);
        fs::create_dir_all(&dir).map_err(|source| WriteError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let target = dir.join(format!("{}.csv", table.name));
        write_atomic(&dir, &target, &render_csv(&table.rows)).map_err(|source| WriteError::Write {
            path: target.clone(),
            source,
        })?;

        tracing::debug!(table = %table.name, rows = table.len(), path = %target.display(), "wrote table");
        Ok(Some(target))
    }

    /// Write every non-empty table, stopping at the first failure.
    /// Files already written stay in place.
    pub fn write_all(&self, partition: &str, tables: &[Table]) -> Result<Vec<PathBuf>, WriteError> {
        let mut written = Vec::new();
        for table in tables {
            if let Some(path) = self.write(partition, table)? {
                written.push(path);
            }
        }
        Ok(written)
    }
}

fn write_atomic(dir: &Path, target: &Path, content: &str) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;

    if target.exists() {
        fs::remove_file(target)?;
    }
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Render rows as CSV. Column order comes from the first row.
pub fn render_csv(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let columns: Vec<&String> = first.keys().collect();

    let mut output = String::new();
    let header: Vec<String> = columns.iter().map(|c| escape_csv(c)).collect();
    output.push_str(&header.join(","));
    output.push('\n');

    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|c| escape_csv(&cell(row.get(c.as_str()).unwrap_or(&Value::Null))))
            .collect();
        output.push_str(&values.join(","));
        output.push('\n');
    }

    output
}

fn cell(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
