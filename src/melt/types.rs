use serde::Serialize;
use serde_json::{Map, Value};

/// One output row: column name -> scalar value, in column order
pub type Row = Map<String, Value>;

/// A table accumulated from one extraction rule - represents one CSV artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    /// The table name, e.g., "participant", "unit"
    pub name: String,

    /// Column order as declared by the rule that produced this table
    pub columns: Vec<String>,

    /// Rows in extraction order
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Table {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column across all rows (`Null` where the row lacks it)
    pub fn column_values(&self, column: &str) -> Vec<&Value> {
        self.rows
            .iter()
            .map(|row| row.get(column).unwrap_or(&Value::Null))
            .collect()
    }
}
