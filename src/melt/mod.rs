//! Match melting - project nested match documents into relational tables
//!
//! Every table is an [`ExtractionRule`]: an anchor path locating the repeated
//! items, and columns reading from the root, the enclosing item, the item
//! itself, a joined list, or a caller-supplied value.
//!
//! ## Pipeline
//!
//! documents -> [`TableBuilder`] (runs [`RowExtractor`] per rule) ->
//! [`Preset::apply`] -> [`TableWriter`]

pub mod types;
pub mod path;
pub mod identifier;
pub mod rules;
pub mod extractor;
pub mod builder;
pub mod preset;
pub mod writer;

pub use types::{Row, Table};
pub use path::{DocPath, Match, Segment};
pub use identifier::normalize;
pub use rules::{Column, ExtractionRule, FieldSource, MeltConfig, RuleSet};
pub use extractor::{Externals, RowExtractor};
pub use builder::{build, Batch, TableBuilder};
pub use preset::{project, Preset, Selection, ALL_COLUMNS};
pub use writer::{render_csv, TableWriter};
