//! # tft-melt - Match Table Extraction
//!
//! Flattens nested match documents into a handful of relational CSV tables.
//! Tables are declared as data (see `config/tft.json`): each names an anchor
//! path such as `info.participants[].units[]` and the columns read around it.
//!
//! ## Quick Start
//!
//! ```rust
//! use tft_melt::melt::{build, Externals, RuleSet};
//! use tft_melt::source::SourceDocument;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rules = RuleSet::builtin()?;
//! let doc = json!({
//!     "metadata": {"match_id": "NA1_5012"},
//!     "info": {"participants": [
//!         {"puuid": "p1", "units": [{"character_id": "TFT14_Ahri", "itemNames": []}]}
//!     ]}
//! });
//!
//! let batch = build(vec![Ok(SourceDocument::new("m1", doc))], &rules, Externals::new());
//! let tables = rules.preset("default")?.apply(batch.tables);
//!
//! // tables: match, participant, unit, trait; unit rows carry puuid "p1"
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub mod error;
pub mod melt;
pub mod source;

pub use error::{ConfigError, DocumentError, DocumentErrorKind, WriteError};
pub use melt::{Batch, Externals, Preset, RuleSet, Table, TableBuilder, TableWriter};
pub use source::{DirectorySource, DocumentResult, NdjsonSource, SourceDocument};

/// What one run wrote
#[derive(Debug)]
pub struct MeltSummary {
    pub partition: String,
    pub written: Vec<PathBuf>,
    pub documents_accepted: usize,
    pub errors: Vec<DocumentError>,
}

/// Main entry point: build, project and write every table for one batch
pub fn melt_documents<I>(
    documents: I,
    rules: &RuleSet,
    preset: &str,
    externals: Externals,
    output_dir: &Path,
) -> Result<MeltSummary>
where
    I: IntoIterator<Item = DocumentResult>,
{
    let preset = rules.preset(preset)?;
    let batch = melt::build(documents, rules, externals);
    let tables = preset.apply(batch.tables);

    let writer = TableWriter::new(output_dir);
    let written = writer
        .write_all(&batch.partition, &tables)
        .context("Failed to write tables")?;

    Ok(MeltSummary {
        partition: batch.partition,
        written,
        documents_accepted: batch.documents_accepted,
        errors: batch.errors,
    })
}

/// Melt every `*.json` file of a directory
pub fn melt_directory(
    input_dir: &Path,
    rules: &RuleSet,
    preset: &str,
    externals: Externals,
    output_dir: &Path,
) -> Result<MeltSummary> {
    let source = DirectorySource::open(input_dir)
        .with_context(|| format!("Failed to read input directory {}", input_dir.display()))?;
    melt_documents(source, rules, preset, externals, output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_preset_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::builtin().unwrap();
        let doc = json!({"metadata": {"match_id": "NA1_1"}, "info": {"participants": []}});

        let result = melt_documents(
            vec![Ok(SourceDocument::new("a", doc))],
            &rules,
            "nope",
            Externals::new(),
            dir.path(),
        );

        assert!(result.is_err());
        assert!(!dir.path().join("matches_NA1").exists());
    }
}
