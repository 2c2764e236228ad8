//! Document sources
//!
//! A source is any iterator of [`DocumentResult`]: a parsed document, or the
//! error that kept one document from being produced. Sources never abort on a
//! single bad document.

use crate::error::{DocumentError, DocumentErrorKind};
use serde_json::Value;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

pub type DocumentResult = Result<SourceDocument, DocumentError>;

/// A parsed input document and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub label: String,
    pub value: Value,
}

impl SourceDocument {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        SourceDocument {
            label: label.into(),
            value,
        }
    }
}

/// Parse one document with simd-json
pub fn parse_document(label: &str, mut bytes: Vec<u8>) -> DocumentResult {
    simd_json::serde::from_slice::<Value>(&mut bytes)
        .map(|value| SourceDocument::new(label, value))
        .map_err(|e| DocumentError::new(label, DocumentErrorKind::Parse(e.to_string())))
}

/// Every `*.json` file in a directory, in file name order
///
/// Symlinks to files are followed. Directory entries that cannot be read are
/// yielded as errors after the files.
pub struct DirectorySource {
    entries: std::vec::IntoIter<Result<PathBuf, DocumentError>>,
}

impl DirectorySource {
    pub fn open<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let mut files = Vec::new();
        let mut failures = Vec::new();

        for entry in fs::read_dir(dir.as_ref())? {
            match entry {
                Ok(e) => files.push(e.path()),
                Err(e) => failures.push(DocumentError::new(
                    dir.as_ref().display().to_string(),
                    DocumentErrorKind::Read(e),
                )),
            }
        }

        files.retain(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json"));
        files.sort();

        let entries: Vec<_> = files
            .into_iter()
            .map(Ok)
            .chain(failures.into_iter().map(Err))
            .collect();

        Ok(DirectorySource {
            entries: entries.into_iter(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl Iterator for DirectorySource {
    type Item = DocumentResult;

    fn next(&mut self) -> Option<Self::Item> {
        let path = match self.entries.next()? {
            Ok(path) => path,
            Err(e) => return Some(Err(e)),
        };
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Some(match fs::read(&path) {
            Ok(bytes) => parse_document(&label, bytes),
            Err(e) => Err(DocumentError::new(label, DocumentErrorKind::Read(e))),
        })
    }
}

/// One document per line of a reader; blank lines are skipped
///
/// A read error is yielded once and ends the source.
pub struct NdjsonSource<R: BufRead> {
    lines: io::Lines<R>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> NdjsonSource<R> {
    pub fn new(reader: R) -> Self {
        NdjsonSource {
            lines: reader.lines(),
            line_no: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for NdjsonSource<R> {
    type Item = DocumentResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let Some(line) = self.lines.next() else {
                self.done = true;
                return None;
            };
            self.line_no += 1;
            let label = format!("line {}", self.line_no);

            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => return Some(parse_document(&label, line.into_bytes())),
                Err(e) => {
                    self.done = true;
                    return Some(Err(DocumentError::new(label, DocumentErrorKind::Read(e))));
                }
            }
        }
    }
}
