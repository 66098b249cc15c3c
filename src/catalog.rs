//! Occupation catalog loaded from the O*NET "Occupation Data" export.
//!
//! Row position is the occupation's identity inside the vector index, so the
//! catalog is immutable once built.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occupation {
    /// Stable catalog key, e.g. `"11-1011.00"`.
    pub code: String,
    pub title: String,
    pub description: String,
}

impl Occupation {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Text handed to the embedding provider for this row.
    pub fn embedding_text(&self) -> String {
        format!("Title: {}; Description: {}", self.title, self.description)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rows: Vec<Occupation>,
    /// Lowercased `"{title} {description}"`, index-aligned with `rows`.
    search_text: Vec<String>,
}

impl Catalog {
    pub fn from_rows(rows: Vec<Occupation>) -> Self {
        let search_text = rows
            .iter()
            .map(|o| format!("{} {}", o.title, o.description).to_lowercase())
            .collect();
        Self { rows, search_text }
    }

    /// Load a tab-separated file with a `Code\tTitle\tDescription` header row.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog at {}", path.display()))?;
        let catalog = Self::parse_tsv(&contents)
            .with_context(|| format!("failed to parse catalog at {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn parse_tsv(contents: &str) -> Result<Self> {
        let mut rows = Vec::new();
        // Line 1 is the header.
        for (lineno, line) in contents.lines().enumerate().skip(1) {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.splitn(3, '\t');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(code), Some(title), Some(description)) => {
                    rows.push(Occupation::new(code.trim(), title.trim(), description.trim()));
                }
                _ => anyhow::bail!(
                    "line {}: expected 3 tab-separated fields (code, title, description)",
                    lineno + 1
                ),
            }
        }
        Ok(Self::from_rows(rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Occupation> {
        self.rows.get(row)
    }

    pub fn rows(&self) -> &[Occupation] {
        &self.rows
    }

    /// Lowercased title + description used for keyword containment.
    pub fn search_text(&self, row: usize) -> &str {
        self.search_text.get(row).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "O*NET-SOC Code\tTitle\tDescription\n\
        11-1011.00\tChief Executives\tDetermine and formulate policies.\n\
        \n\
        15-1252.00\tSoftware Developers\tResearch, design, and develop software.\r\n";

    #[test]
    fn parses_rows_and_skips_blank_lines() {
        let catalog = Catalog::parse_tsv(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().code, "11-1011.00");
        assert_eq!(catalog.get(1).unwrap().title, "Software Developers");
        assert_eq!(
            catalog.get(1).unwrap().description,
            "Research, design, and develop software."
        );
    }

    #[test]
    fn search_text_is_lowercased() {
        let catalog = Catalog::parse_tsv(SAMPLE).unwrap();
        assert_eq!(
            catalog.search_text(0),
            "chief executives determine and formulate policies."
        );
        assert_eq!(catalog.search_text(99), "");
    }

    #[test]
    fn short_line_is_an_error() {
        let err = Catalog::parse_tsv("Code\tTitle\tDescription\n11-1011.00\tChief Executives\n")
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn embedding_text_format() {
        let occ = Occupation::new("1", "Actors", "Play parts.");
        assert_eq!(occ.embedding_text(), "Title: Actors; Description: Play parts.");
    }

    #[test]
    fn load_missing_file_fails_with_path() {
        let err = Catalog::load("/definitely/not/here.tsv").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.tsv"));
    }
}
