//! Typed lookup indexes over loaded tables.
//!
//! | Index | Key | Duplicate key |
//! |---|---|---|
//! | [`ArticleIndex`] | manuscript | rows appended in table order |
//! | [`AuthorIndex`] | manuscript, author | last row wins, first slot kept |
//! | [`FundingIndex`] | manuscript, author, funder position | last row wins, first slot kept |
//!
//! Each index is built in one pass. Rows too short to hold a key column are
//! skipped with a warning.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::{cell, ManuscriptId, Table};
use crate::error::{DataError, DataResult};
use crate::logs::log_warning;
use crate::parser::Row;

/// Position of `header` in `columns`.
pub(crate) fn column_position(header: &str, columns: &[String]) -> DataResult<usize> {
    columns
        .iter()
        .position(|c| c == header)
        .ok_or_else(|| DataError::FieldNotFound {
            field: header.to_string(),
        })
}

/// Key cell of `row`, trimmed, or `None` when the row is too short.
fn key_cell<'r>(header: &str, columns: &[String], row: &'r [String]) -> DataResult<Option<&'r str>> {
    match cell(header, columns, row) {
        Ok(value) => Ok(Some(value.trim())),
        Err(DataError::MissingCell { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

// =============================================================================
// Article Index
// =============================================================================

/// Manuscript -> data rows, in table order.
#[derive(Debug, Default)]
pub struct ArticleIndex {
    rows: IndexMap<ManuscriptId, Vec<Row>>,
}

impl ArticleIndex {
    /// Group the data rows of `table` by the `id_header` column.
    pub fn build(table: &Table, id_header: &str) -> DataResult<Self> {
        column_position(id_header, &table.columns)?;

        let mut rows: IndexMap<ManuscriptId, Vec<Row>> = IndexMap::new();
        for row in &table.rows {
            let Some(id) = key_cell(id_header, &table.columns, row)? else {
                log_warning(format!("Skipping short row in '{}' table", table.kind));
                continue;
            };
            rows.entry(ManuscriptId::from(id)).or_default().push(row.clone());
        }
        Ok(Self { rows })
    }

    /// Rows of a manuscript; empty when it has none.
    pub fn rows(&self, id: &str) -> &[Row] {
        self.rows.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Manuscript ids in first-seen order.
    pub fn ids(&self) -> impl Iterator<Item = &ManuscriptId> {
        self.rows.keys()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Author Index
// =============================================================================

/// Manuscript -> author id -> row.
#[derive(Debug, Default)]
pub struct AuthorIndex {
    authors: IndexMap<ManuscriptId, IndexMap<String, Row>>,
}

impl AuthorIndex {
    /// Re-key the author rows of every manuscript by author id.
    pub fn build(articles: &ArticleIndex, columns: &[String], author_header: &str) -> DataResult<Self> {
        column_position(author_header, columns)?;

        let mut authors = IndexMap::new();
        for (id, rows) in &articles.rows {
            let mut by_author: IndexMap<String, Row> = IndexMap::new();
            for row in rows {
                let Some(author_id) = key_cell(author_header, columns, row)? else {
                    log_warning(format!("Skipping author row without id for manuscript {}", id));
                    continue;
                };
                by_author.insert(author_id.to_string(), row.clone());
            }
            authors.insert(id.clone(), by_author);
        }
        Ok(Self { authors })
    }

    pub fn get(&self, manuscript: &str, author_id: &str) -> Option<&Row> {
        self.authors.get(manuscript)?.get(author_id.trim())
    }

    /// Distinct author ids of a manuscript in first-seen order.
    pub fn author_ids(&self, manuscript: &str) -> Vec<&str> {
        self.authors
            .get(manuscript)
            .map(|authors| authors.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

// =============================================================================
// Funding Index
// =============================================================================

/// Identity of one funding row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FundingKey {
    pub manuscript_id: ManuscriptId,
    pub author_id: String,
    pub funder_position: String,
}

impl FundingKey {
    pub fn new(
        manuscript_id: impl Into<ManuscriptId>,
        author_id: impl Into<String>,
        funder_position: impl Into<String>,
    ) -> Self {
        Self {
            manuscript_id: manuscript_id.into(),
            author_id: author_id.into(),
            funder_position: funder_position.into(),
        }
    }
}

impl fmt::Display for FundingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.manuscript_id, self.author_id, self.funder_position
        )
    }
}

type FunderRows = IndexMap<String, Row>;

/// Manuscript -> author id -> funder position -> row.
#[derive(Debug, Default)]
pub struct FundingIndex {
    entries: IndexMap<ManuscriptId, IndexMap<String, FunderRows>>,
}

/// Header text of the three key columns of the funding table.
pub struct FundingHeaders<'a> {
    pub manuscript: &'a str,
    pub author: &'a str,
    pub position: &'a str,
}

impl FundingIndex {
    pub fn build(table: &Table, headers: &FundingHeaders<'_>) -> DataResult<Self> {
        for header in [headers.manuscript, headers.author, headers.position] {
            column_position(header, &table.columns)?;
        }

        let mut entries: IndexMap<ManuscriptId, IndexMap<String, FunderRows>> = IndexMap::new();
        for row in &table.rows {
            let manuscript = key_cell(headers.manuscript, &table.columns, row)?;
            let author = key_cell(headers.author, &table.columns, row)?;
            let position = key_cell(headers.position, &table.columns, row)?;
            let (Some(manuscript), Some(author), Some(position)) = (manuscript, author, position)
            else {
                log_warning("Skipping short row in 'funding' table");
                continue;
            };

            entries
                .entry(ManuscriptId::from(manuscript))
                .or_default()
                .entry(author.to_string())
                .or_default()
                .insert(position.to_string(), row.clone());
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &FundingKey) -> Option<&Row> {
        self.entries
            .get(&key.manuscript_id)?
            .get(&key.author_id)?
            .get(&key.funder_position)
    }

    /// Every key of a manuscript, grouped by author, in table order.
    pub fn keys_for(&self, manuscript: &ManuscriptId) -> Vec<FundingKey> {
        let Some(authors) = self.entries.get(manuscript) else {
            return Vec::new();
        };
        authors
            .iter()
            .flat_map(|(author, positions)| {
                positions
                    .keys()
                    .map(move |position| FundingKey::new(manuscript.clone(), author.clone(), position.clone()))
            })
            .collect()
    }

    /// Manuscript ids in first-seen order.
    pub fn manuscript_ids(&self) -> impl Iterator<Item = &ManuscriptId> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableKind;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            kind: TableKind::Authors,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_article_index_appends() {
        let t = table(
            &["poa_m_ms_no", "poa_s_subjectarea"],
            &[&["7", "Ecology"], &["3", "Cell Biology"], &["7", "Plant Biology"]],
        );
        let index = ArticleIndex::build(&t, "poa_m_ms_no").unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.rows("7").len(), 2);
        assert_eq!(index.rows("7")[1][1], "Plant Biology");
        assert!(index.rows("99999").is_empty());
        let ids: Vec<&str> = index.ids().map(ManuscriptId::as_str).collect();
        assert_eq!(ids, vec!["7", "3"]);
    }

    #[test]
    fn test_article_index_missing_column() {
        let t = table(&["poa_m_ms_id"], &[&["1"]]);
        assert!(matches!(
            ArticleIndex::build(&t, "poa_m_ms_no"),
            Err(DataError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_article_index_skips_short_rows() {
        let t = table(&["poa_m_ms_id", "poa_m_ms_no"], &[&["1"], &["2", "3"]]);
        let index = ArticleIndex::build(&t, "poa_m_ms_no").unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_author_index_last_wins() {
        let columns = ["poa_m_ms_no", "poa_a_id", "poa_a_last_nm"];
        let t = table(
            &columns,
            &[&["12717", "13728", "Draft"], &["12717", "13727", "Kavalali"], &["12717", "13728", "Nosyreva"]],
        );
        let articles = ArticleIndex::build(&t, "poa_m_ms_no").unwrap();
        let authors = AuthorIndex::build(&articles, &t.columns, "poa_a_id").unwrap();

        assert_eq!(articles.rows("12717").len(), 3);
        assert_eq!(authors.get("12717", "13728").unwrap()[2], "Nosyreva");
        assert_eq!(authors.author_ids("12717"), vec!["13728", "13727"]);
        assert!(authors.get("12717", "1").is_none());
    }

    #[test]
    fn test_funding_index_keys() {
        let t = table(
            &["poa_m_ms_no", "poa_a_id", "poa_funder_order", "poa_funder"],
            &[
                &["12717", "13727", "1", "NINDS"],
                &["7", "1399", "1", "NSF"],
                &["12717", "13727", "2", "HHMI"],
                &["12717", "13727", "1", "NINDS (updated)"],
            ],
        );
        let headers = FundingHeaders {
            manuscript: "poa_m_ms_no",
            author: "poa_a_id",
            position: "poa_funder_order",
        };
        let index = FundingIndex::build(&t, &headers).unwrap();

        let keys = index.keys_for(&ManuscriptId::from("12717"));
        assert_eq!(
            keys,
            vec![
                FundingKey::new("12717", "13727", "1"),
                FundingKey::new("12717", "13727", "2"),
            ]
        );
        assert_eq!(index.get(&keys[0]).unwrap()[3], "NINDS (updated)");
        let ids: Vec<&str> = index.manuscript_ids().map(ManuscriptId::as_str).collect();
        assert_eq!(ids, vec!["12717", "7"]);
    }
}
