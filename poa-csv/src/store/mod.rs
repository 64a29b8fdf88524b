//! Table store: loaded tables, column lookup and memoized indexes.
//!
//! [`TableStore`] owns every cache for one session. Tables and indexes are
//! built on first use and reused until [`TableStore::reset`]:
//!
//! ```text
//! load_table ──▶ Table ──┬──▶ columns_for
//!                        ├──▶ rows_by_id ──▶ authors_by_id_and_author
//!                        └──▶ funding_index
//! ```
//!
//! The store is single-threaded (`RefCell` / `Rc`).

mod accessors;
pub mod index;

use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use serde::Serialize;

use crate::config::{Field, Settings, TableKind};
use crate::error::{DataError, DataResult, TableError, TableResult};
use crate::logs::log_info;
use crate::parser::{load_table, Row};

pub use index::{ArticleIndex, AuthorIndex, FundingHeaders, FundingIndex, FundingKey};

// =============================================================================
// Manuscript Id
// =============================================================================

/// Canonical (trimmed) manuscript number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ManuscriptId(String);

impl ManuscriptId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ManuscriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ManuscriptId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ManuscriptId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ManuscriptId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&String> for ManuscriptId {
    fn from(id: &String) -> Self {
        Self::new(id)
    }
}

impl From<u32> for ManuscriptId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for ManuscriptId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for ManuscriptId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// Tables
// =============================================================================

/// Value of the `field` column in `row`.
pub fn cell<'r>(field: &str, columns: &[String], row: &'r [String]) -> DataResult<&'r str> {
    let position = index::column_position(field, columns)?;
    row.get(position)
        .map(String::as_str)
        .ok_or_else(|| DataError::MissingCell {
            field: field.to_string(),
            position,
        })
}

/// A loaded table: header row and data rows.
#[derive(Debug, Clone)]
pub struct Table {
    pub kind: TableKind,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Split raw rows into the header at `header_row` and data from
    /// `data_start_row` onward.
    pub fn from_rows(
        kind: TableKind,
        mut rows: Vec<Row>,
        header_row: usize,
        data_start_row: usize,
    ) -> TableResult<Self> {
        let columns = rows
            .get(header_row)
            .cloned()
            .ok_or(TableError::MissingHeaderRow {
                table: kind,
                row: header_row,
            })?;
        let data = if data_start_row < rows.len() {
            rows.split_off(data_start_row)
        } else {
            Vec::new()
        };
        Ok(Self {
            kind,
            columns,
            rows: data,
        })
    }
}

// =============================================================================
// Table Store
// =============================================================================

/// Session cache of tables and indexes.
pub struct TableStore {
    settings: Settings,
    tables: RefCell<HashMap<TableKind, Rc<Table>>>,
    article_indexes: RefCell<HashMap<TableKind, Rc<ArticleIndex>>>,
    author_index: OnceCell<Rc<AuthorIndex>>,
    funding_index: OnceCell<Rc<FundingIndex>>,
}

impl TableStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            tables: RefCell::new(HashMap::new()),
            article_indexes: RefCell::new(HashMap::new()),
            author_index: OnceCell::new(),
            funding_index: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load every table and build every index up front.
    pub fn warm(&self) -> DataResult<()> {
        for kind in TableKind::ALL {
            self.rows_by_id(kind)?;
        }
        self.authors_by_id_and_author()?;
        self.funding_index()?;
        log_info(format!("Warmed {} tables", TableKind::ALL.len()));
        Ok(())
    }

    /// Drop every cached table and index.
    pub fn reset(&mut self) {
        self.tables.get_mut().clear();
        self.article_indexes.get_mut().clear();
        self.author_index.take();
        self.funding_index.take();
    }

    /// Loaded table, read from disk on first use.
    pub fn table(&self, kind: TableKind) -> TableResult<Rc<Table>> {
        if let Some(table) = self.tables.borrow().get(&kind) {
            return Ok(Rc::clone(table));
        }

        let rows = load_table(&self.settings, kind)?;
        let table = Rc::new(Table::from_rows(
            kind,
            rows,
            self.settings.header_row,
            self.settings.data_start_row,
        )?);
        log_info(format!(
            "Loaded table '{}': {} columns, {} rows",
            kind,
            table.columns.len(),
            table.rows.len()
        ));

        self.tables.borrow_mut().insert(kind, Rc::clone(&table));
        Ok(table)
    }

    /// Column headings of a table.
    pub fn columns_for(&self, kind: TableKind) -> TableResult<Vec<String>> {
        Ok(self.table(kind)?.columns.clone())
    }

    /// Data rows of a table grouped by manuscript.
    pub fn rows_by_id(&self, kind: TableKind) -> DataResult<Rc<ArticleIndex>> {
        if let Some(index) = self.article_indexes.borrow().get(&kind) {
            return Ok(Rc::clone(index));
        }

        let table = self.table(kind)?;
        let index = Rc::new(ArticleIndex::build(
            &table,
            self.settings.column(Field::ManuscriptNumber),
        )?);

        self.article_indexes.borrow_mut().insert(kind, Rc::clone(&index));
        Ok(index)
    }

    /// Author rows keyed by manuscript and author id.
    pub fn authors_by_id_and_author(&self) -> DataResult<Rc<AuthorIndex>> {
        self.author_index
            .get_or_try_init(|| -> DataResult<Rc<AuthorIndex>> {
                let table = self.table(TableKind::Authors)?;
                let articles = self.rows_by_id(TableKind::Authors)?;
                let index = AuthorIndex::build(
                    &articles,
                    &table.columns,
                    self.settings.column(Field::AuthorId),
                )?;
                Ok(Rc::new(index))
            })
            .map(Rc::clone)
    }

    /// Funding rows keyed by manuscript, author id and funder position.
    pub fn funding_index(&self) -> DataResult<Rc<FundingIndex>> {
        self.funding_index
            .get_or_try_init(|| -> DataResult<Rc<FundingIndex>> {
                let table = self.table(TableKind::Funding)?;
                let headers = FundingHeaders {
                    manuscript: self.settings.column(Field::ManuscriptNumber),
                    author: self.settings.column(Field::AuthorId),
                    position: self.settings.column(Field::FunderPosition),
                };
                Ok(Rc::new(FundingIndex::build(&table, &headers)?))
            })
            .map(Rc::clone)
    }

    /// Funding keys of a manuscript.
    pub fn funding_ids(&self, id: &ManuscriptId) -> DataResult<Vec<FundingKey>> {
        Ok(self.funding_index()?.keys_for(id))
    }

    /// Values of the `header` column over every row of the manuscript, in row
    /// order. Empty when the manuscript has no rows.
    pub fn attributes_for(
        &self,
        id: &ManuscriptId,
        kind: TableKind,
        header: &str,
    ) -> DataResult<Vec<String>> {
        let index = self.rows_by_id(kind)?;
        let table = self.table(kind)?;
        index
            .rows(id.as_str())
            .iter()
            .map(|row| cell(header, &table.columns, row).map(str::to_string))
            .collect()
    }

    /// [`attributes_for`](Self::attributes_for) with the header resolved
    /// from `field`.
    pub fn attribute_values(
        &self,
        id: &ManuscriptId,
        kind: TableKind,
        field: Field,
    ) -> DataResult<Vec<String>> {
        self.attributes_for(id, kind, self.settings.column(field))
    }

    /// Manuscript ids present in a table.
    pub fn manuscript_ids(&self, kind: TableKind) -> DataResult<Vec<ManuscriptId>> {
        Ok(self.rows_by_id(kind)?.ids().cloned().collect())
    }
}
