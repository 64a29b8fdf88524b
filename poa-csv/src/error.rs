//! Error types for the manuscript assembly pipeline.
//!
//! - [`TableError`] - a source table could not be loaded (fatal to a run)
//! - [`DecodeError`] - a packed pseudo-XML cell could not be decoded
//! - [`DataError`] - lookup, accessor and value errors raised inside a build step
//! - [`ConfigError`] - settings file errors
//!
//! Conversion into [`DataError`] is automatic via `From`, so `?` works from
//! the loader and the decoders up to the step boundary.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::TableKind;

// =============================================================================
// Table Loading Errors
// =============================================================================

/// Errors while loading a source table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The backing file is missing or unreadable.
    #[error("Source table '{table}' unavailable at {}: {source}", path.display())]
    SourceUnavailable {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file.
    #[error("Invalid CSV in table '{table}': {source}")]
    Csv {
        table: TableKind,
        #[source]
        source: csv::Error,
    },

    /// The file ends before the configured header row.
    #[error("Table '{table}' has no header row at index {row}")]
    MissingHeaderRow { table: TableKind, row: usize },
}

// =============================================================================
// Payload Decoding Errors
// =============================================================================

/// Errors while decoding an escaped pseudo-XML payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Nothing but whitespace, comments or declarations.
    #[error("Payload contains no element")]
    EmptyDocument,

    /// Input ended while elements were still open.
    #[error("Unexpected end of payload, <{open}> is not closed")]
    UnexpectedEof { open: String },

    /// A closing tag does not match the innermost open element.
    #[error("Mismatched tag at offset {offset}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        expected: String,
        found: String,
        offset: usize,
    },

    /// A closing tag with no open element.
    #[error("Unexpected closing tag </{found}> at offset {offset}")]
    UnexpectedCloseTag { found: String, offset: usize },

    /// Markup that is not a tag, comment or declaration.
    #[error("Malformed markup at offset {offset}: {message}")]
    Malformed { offset: usize, message: String },

    /// Unknown or invalid entity reference.
    #[error("Invalid entity reference '&{entity};'")]
    InvalidEntity { entity: String },

    /// Text or a second element after the root element closed.
    #[error("Content after the root element at offset {offset}")]
    TrailingContent { offset: usize },

    /// A required element is absent.
    #[error("Payload has no <{0}> element")]
    MissingElement(String),
}

// =============================================================================
// Data Errors
// =============================================================================

/// Errors raised while reading indexed data for one manuscript.
#[derive(Debug, Error)]
pub enum DataError {
    /// Source table failure, propagated out of the pipeline untouched.
    #[error(transparent)]
    Table(#[from] TableError),

    /// Column name absent from a table header.
    #[error("Field '{field}' not found in table columns")]
    FieldNotFound { field: String },

    /// Row shorter than the column position of a field.
    #[error("Row has no value for field '{field}' at position {position}")]
    MissingCell { field: String, position: usize },

    /// No row for a requested key.
    #[error("No '{table}' row for {key}")]
    LookupMiss { table: TableKind, key: String },

    /// Packed payload could not be decoded.
    #[error("Payload decode error: {0}")]
    Payload(#[from] DecodeError),

    /// A cell value could not be interpreted.
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl DataError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn miss(table: TableKind, key: impl Into<String>) -> Self {
        Self::LookupMiss {
            table,
            key: key.into(),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table loading.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for payload decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for data access and build steps.
pub type DataResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let decode_err = DecodeError::MissingElement("human_subjects".into());
        let data_err: DataError = decode_err.into();
        assert!(data_err.to_string().contains("human_subjects"));

        let table_err = TableError::MissingHeaderRow {
            table: TableKind::License,
            row: 3,
        };
        let data_err: DataError = table_err.into();
        assert!(matches!(data_err, DataError::Table(_)));
        assert!(data_err.to_string().contains("license"));
    }

    #[test]
    fn test_lookup_miss_format() {
        let err = DataError::miss(TableKind::Title, "manuscript 99999");
        let msg = err.to_string();
        assert!(msg.contains("'title'"));
        assert!(msg.contains("99999"));
    }
}
