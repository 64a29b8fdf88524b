//! # poa-csv - EJP CSV exports to article records
//!
//! poa-csv reads the "publish on acceptance" CSV reports of the EJP
//! manuscript system and assembles one normalized article record per
//! manuscript: title, abstract, authors, editor, funding, dates, license,
//! ethics statements, datasets, keywords, categories and organisms.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV tables │────▶│   Parser    │────▶│ TableStore  │────▶│  Pipeline   │────▶ Article
//! │ (13 files)  │     │ (overflow)  │     │  (indexes)  │     │   (steps)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                  │
//!                                               payload / group_authors decoders
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use poa_csv::{build_article, Settings, TableStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = TableStore::new(Settings::with_csv_path("csv_data/"));
//!     let outcome = build_article(&store, 21598u32)?;
//!     if let Some(article) = outcome.article {
//!         println!("{}", article.title.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`config`] - Table configuration and settings
//! - [`logs`] - Log helpers
//! - [`models`] - Output record
//! - [`parser`] - Table loader
//! - [`store`] - Column lookup, indexes and getters
//! - [`text`] - Entity and markup cleanup
//! - [`payload`] - Escaped pseudo-XML decoder
//! - [`group_authors`] - Group-author decoder
//! - [`transform`] - Assembly pipeline

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Loading and lookup
pub mod parser;
pub mod store;

// Decoding
pub mod group_authors;
pub mod payload;
pub mod text;

// Assembly
pub mod transform;

// =============================================================================
// Re-exports - Errors and configuration
// =============================================================================

pub use config::{Field, Settings, TableKind};
pub use error::{ConfigError, DataError, DecodeError, TableError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Affiliation,
    Article,
    ArticleDate,
    Contributor,
    ContributorRole,
    DatasetEntry,
    DatasetGroup,
    DateType,
    FundingAward,
    License,
};

// =============================================================================
// Re-exports - Loading and lookup
// =============================================================================

pub use parser::{decode_content, detect_encoding, load_table, Row};
pub use store::{cell, FundingKey, ManuscriptId, Table, TableStore};

// =============================================================================
// Re-exports - Decoders
// =============================================================================

pub use group_authors::{parse_group_authors, GroupAuthors};
pub use payload::{parse_datasets, parse_ethics, Sentinels};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{build_article, build_articles, BuildOutcome, STEPS};
