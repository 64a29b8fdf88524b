//! Static table configuration.
//!
//! Where the exports live, which file backs each table, which row holds the
//! column headings, where data starts, which tables need the overflow repair
//! pass, and the literal header text behind every semantic [`Field`].
//!
//! Defaults match the EJP publish-on-acceptance export. A JSON settings file
//! only needs the keys it overrides:
//!
//! ```json
//! {
//!   "csv_path": "/data/ejp/",
//!   "columns": { "orcid": "poa_a_orcid_id" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::payload::Sentinels;

/// Environment variable naming a JSON settings file.
pub const SETTINGS_ENV: &str = "POA_CSV_SETTINGS";

/// Environment variable overriding the CSV base path.
pub const CSV_PATH_ENV: &str = "POA_CSV_PATH";

// =============================================================================
// Table Kinds
// =============================================================================

/// One of the exported tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Authors,
    Funding,
    Manuscript,
    Title,
    Abstract,
    Received,
    License,
    Subjects,
    Organisms,
    Keywords,
    Ethics,
    GroupAuthors,
    Datasets,
}

impl TableKind {
    pub const ALL: [TableKind; 13] = [
        TableKind::Authors,
        TableKind::Funding,
        TableKind::Manuscript,
        TableKind::Title,
        TableKind::Abstract,
        TableKind::Received,
        TableKind::License,
        TableKind::Subjects,
        TableKind::Organisms,
        TableKind::Keywords,
        TableKind::Ethics,
        TableKind::GroupAuthors,
        TableKind::Datasets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authors => "authors",
            Self::Funding => "funding",
            Self::Manuscript => "manuscript",
            Self::Title => "title",
            Self::Abstract => "abstract",
            Self::Received => "received",
            Self::License => "license",
            Self::Subjects => "subjects",
            Self::Organisms => "organisms",
            Self::Keywords => "keywords",
            Self::Ethics => "ethics",
            Self::GroupAuthors => "group_authors",
            Self::Datasets => "datasets",
        }
    }

    /// File name used when the settings do not name one.
    pub fn default_file(&self) -> &'static str {
        match self {
            Self::Authors => "poa_author.csv",
            Self::Funding => "poa_funding.csv",
            Self::Manuscript => "poa_manuscript.csv",
            Self::Title => "poa_title.csv",
            Self::Abstract => "poa_abstract.csv",
            Self::Received => "poa_received.csv",
            Self::License => "poa_license.csv",
            Self::Subjects => "poa_subject_area.csv",
            Self::Organisms => "poa_research_organism.csv",
            Self::Keywords => "poa_keywords.csv",
            Self::Ethics => "poa_ethics.csv",
            Self::GroupAuthors => "poa_group_authors.csv",
            Self::Datasets => "poa_datasets.csv",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        TableKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown table '{}'", s))
    }
}

// =============================================================================
// Semantic Fields
// =============================================================================

/// Semantic name of a column, resolved to header text through [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ManuscriptNumber,
    // manuscript
    Doi,
    ArticleType,
    AcceptedDate,
    EditorId,
    EditorFirstName,
    EditorMiddleName,
    EditorLastName,
    EditorInstitution,
    EditorDepartment,
    EditorCountry,
    FundingNote,
    // single-purpose tables
    Title,
    Abstract,
    ReceivedDate,
    ReceiptDate,
    LicenseId,
    SubjectAreas,
    Organisms,
    Keywords,
    Ethics,
    GroupAuthor,
    Datasets,
    // authors
    AuthorId,
    AuthorPosition,
    AuthorFirstName,
    AuthorMiddleName,
    AuthorLastName,
    Email,
    AuthorType,
    DualCorresponding,
    AuthorInstitution,
    AuthorDepartment,
    AuthorCity,
    AuthorState,
    AuthorCountry,
    AuthorConflict,
    Orcid,
    // funding
    FunderPosition,
    Funder,
    AwardId,
    FunderIdentifier,
}

impl Field {
    pub fn default_heading(&self) -> &'static str {
        match self {
            Self::ManuscriptNumber => "poa_m_ms_no",
            Self::Doi => "poa_m_doi",
            Self::ArticleType => "poa_m_type",
            Self::AcceptedDate => "poa_m_accepted_dt",
            Self::EditorId => "poa_m_me_id",
            Self::EditorFirstName => "poa_m_me_first_nm",
            Self::EditorMiddleName => "poa_m_me_middle_nm",
            Self::EditorLastName => "poa_m_me_last_nm",
            Self::EditorInstitution => "poa_m_me_organization",
            Self::EditorDepartment => "poa_m_me_department",
            Self::EditorCountry => "poa_m_me_country",
            Self::FundingNote => "poa_m_funding_note",
            Self::Title => "poa_m_title_tag",
            Self::Abstract => "poa_m_abstract_tag",
            Self::ReceivedDate => "poa_r_received_dt",
            Self::ReceiptDate => "poa_r_receipt_dt",
            Self::LicenseId => "poa_l_license_id",
            Self::SubjectAreas => "poa_s_subjectarea",
            Self::Organisms => "poa_ro_researchorganism",
            Self::Keywords => "poa_kw_keyword",
            Self::Ethics => "poa_m_ethics_note",
            Self::GroupAuthor => "poa_ga",
            Self::Datasets => "poa_m_dataset_note",
            Self::AuthorId => "poa_a_id",
            Self::AuthorPosition => "poa_a_seq",
            Self::AuthorFirstName => "poa_a_first_nm",
            Self::AuthorMiddleName => "poa_a_middle_nm",
            Self::AuthorLastName => "poa_a_last_nm",
            Self::Email => "poa_a_email",
            Self::AuthorType => "poa_a_type_cde",
            Self::DualCorresponding => "poa_a_dual_corr",
            Self::AuthorInstitution => "poa_a_organization",
            Self::AuthorDepartment => "poa_a_department",
            Self::AuthorCity => "poa_a_city",
            Self::AuthorState => "poa_a_state",
            Self::AuthorCountry => "poa_a_country",
            Self::AuthorConflict => "poa_a_cmp",
            Self::Orcid => "poa_a_orcid",
            Self::FunderPosition => "poa_funder_order",
            Self::Funder => "poa_funder",
            Self::AwardId => "poa_award_id",
            Self::FunderIdentifier => "poa_fund_ref_id",
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Table configuration shared by the loader, the store and the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the exports.
    pub csv_path: PathBuf,
    /// File name per table; tables not listed use [`TableKind::default_file`].
    pub files: BTreeMap<TableKind, String>,
    /// Zero-based index of the row holding column headings.
    pub header_row: usize,
    /// Zero-based index of the first data row.
    pub data_start_row: usize,
    /// Overflow tables and the column their free text starts at.
    pub overflow_tables: BTreeMap<TableKind, usize>,
    /// Header text per field; fields not listed use [`Field::default_heading`].
    pub columns: BTreeMap<Field, String>,
    /// Tokens standing in for angle brackets in packed cells.
    pub sentinels: Sentinels,
    /// Prefix of synthesized DOIs.
    pub doi_prefix: String,
    /// Conflict statement for contributors without one.
    pub conflict_default: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("csv_data/"),
            files: TableKind::ALL
                .into_iter()
                .map(|kind| (kind, kind.default_file().to_string()))
                .collect(),
            header_row: 3,
            data_start_row: 4,
            overflow_tables: BTreeMap::from([
                (TableKind::Title, 2),
                (TableKind::Abstract, 2),
                (TableKind::Ethics, 3),
            ]),
            columns: BTreeMap::new(),
            sentinels: Sentinels::default(),
            doi_prefix: "10.7554/eLife.".to_string(),
            conflict_default: "The authors declare that no competing interests exist.".to_string(),
        }
    }
}

impl Settings {
    /// Settings rooted at `csv_path`, everything else default.
    pub fn with_csv_path(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            ..Self::default()
        }
    }

    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the environment (and a `.env` file if present).
    ///
    /// [`SETTINGS_ENV`] names a settings file, [`CSV_PATH_ENV`] overrides the
    /// base path.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut settings = match std::env::var(SETTINGS_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(csv_path) = std::env::var(CSV_PATH_ENV) {
            settings.csv_path = PathBuf::from(csv_path);
        }
        Ok(settings)
    }

    /// Full path of the file backing `table`.
    pub fn path_for(&self, table: TableKind) -> PathBuf {
        let file = self
            .files
            .get(&table)
            .map(String::as_str)
            .unwrap_or_else(|| table.default_file());
        self.csv_path.join(file)
    }

    /// Header text of `field`.
    pub fn column(&self, field: Field) -> &str {
        self.columns
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_heading())
    }

    /// Join-start column when `table` needs the overflow repair pass.
    pub fn overflow_join_column(&self, table: TableKind) -> Option<usize> {
        self.overflow_tables.get(&table).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_path_for_defaults() {
        let settings = Settings::with_csv_path("tests/test_data/");
        assert_eq!(
            settings.path_for(TableKind::Authors),
            PathBuf::from("tests/test_data/poa_author.csv")
        );
    }

    #[test]
    fn test_overflow_offsets() {
        let settings = Settings::default();
        assert_eq!(settings.overflow_join_column(TableKind::Ethics), Some(3));
        assert_eq!(settings.overflow_join_column(TableKind::Title), Some(2));
        assert_eq!(settings.overflow_join_column(TableKind::Authors), None);
    }

    #[test]
    fn test_table_kind_from_str() {
        assert_eq!("group-authors".parse::<TableKind>(), Ok(TableKind::GroupAuthors));
        assert_eq!("Funding".parse::<TableKind>(), Ok(TableKind::Funding));
        assert!("nope".parse::<TableKind>().is_err());
    }

    #[test]
    fn test_partial_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"csv_path": "/data/ejp/", "columns": {{"orcid": "poa_a_orcid_id"}}, "files": {{"authors": "authors_v2.csv"}}}}"#
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.column(Field::Orcid), "poa_a_orcid_id");
        assert_eq!(settings.column(Field::AuthorId), "poa_a_id");
        assert_eq!(settings.path_for(TableKind::Authors), PathBuf::from("/data/ejp/authors_v2.csv"));
        assert_eq!(settings.path_for(TableKind::Funding), PathBuf::from("/data/ejp/poa_funding.csv"));
        assert_eq!(settings.header_row, 3);
        assert_eq!(settings.sentinels.less_than, "LTLT");
    }

    #[test]
    fn test_invalid_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            Settings::from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
