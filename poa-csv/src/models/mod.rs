//! Output record assembled for one manuscript.
//!
//! - [`Article`] - the record with all its lists
//! - [`Contributor`] / [`Affiliation`] - authors, group authors and the editor
//! - [`License`] - boilerplate license block
//! - [`ArticleDate`] - received / accepted / license dates
//! - [`DatasetEntry`] - a decoded dataset declaration
//! - [`FundingAward`] - one award with its principal recipients
//!
//! Serialization to the publishing schema is done by consumers; the serde
//! derives exist for debugging dumps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Contributors
// =============================================================================

/// Role of a contributor on the record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContributorRole {
    Author,
    Editor,
}

/// Affiliation of a contributor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Affiliation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An individual author, a group author (collab) or an editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contributor {
    pub role: ContributorRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Collaboration name for group authors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collab: Option<String>,
    pub corresp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
    /// Author (or editor) id from the source tables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<Affiliation>,
}

impl Contributor {
    /// A named person.
    pub fn person(role: ContributorRole, surname: impl Into<String>, given_name: impl Into<String>) -> Self {
        Self {
            role,
            surname: Some(surname.into()),
            given_name: Some(given_name.into()),
            collab: None,
            corresp: false,
            conflict: None,
            orcid: None,
            auth_id: None,
            affiliation: None,
        }
    }

    /// A collaboration credited as an author.
    pub fn collab(name: impl Into<String>) -> Self {
        Self {
            role: ContributorRole::Author,
            surname: None,
            given_name: None,
            collab: Some(name.into()),
            corresp: false,
            conflict: None,
            orcid: None,
            auth_id: None,
            affiliation: None,
        }
    }

    pub fn set_affiliation(&mut self, affiliation: Affiliation) {
        self.affiliation = Some(affiliation);
    }

    pub fn set_conflict(&mut self, conflict: impl Into<String>) {
        self.conflict = Some(conflict.into());
    }
}

// =============================================================================
// License and Dates
// =============================================================================

/// License block of the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct License {
    pub license_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_type: Option<String>,
    pub copyright: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph2: Option<String>,
}

impl License {
    pub fn new(license_id: impl Into<String>) -> Self {
        Self {
            license_id: license_id.into(),
            ..Self::default()
        }
    }
}

/// Kind of dated event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DateType {
    Received,
    Accepted,
    License,
}

/// A dated event on the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleDate {
    pub date_type: DateType,
    pub date: NaiveDate,
}

impl ArticleDate {
    pub fn new(date_type: DateType, date: NaiveDate) -> Self {
        Self { date_type, date }
    }
}

// =============================================================================
// Datasets
// =============================================================================

/// Container a dataset declaration came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatasetGroup {
    /// Generated for this manuscript (`datasets`).
    Datasets,
    /// Previously published (`prev_published_datasets`).
    PrevPublishedDatasets,
}

impl DatasetGroup {
    /// Element name of the container.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Datasets => "datasets",
            Self::PrevPublishedDatasets => "prev_published_datasets",
        }
    }
}

/// One decoded dataset declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetEntry {
    pub group: DatasetGroup,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl DatasetEntry {
    pub fn new(group: DatasetGroup) -> Self {
        Self {
            group,
            authors: Vec::new(),
            title: None,
            source_id: None,
            license_info: None,
            year: None,
        }
    }
}

// =============================================================================
// Funding
// =============================================================================

/// One funding award.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FundingAward {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    #[serde(default)]
    pub award_ids: Vec<String>,
    /// Recipients in contributor order.
    #[serde(default)]
    pub principal_award_recipients: Vec<Contributor>,
}

impl FundingAward {
    pub fn add_award_id(&mut self, award_id: impl Into<String>) {
        self.award_ids.push(award_id.into());
    }

    pub fn add_principal_award_recipient(&mut self, contributor: Contributor) {
        self.principal_award_recipients.push(contributor);
    }
}

// =============================================================================
// Article
// =============================================================================

/// The normalized record of one manuscript.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub doi: String,
    /// Manuscript number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manuscript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default)]
    pub dates: Vec<ArticleDate>,
    #[serde(default)]
    pub ethics: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,
    #[serde(default)]
    pub article_categories: Vec<String>,
    #[serde(default)]
    pub research_organisms: Vec<String>,
    #[serde(default)]
    pub author_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_note: Option<String>,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    #[serde(default)]
    pub funding_awards: Vec<FundingAward>,
    /// Built from publish-on-acceptance data.
    #[serde(default)]
    pub is_poa: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_default: Option<String>,
}

impl Article {
    pub fn new(doi: impl Into<String>) -> Self {
        Self {
            doi: doi.into(),
            ..Self::default()
        }
    }

    pub fn add_date(&mut self, date: ArticleDate) {
        self.dates.push(date);
    }

    /// First date of the given type.
    pub fn get_date(&self, date_type: DateType) -> Option<&ArticleDate> {
        self.dates.iter().find(|d| d.date_type == date_type)
    }

    pub fn add_ethic(&mut self, ethic: impl Into<String>) {
        self.ethics.push(ethic.into());
    }

    pub fn add_dataset(&mut self, dataset: DatasetEntry) {
        self.datasets.push(dataset);
    }

    pub fn add_article_category(&mut self, category: impl Into<String>) {
        self.article_categories.push(category.into());
    }

    pub fn add_research_organism(&mut self, organism: impl Into<String>) {
        self.research_organisms.push(organism.into());
    }

    pub fn add_author_keyword(&mut self, keyword: impl Into<String>) {
        self.author_keywords.push(keyword.into());
    }

    pub fn add_contributor(&mut self, contributor: Contributor) {
        self.contributors.push(contributor);
    }

    pub fn add_funding_award(&mut self, award: FundingAward) {
        self.funding_awards.push(award);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_date() {
        let mut article = Article::new("10.7554/eLife.00003");
        let accepted = NaiveDate::from_ymd_opt(2012, 9, 5).unwrap();
        article.add_date(ArticleDate::new(DateType::Accepted, accepted));

        assert_eq!(article.get_date(DateType::Accepted).unwrap().date, accepted);
        assert!(article.get_date(DateType::Received).is_none());
    }

    #[test]
    fn test_collab_contributor() {
        let collab = Contributor::collab("ANECS");
        assert_eq!(collab.role, ContributorRole::Author);
        assert_eq!(collab.collab.as_deref(), Some("ANECS"));
        assert!(collab.surname.is_none());
    }

    #[test]
    fn test_article_serialization() {
        let mut article = Article::new("10.7554/eLife.21598");
        article.abstract_text = Some("An abstract".into());
        article.add_contributor(Contributor::person(ContributorRole::Author, "Caddick", "Sarah J"));

        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["doi"], "10.7554/eLife.21598");
        assert_eq!(json["abstract"], "An abstract");
        assert_eq!(json["contributors"][0]["role"], "author");
        assert!(json.get("title").is_none());
    }
}
