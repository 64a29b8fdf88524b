//! Assembly pipeline: one manuscript in, one record (or nothing) out.
//!
//! Steps run in a fixed order, each populating one part of the record. A
//! failing step is logged and counted but does not stop the steps after it;
//! the record is only returned when every step succeeded.
//!
//! # Example
//!
//! ```rust,ignore
//! use poa_csv::{build_article, Settings, TableStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = TableStore::new(Settings::from_env()?);
//!     let outcome = build_article(&store, 21598u32)?;
//!
//!     match outcome.article {
//!         Some(article) => println!("{}", article.doi),
//!         None => eprintln!("{} steps failed", outcome.error_count),
//!     }
//!     Ok(())
//! }
//! ```

use serde::Serialize;

use super::contributors::{set_author_info, set_editor_info};
use super::funding::set_funding;
use super::steps::*;
use crate::error::{DataError, DataResult, TableError, TableResult};
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::models::Article;
use crate::store::{ManuscriptId, TableStore};

/// Signature shared by all build steps.
pub type StepFn = fn(&mut Article, &ManuscriptId, &TableStore) -> DataResult<()>;

/// A named build step.
pub struct Step {
    pub name: &'static str,
    pub run: StepFn,
}

/// Steps run after the record is instantiated, in order.
pub const STEPS: &[Step] = &[
    Step { name: "set_title", run: set_title },
    Step { name: "set_abstract", run: set_abstract },
    Step { name: "set_article_type", run: set_article_type },
    Step { name: "set_license", run: set_license },
    Step { name: "set_dates", run: set_dates },
    Step { name: "set_ethics", run: set_ethics },
    Step { name: "set_datasets", run: set_datasets },
    Step { name: "set_categories", run: set_categories },
    Step { name: "set_organisms", run: set_organisms },
    Step { name: "set_author_info", run: set_author_info },
    Step { name: "set_editor_info", run: set_editor_info },
    Step { name: "set_keywords", run: set_keywords },
    Step { name: "set_funding", run: set_funding },
];

/// Result of building one manuscript.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildOutcome {
    /// Present only when the record was instantiated and no step failed.
    pub article: Option<Article>,

    /// Number of failed entries of [`STEPS`]; a failed instantiation is not
    /// counted
    pub error_count: usize,

    /// One message per failure, instantiation included
    pub error_messages: Vec<String>,
}

impl BuildOutcome {
    pub fn is_complete(&self) -> bool {
        self.article.is_some()
    }

    /// Log and keep the message of a failure. Table errors are handed back.
    fn record(&mut self, id: &ManuscriptId, step: &str, err: DataError) -> TableResult<()> {
        match err {
            DataError::Table(source) => {
                log_error(format!("manuscript {}: {} aborted: {}", id, step, source));
                Err(source)
            }
            err => {
                let message = format!("manuscript {} error in {}: {}", id, step, err);
                log_error(message.clone());
                self.error_messages.push(message);
                Ok(())
            }
        }
    }
}

/// Build the record of one manuscript.
///
/// Step failures are reported in the outcome. A table that cannot be loaded
/// aborts the build and is returned as the error.
pub fn build_article(
    store: &TableStore,
    manuscript_id: impl Into<ManuscriptId>,
) -> Result<BuildOutcome, TableError> {
    let id = manuscript_id.into();
    log_info(format!("Building manuscript {}", id));

    let mut outcome = BuildOutcome::default();

    // later steps still run on a blank record so every failure is reported
    let (mut article, instantiated) = match instantiate_article(&id, store) {
        Ok(article) => (article, true),
        Err(e) => {
            outcome.record(&id, "instantiate_article", e)?;
            (Article::default(), false)
        }
    };

    for step in STEPS {
        if let Err(e) = (step.run)(&mut article, &id, store) {
            outcome.record(&id, step.name, e)?;
            outcome.error_count += 1;
        }
    }

    if instantiated && outcome.error_count == 0 {
        article.is_poa = true;
        article.conflict_default = Some(store.settings().conflict_default.clone());
        log_success(format!("Built manuscript {} ({})", id, article.doi));
        outcome.article = Some(article);
    } else {
        log_warning(format!(
            "Discarded manuscript {}: {} failed steps, instantiated: {}",
            id, outcome.error_count, instantiated
        ));
    }

    Ok(outcome)
}

/// Build several manuscripts with one store, stopping at the first table error.
pub fn build_articles<I, T>(store: &TableStore, ids: I) -> TableResult<Vec<(ManuscriptId, BuildOutcome)>>
where
    I: IntoIterator<Item = T>,
    T: Into<ManuscriptId>,
{
    ids.into_iter()
        .map(|id| {
            let id = id.into();
            build_article(store, id.clone()).map(|outcome| (id, outcome))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Field, Settings, TableKind};
    use crate::models::{ContributorRole, DateType};
    use crate::test_support::{fixture_settings, fixture_store};

    fn failed_steps(outcome: &BuildOutcome) -> Vec<String> {
        outcome
            .error_messages
            .iter()
            .filter_map(|m| m.split(" error in ").nth(1))
            .filter_map(|m| m.split(':').next())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_build_complete_manuscript() {
        let store = fixture_store();
        let outcome = build_article(&store, 21598u32).unwrap();

        assert_eq!(outcome.error_count, 0, "{:?}", outcome.error_messages);
        let article = outcome.article.unwrap();
        assert_eq!(
            article.title.as_deref(),
            Some("Calcium-dependent <italic>in vivo</italic> imaging of neurons, revisited")
        );
        assert_eq!(article.doi, "10.7554/eLife.21598");
        assert_eq!(article.manuscript.as_deref(), Some("21598"));
        assert!(article.is_poa);
        assert_eq!(
            article.conflict_default.as_deref(),
            Some("The authors declare that no competing interests exist.")
        );
        assert_eq!(
            article.ethics,
            vec!["Human subjects: Informed consent & consent to publish were obtained, protocol \u{3b1}-1."]
        );
        assert_eq!(article.datasets.len(), 2);
        assert_eq!(article.funding_awards.len(), 2);
        assert_eq!(article.contributors.last().unwrap().role, ContributorRole::Editor);
    }

    #[test]
    fn test_doi_fallback() {
        let store = fixture_store();
        let article = build_article(&store, "3").unwrap().article.unwrap();

        assert_eq!(article.doi, "10.7554/eLife.00003");
        assert_eq!(
            article.abstract_text.as_deref(),
            Some("This abstract includes <italic>PINK1</italic> &amp; <italic>parkin</italic> &lt; 20 &gt; 10")
        );
        assert_eq!(article.display_channel.as_deref(), Some("Research Article"));
        assert!(article.get_date(DateType::License).is_some());
    }

    #[test]
    fn test_every_complete_fixture_builds() {
        let store = fixture_store();
        for id in ["3", "7", "2725", "12717", "21598"] {
            let outcome = build_article(&store, id).unwrap();
            assert!(outcome.is_complete(), "{}: {:?}", id, outcome.error_messages);
        }
    }

    #[test]
    fn test_unknown_manuscript_is_discarded() {
        let store = fixture_store();
        let outcome = build_article(&store, 99999u32).unwrap();

        assert!(outcome.article.is_none());
        assert_eq!(
            failed_steps(&outcome),
            vec![
                "instantiate_article",
                "set_title",
                "set_abstract",
                "set_article_type",
                "set_license",
                "set_dates",
                "set_author_info",
                "set_editor_info",
                "set_funding",
            ]
        );
        // instantiation failure is reported but not counted
        assert_eq!(outcome.error_count, 8);
        assert_eq!(outcome.error_messages.len(), 9);
        assert!(outcome.error_messages[0].starts_with("manuscript 99999 error in instantiate_article"));
    }

    #[test]
    fn test_failed_instantiation_alone_discards_record() {
        let mut settings = fixture_settings();
        settings.columns.insert(Field::Doi, "poa_m_doi_missing".to_string());
        let store = TableStore::new(settings);

        let outcome = build_article(&store, "7").unwrap();
        assert_eq!(outcome.error_count, 0);
        assert_eq!(failed_steps(&outcome), vec!["instantiate_article"]);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_bad_ethics_fails_only_that_step() {
        let store = fixture_store();
        let outcome = build_article(&store, 14874u32).unwrap();

        assert!(outcome.article.is_none());
        assert_eq!(outcome.error_count, 1);
        assert_eq!(failed_steps(&outcome), vec!["set_ethics"]);
    }

    #[test]
    fn test_missing_table_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let source = fixture_settings().csv_path;
        for kind in TableKind::ALL.into_iter().filter(|k| *k != TableKind::Funding) {
            std::fs::copy(source.join(kind.default_file()), dir.path().join(kind.default_file())).unwrap();
        }
        let store = TableStore::new(Settings::with_csv_path(dir.path()));

        let err = build_article(&store, 21598u32).unwrap_err();
        assert!(matches!(
            err,
            TableError::SourceUnavailable { table: TableKind::Funding, .. }
        ));
    }

    #[test]
    fn test_build_articles() {
        let store = fixture_store();
        let outcomes = build_articles(&store, ["7", "99999"]).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].1.is_complete());
        assert!(!outcomes[1].1.is_complete());
        assert_eq!(outcomes[1].0.as_str(), "99999");
    }
}
