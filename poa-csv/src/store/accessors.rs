//! Per-field getters on [`TableStore`].
//!
//! List getters return every value of the manuscript (possibly none). Single
//! value getters take the first row and fail with `LookupMiss` when there is
//! none; the `Option` getters (ethics, group authors, datasets) treat a
//! missing row as "not declared".

use super::{cell, FundingKey, ManuscriptId, TableStore};
use crate::config::{Field, TableKind};
use crate::error::{DataError, DataResult};
use crate::text::entity_to_unicode;

impl TableStore {
    fn first_value(&self, id: &ManuscriptId, kind: TableKind, field: Field) -> DataResult<String> {
        self.optional_value(id, kind, field)?
            .ok_or_else(|| DataError::miss(kind, format!("manuscript {}", id)))
    }

    fn optional_value(
        &self,
        id: &ManuscriptId,
        kind: TableKind,
        field: Field,
    ) -> DataResult<Option<String>> {
        Ok(self.attribute_values(id, kind, field)?.into_iter().next())
    }

    // =========================================================================
    // Single-purpose tables
    // =========================================================================

    pub fn subjects(&self, id: &ManuscriptId) -> DataResult<Vec<String>> {
        self.attribute_values(id, TableKind::Subjects, Field::SubjectAreas)
    }

    pub fn organisms(&self, id: &ManuscriptId) -> DataResult<Vec<String>> {
        self.attribute_values(id, TableKind::Organisms, Field::Organisms)
    }

    pub fn keywords(&self, id: &ManuscriptId) -> DataResult<Vec<String>> {
        self.attribute_values(id, TableKind::Keywords, Field::Keywords)
    }

    pub fn license_id(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::License, Field::LicenseId)
    }

    /// Title with entities decoded.
    pub fn title(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::Title, Field::Title)
            .map(|title| entity_to_unicode(&title))
    }

    /// Abstract with entities decoded.
    pub fn abstract_text(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::Abstract, Field::Abstract)
            .map(|text| entity_to_unicode(&text))
    }

    pub fn received_date(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::Received, Field::ReceivedDate)
    }

    pub fn receipt_date(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::Received, Field::ReceiptDate)
    }

    /// Packed ethics note, if the manuscript has one.
    pub fn ethics(&self, id: &ManuscriptId) -> DataResult<Option<String>> {
        self.optional_value(id, TableKind::Ethics, Field::Ethics)
    }

    /// Raw group-author cell, if the manuscript has one.
    pub fn group_authors(&self, id: &ManuscriptId) -> DataResult<Option<String>> {
        self.optional_value(id, TableKind::GroupAuthors, Field::GroupAuthor)
    }

    /// Packed dataset note, if the manuscript has one.
    pub fn datasets(&self, id: &ManuscriptId) -> DataResult<Option<String>> {
        self.optional_value(id, TableKind::Datasets, Field::Datasets)
    }

    // =========================================================================
    // Manuscript table
    // =========================================================================

    pub fn doi(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::Manuscript, Field::Doi)
    }

    pub fn article_type(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::Manuscript, Field::ArticleType)
    }

    pub fn accepted_date(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::Manuscript, Field::AcceptedDate)
    }

    pub fn funding_note(&self, id: &ManuscriptId) -> DataResult<String> {
        self.first_value(id, TableKind::Manuscript, Field::FundingNote)
    }

    /// Editor value from the manuscript table, e.g. `Field::EditorLastName`.
    pub fn editor_attribute(&self, id: &ManuscriptId, field: Field) -> DataResult<String> {
        self.first_value(id, TableKind::Manuscript, field)
    }

    // =========================================================================
    // Authors
    // =========================================================================

    /// Author ids in table order, duplicates included.
    pub fn author_ids(&self, id: &ManuscriptId) -> DataResult<Vec<String>> {
        Ok(self
            .attribute_values(id, TableKind::Authors, Field::AuthorId)?
            .into_iter()
            .map(|author| author.trim().to_string())
            .collect())
    }

    /// One column of an author's row.
    pub fn author_attribute(
        &self,
        id: &ManuscriptId,
        author_id: &str,
        field: Field,
    ) -> DataResult<String> {
        let index = self.authors_by_id_and_author()?;
        let row = index.get(id.as_str(), author_id).ok_or_else(|| {
            DataError::miss(
                TableKind::Authors,
                format!("manuscript {} author {}", id, author_id),
            )
        })?;
        let table = self.table(TableKind::Authors)?;
        Ok(cell(self.settings.column(field), &table.columns, row)?.to_string())
    }

    // =========================================================================
    // Funding
    // =========================================================================

    /// One column of a funding row.
    pub fn funding_attribute(&self, key: &FundingKey, field: Field) -> DataResult<String> {
        let index = self.funding_index()?;
        let row = index
            .get(key)
            .ok_or_else(|| DataError::miss(TableKind::Funding, key.to_string()))?;
        let table = self.table(TableKind::Funding)?;
        Ok(cell(self.settings.column(field), &table.columns, row)?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_store;

    #[test]
    fn test_list_getters() {
        let store = fixture_store();
        let id = ManuscriptId::from("7");

        assert_eq!(store.subjects(&id).unwrap(), vec!["Ecology", "Plant Biology"]);
        assert_eq!(store.keywords(&id).unwrap(), vec!["volatiles", "tritrophic interactions"]);
        assert!(store.subjects(&ManuscriptId::from("99999")).unwrap().is_empty());
    }

    #[test]
    fn test_title_overflow_and_entities() {
        let store = fixture_store();
        assert_eq!(
            store.title(&ManuscriptId::from("3")).unwrap(),
            "This, 'title, includes \"quotation\", marks & more \u{fc}"
        );
    }

    #[test]
    fn test_abstract_unquoted_commas() {
        let store = fixture_store();
        assert_eq!(
            store.abstract_text(&ManuscriptId::from("7")).unwrap(),
            "Plants emit volatiles, which attract predators, in nature."
        );
    }

    #[test]
    fn test_single_value_miss() {
        let store = fixture_store();
        let err = store.title(&ManuscriptId::from("99999")).unwrap_err();
        assert!(matches!(err, DataError::LookupMiss { table: TableKind::Title, .. }));
    }

    #[test]
    fn test_optional_getters() {
        let store = fixture_store();
        assert!(store.ethics(&ManuscriptId::from("7")).unwrap().is_none());
        assert!(store.ethics(&ManuscriptId::from("3")).unwrap().is_some());
        assert_eq!(
            store.group_authors(&ManuscriptId::from("21598")).unwrap().as_deref(),
            Some("3,0")
        );
        assert!(store.datasets(&ManuscriptId::from("3")).unwrap().is_none());
    }

    #[test]
    fn test_author_attribute_last_row_wins() {
        let store = fixture_store();
        let id = ManuscriptId::from("12717");

        assert_eq!(store.author_ids(&id).unwrap(), vec!["13727", "13728", "13728"]);
        assert_eq!(
            store.author_attribute(&id, "13728", Field::AuthorLastName).unwrap(),
            "Nosyreva"
        );
        assert!(matches!(
            store.author_attribute(&id, "1", Field::AuthorLastName),
            Err(DataError::LookupMiss { .. })
        ));
    }

    #[test]
    fn test_funding_attribute() {
        let store = fixture_store();
        let key = FundingKey::new("12717", "13727", "2");

        assert_eq!(store.funding_attribute(&key, Field::FunderIdentifier).unwrap(), "100000011");
        assert!(store.funding_attribute(&key, Field::AwardId).unwrap().is_empty());
        assert!(matches!(
            store.funding_attribute(&FundingKey::new("12717", "13727", "9"), Field::Funder),
            Err(DataError::LookupMiss { table: TableKind::Funding, .. })
        ));
    }

    #[test]
    fn test_editor_attribute() {
        let store = fixture_store();
        assert_eq!(
            store.editor_attribute(&ManuscriptId::from("3"), Field::EditorLastName).unwrap(),
            "Kuriyan"
        );
    }
}
