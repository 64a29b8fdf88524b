//! Author and editor steps.
//!
//! Authors come from two places: one row per author in the authors table, and
//! the packed group-author cell. Both carry a numeric position, and the record
//! lists them by ascending position whatever the row order was.

use std::collections::BTreeMap;

use crate::config::{Field, TableKind};
use crate::error::{DataError, DataResult};
use crate::group_authors::parse_group_authors;
use crate::models::{Affiliation, Article, Contributor, ContributorRole};
use crate::store::{ManuscriptId, TableStore};
use crate::text::entity_to_unicode;

const CORRESPONDING_AUTHOR: &str = "Corresponding Author";

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn given_name(first: String, middle: &str) -> String {
    if middle.trim().is_empty() {
        first
    } else {
        format!("{} {}", first, middle)
    }
}

fn parse_position(field: &str, value: &str) -> DataResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| DataError::invalid(field, format!("'{}' is not a position", value)))
}

/// Dual-corresponding flag: blank is no, otherwise the integer must be 1.
fn is_dual_corresponding(value: &str) -> DataResult<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(false);
    }
    let flag: i64 = value
        .parse()
        .map_err(|_| DataError::invalid("dual_corresponding", format!("'{}' is not an integer", value)))?;
    Ok(flag == 1)
}

// =============================================================================
// Authors
// =============================================================================

fn author_contributor(id: &ManuscriptId, author_id: &str, store: &TableStore) -> DataResult<Contributor> {
    let attribute = |field: Field| store.author_attribute(id, author_id, field);
    let text = |field: Field| attribute(field).map(|value| entity_to_unicode(&value));

    let given = given_name(text(Field::AuthorFirstName)?, &text(Field::AuthorMiddleName)?);
    let mut author = Contributor::person(ContributorRole::Author, text(Field::AuthorLastName)?, given);

    let mut affiliation = Affiliation {
        department: non_blank(text(Field::AuthorDepartment)?),
        institution: Some(text(Field::AuthorInstitution)?),
        city: non_blank(text(Field::AuthorCity)?),
        country: Some(text(Field::AuthorCountry)?),
        email: None,
    };

    let contrib_type = attribute(Field::AuthorType)?;
    if contrib_type.trim() == CORRESPONDING_AUTHOR
        || is_dual_corresponding(&attribute(Field::DualCorresponding)?)?
    {
        affiliation.email = Some(attribute(Field::Email)?);
        author.corresp = true;
    }

    if let Some(conflict) = non_blank(attribute(Field::AuthorConflict)?) {
        author.set_conflict(conflict);
    }
    author.orcid = non_blank(attribute(Field::Orcid)?);
    author.auth_id = Some(author_id.to_string());
    author.set_affiliation(affiliation);

    Ok(author)
}

/// Individual and group authors, ordered by position.
pub fn set_author_info(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let author_ids = store.author_ids(id)?;
    let group_authors = store.group_authors(id)?;

    let has_group_cell = group_authors
        .as_deref()
        .is_some_and(|raw| !raw.trim().is_empty());
    if author_ids.is_empty() && !has_group_cell {
        return Err(DataError::miss(TableKind::Authors, format!("manuscript {}", id)));
    }

    let mut by_position: BTreeMap<i64, Contributor> = BTreeMap::new();

    for author_id in &author_ids {
        let author = author_contributor(id, author_id, store)?;
        let position = parse_position(
            "author_position",
            &store.author_attribute(id, author_id, Field::AuthorPosition)?,
        )?;
        by_position.insert(position, author);
    }

    if let Some(groups) = parse_group_authors(group_authors.as_deref()) {
        for (position, name) in groups {
            by_position.insert(
                parse_position("group_author_position", &position)?,
                Contributor::collab(name),
            );
        }
    }

    for author in by_position.into_values() {
        article.add_contributor(author);
    }
    Ok(())
}

// =============================================================================
// Editor
// =============================================================================

/// The handling editor, appended after the authors.
pub fn set_editor_info(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let text = |field: Field| {
        store
            .editor_attribute(id, field)
            .map(|value| entity_to_unicode(&value))
    };

    let given = given_name(text(Field::EditorFirstName)?, &text(Field::EditorMiddleName)?);
    let mut editor = Contributor::person(ContributorRole::Editor, text(Field::EditorLastName)?, given);
    editor.auth_id = Some(store.editor_attribute(id, Field::EditorId)?.trim().to_string());

    editor.set_affiliation(Affiliation {
        department: non_blank(text(Field::EditorDepartment)?),
        institution: Some(text(Field::EditorInstitution)?),
        country: Some(text(Field::EditorCountry)?),
        ..Affiliation::default()
    });

    article.add_contributor(editor);
    Ok(())
}
