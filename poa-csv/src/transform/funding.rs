//! Funding step.
//!
//! Pass 1 turns funding rows into one award per funder position; the first
//! row seen for a position decides its institution and award id. Pass 2 adds
//! principal recipients by walking the already-built contributor list, so
//! recipients follow author order. Awards are emitted by ascending position.

use indexmap::IndexMap;

use crate::config::Field;
use crate::error::DataResult;
use crate::models::{Article, FundingAward};
use crate::store::{FundingKey, ManuscriptId, TableStore};
use crate::text::{clean_funder, entity_to_unicode};

/// Sort key for funder positions: numeric first, then anything else by text.
fn position_key(position: &str) -> (bool, i64, String) {
    match position.trim().parse::<i64>() {
        Ok(n) => (false, n, String::new()),
        Err(_) => (true, 0, position.to_string()),
    }
}

fn new_award(key: &FundingKey, store: &TableStore) -> DataResult<FundingAward> {
    let funder = clean_funder(&store.funding_attribute(key, Field::Funder)?);
    let identifier = store.funding_attribute(key, Field::FunderIdentifier)?;
    let award_id = store.funding_attribute(key, Field::AwardId)?;

    let mut award = FundingAward::default();
    if !funder.is_empty() {
        award.institution_name = Some(entity_to_unicode(&funder));
    }
    if !identifier.trim().is_empty() {
        award.institution_id = Some(identifier.trim().to_string());
    }
    if !award_id.trim().is_empty() {
        award.add_award_id(award_id.trim());
    }
    Ok(award)
}

/// Funding note and funding awards. Runs after the author step.
pub fn set_funding(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let note = store.funding_note(id)?;
    if !note.trim().is_empty() {
        article.funding_note = Some(note);
    }

    let keys = store.funding_ids(id)?;

    // pass 1
    let mut awards: IndexMap<String, FundingAward> = IndexMap::new();
    for key in &keys {
        if awards.contains_key(&key.funder_position) {
            continue;
        }
        awards.insert(key.funder_position.clone(), new_award(key, store)?);
    }

    // pass 2
    for (position, award) in awards.iter_mut() {
        for contributor in &article.contributors {
            let Some(auth_id) = contributor.auth_id.as_deref() else {
                continue;
            };
            let funded = keys
                .iter()
                .any(|key| &key.funder_position == position && key.author_id == auth_id);
            if funded {
                award.add_principal_award_recipient(contributor.clone());
            }
        }
    }

    let mut ordered: Vec<(String, FundingAward)> = awards.into_iter().collect();
    ordered.sort_by_key(|(position, _)| position_key(position));
    for (_, award) in ordered {
        article.add_funding_award(award);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Contributor;
    use crate::test_support::fixture_store;
    use crate::transform::contributors::set_author_info;

    fn funded_article(id: &str) -> Article {
        let store = fixture_store();
        let id = ManuscriptId::from(id);
        let mut article = Article::default();
        set_author_info(&mut article, &id, &store).unwrap();
        set_funding(&mut article, &id, &store).unwrap();
        article
    }

    fn surnames(recipients: &[Contributor]) -> Vec<&str> {
        recipients.iter().filter_map(|c| c.surname.as_deref()).collect()
    }

    #[test]
    fn test_position_order() {
        let mut positions = vec!["10", "2", "x", "1"];
        positions.sort_by_key(|p| position_key(p));
        assert_eq!(positions, vec!["1", "2", "10", "x"]);
    }

    #[test]
    fn test_awards_by_position() {
        let article = funded_article("12717");

        assert_eq!(article.funding_awards.len(), 2);
        let ninds = &article.funding_awards[0];
        assert_eq!(
            ninds.institution_name.as_deref(),
            Some("National Institute of Neurological Disorders and Stroke")
        );
        assert_eq!(ninds.institution_id.as_deref(), Some("100000065"));
        assert_eq!(ninds.award_ids, vec!["1R01NS066936"]);
        assert_eq!(surnames(&ninds.principal_award_recipients), vec!["Kavalali"]);

        let hhmi = &article.funding_awards[1];
        assert_eq!(hhmi.institution_name.as_deref(), Some("Howard Hughes Medical Institute"));
        assert!(hhmi.award_ids.is_empty());
    }

    #[test]
    fn test_recipients_follow_author_order() {
        let article = funded_article("21598");

        assert_eq!(article.funding_awards.len(), 2);
        let nhmrc = &article.funding_awards[0];
        // first row seen for position 1 decides the award id
        assert_eq!(nhmrc.award_ids, vec!["1059097"]);
        assert_eq!(
            surnames(&nhmrc.principal_award_recipients),
            vec!["Caddick", "Lemaire"]
        );
        assert_eq!(
            article.funding_awards[1].institution_name.as_deref(),
            Some("Australian Research Council")
        );
        assert!(article.funding_note.is_some());
    }

    #[test]
    fn test_no_funding_rows() {
        let article = funded_article("3");
        assert!(article.funding_awards.is_empty());
        assert!(article.funding_note.is_none());
    }
}
