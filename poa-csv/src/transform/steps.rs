//! Record-level build steps.
//!
//! Each step reads what it needs from the [`TableStore`] and writes one field
//! (or field group) of the [`Article`].

use chrono::NaiveDate;

use crate::error::{DataError, DataResult};
use crate::models::{Article, ArticleDate, DateType, License};
use crate::payload::{parse_datasets, parse_ethics};
use crate::store::{ManuscriptId, TableStore};
use crate::text::{convert_to_xml_string, elife_doi};

const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Boilerplate
// =============================================================================

/// Article type and display channel for an export type code.
fn article_type_for(code: &str) -> Option<(&'static str, &'static str)> {
    let display_channel = match code {
        "1" => "Research Article",
        "10" => "Feature Article",
        "14" => "Short Report",
        "15" => "Research Advance",
        "19" => "Tools and Resources",
        _ => return None,
    };
    Some(("research-article", display_channel))
}

fn license_for(license_id: &str) -> DataResult<License> {
    let number: i64 = license_id.trim().parse().map_err(|_| {
        DataError::invalid("license_id", format!("'{}' is not numeric", license_id))
    })?;

    let mut license = License::new(license_id);
    match number {
        1 => {
            license.license_type = Some("open-access".into());
            license.copyright = true;
            license.href = Some("http://creativecommons.org/licenses/by/4.0/".into());
            license.name = Some("Creative Commons Attribution License".into());
            license.paragraph1 = Some("This article is distributed under the terms of the ".into());
            license.paragraph2 = Some(
                " permitting unrestricted use and redistribution provided that the \
                 original author and source are credited."
                    .into(),
            );
        }
        2 => {
            license.license_type = Some("open-access".into());
            license.copyright = false;
            license.href = Some("http://creativecommons.org/publicdomain/zero/1.0/".into());
            license.name = Some("Creative Commons CC0".into());
            license.paragraph1 = Some(
                "This is an open-access article, free of all copyright, and may be \
                 freely reproduced, distributed, transmitted, modified, built upon, or \
                 otherwise used by anyone for any lawful purpose. The work is made \
                 available under the "
                    .into(),
            );
            license.paragraph2 = Some(" public domain dedication.".into());
        }
        _ => {}
    }
    Ok(license)
}

/// Date from the first whitespace-separated token of a timestamp cell.
fn parse_date(field: &str, value: &str) -> DataResult<NaiveDate> {
    let token = value
        .split_whitespace()
        .next()
        .ok_or_else(|| DataError::invalid(field, "empty date"))?;
    NaiveDate::parse_from_str(token, DATE_FORMAT)
        .map_err(|e| DataError::invalid(field, format!("'{}': {}", token, e)))
}

// =============================================================================
// Steps
// =============================================================================

/// New record with the exported DOI, or one derived from the manuscript number.
pub fn instantiate_article(id: &ManuscriptId, store: &TableStore) -> DataResult<Article> {
    let doi = store.doi(id)?;
    let doi = if doi.trim().is_empty() {
        elife_doi(id.as_str(), &store.settings().doi_prefix)?
    } else {
        doi.trim().to_string()
    };
    Ok(Article::new(doi))
}

pub fn set_title(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let title = store.title(id)?;
    article.title = Some(convert_to_xml_string(&title, &store.settings().sentinels));
    Ok(())
}

/// Abstract, plus the manuscript number.
pub fn set_abstract(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let text = store.abstract_text(id)?;
    article.abstract_text = Some(convert_to_xml_string(&text, &store.settings().sentinels));
    article.manuscript = Some(id.to_string());
    Ok(())
}

pub fn set_article_type(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let code = store.article_type(id)?;
    let (article_type, display_channel) = article_type_for(code.trim())
        .ok_or_else(|| DataError::invalid("article_type", format!("unknown code '{}'", code)))?;
    article.article_type = Some(article_type.to_string());
    article.display_channel = Some(display_channel.to_string());
    Ok(())
}

pub fn set_license(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let license_id = store.license_id(id)?;
    article.license = Some(license_for(&license_id)?);
    Ok(())
}

/// Accepted, received and license dates. Received falls back to the receipt
/// date; the license date is the accepted date.
pub fn set_dates(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let accepted = parse_date("accepted_date", &store.accepted_date(id)?)?;

    let mut received = store.received_date(id)?;
    if received.trim().is_empty() {
        received = store.receipt_date(id)?;
    }
    let received = parse_date("received_date", &received)?;

    article.add_date(ArticleDate::new(DateType::Accepted, accepted));
    article.add_date(ArticleDate::new(DateType::Received, received));
    article.add_date(ArticleDate::new(DateType::License, accepted));
    Ok(())
}

pub fn set_ethics(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let Some(raw) = store.ethics(id)? else {
        return Ok(());
    };
    if raw.trim().is_empty() {
        return Ok(());
    }
    for ethic in parse_ethics(&raw, &store.settings().sentinels)? {
        article.add_ethic(ethic);
    }
    Ok(())
}

pub fn set_datasets(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    let Some(raw) = store.datasets(id)? else {
        return Ok(());
    };
    if raw.trim().is_empty() {
        return Ok(());
    }
    for dataset in parse_datasets(&raw, &store.settings().sentinels)? {
        article.add_dataset(dataset);
    }
    Ok(())
}

pub fn set_categories(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    for category in store.subjects(id)? {
        article.add_article_category(category);
    }
    Ok(())
}

/// Research organisms, blank values skipped.
pub fn set_organisms(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    for organism in store.organisms(id)? {
        if !organism.trim().is_empty() {
            article.add_research_organism(organism);
        }
    }
    Ok(())
}

pub fn set_keywords(article: &mut Article, id: &ManuscriptId, store: &TableStore) -> DataResult<()> {
    for keyword in store.keywords(id)? {
        article.add_author_keyword(keyword);
    }
    Ok(())
}
