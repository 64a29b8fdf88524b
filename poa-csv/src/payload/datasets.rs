//! Dataset declarations from the packed dataset note.

use super::tree::Element;
use super::{decode_payload, Sentinels};
use crate::error::{DecodeError, DecodeResult};
use crate::models::{DatasetEntry, DatasetGroup};
use crate::text::entity_to_unicode;

const GROUPS: [DatasetGroup; 2] = [DatasetGroup::Datasets, DatasetGroup::PrevPublishedDatasets];

/// Decode a dataset note into entries, generated datasets first.
pub fn parse_datasets(raw: &str, sentinels: &Sentinels) -> DecodeResult<Vec<DatasetEntry>> {
    let root = decode_payload(raw, sentinels)?;
    let mut entries = Vec::new();

    for group in GROUPS {
        let container = root
            .find(group.tag())
            .ok_or_else(|| DecodeError::MissingElement(group.tag().to_string()))?;

        for dataset in container.descendants("dataset") {
            entries.push(dataset_entry(group, dataset));
        }
    }

    Ok(entries)
}

fn dataset_entry(group: DatasetGroup, dataset: &Element) -> DatasetEntry {
    let mut entry = DatasetEntry::new(group);

    for child in dataset.child_elements() {
        let text = child.text();
        match child.name.as_str() {
            "authors_text_list" => {
                entry.authors.extend(
                    text.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(entity_to_unicode),
                );
            }
            "title" => entry.title = non_blank(&text),
            "id" => entry.source_id = non_blank(&text),
            "license_info" => entry.license_info = non_blank(&text),
            "year" => entry.year = non_blank(&text),
            _ => {}
        }
    }

    entry
}

fn non_blank(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(entity_to_unicode(text))
    }
}
