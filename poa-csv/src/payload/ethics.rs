//! Ethics statements from the packed ethics note.

use super::{decode_payload, Sentinels};
use crate::error::{DecodeError, DecodeResult};
use crate::text::entity_to_unicode;

/// Sections of the note and the label each statement gets.
const SECTIONS: [(&str, &str); 2] = [
    ("animal_subjects", "Animal experimentation: "),
    ("human_subjects", "Human subjects: "),
];

const COMMENTS_TAG: &str = "involved_comments";

/// Decode an ethics note into zero, one or two labelled statements.
///
/// Both sections must be present. Every comment yields a statement, even a
/// blank one.
pub fn parse_ethics(raw: &str, sentinels: &Sentinels) -> DecodeResult<Vec<String>> {
    let root = decode_payload(raw, sentinels)?;
    let mut statements = Vec::new();

    for (tag, label) in SECTIONS {
        let section = root
            .find(tag)
            .ok_or_else(|| DecodeError::MissingElement(tag.to_string()))?;

        for comment in section.child_elements().filter(|c| c.name == COMMENTS_TAG) {
            let text = comment.text();
            statements.push(entity_to_unicode(&format!("{}{}", label, text.trim())));
        }
    }

    Ok(statements)
}
