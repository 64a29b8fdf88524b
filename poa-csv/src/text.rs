//! Text cleanup shared by the getters and the build steps.
//!
//! - [`entity_to_unicode`] - numeric and selected named HTML entities to characters
//! - [`convert_to_xml_string`] - title / abstract markup normalization
//! - [`clean_funder`] - funder display name from the funding export
//! - [`elife_doi`] - DOI synthesized from a manuscript number

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::DataError;
use crate::payload::{decode_brackets, Sentinels};

/// Named entities seen in the exports, with their replacements.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&alpha;", "\u{03b1}"),
    ("&beta;", "\u{03b2}"),
    ("&gamma;", "\u{03b3}"),
    ("&delta;", "\u{03b4}"),
    ("&epsilon;", "\u{03b5}"),
    ("&ordm;", "\u{00ba}"),
    ("&iuml;", "\u{00cf}"),
    ("&ldquo;", "\""),
    ("&rdquo;", "\""),
];

/// Inline tags that survive [`escape_unmatched_angle_brackets`].
const ALLOWED_TAGS: &[&str] = &[
    "i", "italic", "b", "bold", "sup", "sub", "u", "underline", "p",
];

/// Legacy inline tags and their replacements.
const TAG_RENAMES: &[(&str, &str)] = &[
    ("i", "italic"),
    ("u", "underline"),
    ("b", "bold"),
    ("em", "italic"),
];

static HEX_ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#x([0-9A-Fa-f]{1,6});").expect("hex entity regex is valid")
});

static DEC_ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#([0-9]{1,7});").expect("decimal entity regex is valid")
});

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^<>]*>").expect("tag regex is valid"));

static PARENTHESIZED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.*\)").expect("parenthesized regex is valid"));

// =============================================================================
// Entities
// =============================================================================

/// Convert numeric character references and a handful of named entities to
/// characters. `&amp;`, `&lt;` and `&gt;` are left untouched.
///
/// References to invalid code points stay as written.
pub fn entity_to_unicode(text: &str) -> String {
    let text = HEX_ENTITY_REGEX.replace_all(text, |caps: &Captures| {
        code_point(&caps[1], 16).unwrap_or_else(|| caps[0].to_string())
    });
    let text = DEC_ENTITY_REGEX.replace_all(&text, |caps: &Captures| {
        code_point(&caps[1], 10).unwrap_or_else(|| caps[0].to_string())
    });

    NAMED_ENTITIES
        .iter()
        .fold(text.into_owned(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
}

fn code_point(digits: &str, radix: u32) -> Option<String> {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
}

// =============================================================================
// Markup
// =============================================================================

/// Normalize a packed title or abstract into inline XML.
///
/// Entities are decoded, sentinel brackets restored, legacy tags renamed and
/// any angle bracket that is not part of an allowed inline tag escaped.
pub fn convert_to_xml_string(raw: &str, sentinels: &Sentinels) -> String {
    let text = entity_to_unicode(raw);
    let mut text = decode_brackets(&text, sentinels);
    for (from, to) in TAG_RENAMES {
        text = replace_tags(&text, from, to);
    }
    escape_unmatched_angle_brackets(&text)
}

/// Rename `<from>` / `</from>` to `<to>` / `</to>`.
pub fn replace_tags(text: &str, from: &str, to: &str) -> String {
    text.replace(&format!("<{}>", from), &format!("<{}>", to))
        .replace(&format!("</{}>", from), &format!("</{}>", to))
}

/// Escape every `<` and `>` that is not part of an allowed inline tag.
pub fn escape_unmatched_angle_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for tag in TAG_REGEX.find_iter(text) {
        out.push_str(&escape_brackets(&text[last..tag.start()]));
        if is_allowed_tag(tag.as_str()) {
            out.push_str(tag.as_str());
        } else {
            out.push_str(&escape_brackets(tag.as_str()));
        }
        last = tag.end();
    }
    out.push_str(&escape_brackets(&text[last..]));
    out
}

fn is_allowed_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_start_matches('/');
    ALLOWED_TAGS.contains(&name)
}

fn escape_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

// =============================================================================
// Funding and Identifiers
// =============================================================================

/// Keep the last `|`-separated segment of a funder name, drop parenthesized
/// text and surrounding whitespace.
pub fn clean_funder(funder: &str) -> String {
    let last = funder.rsplit('|').next().unwrap_or(funder);
    PARENTHESIZED_REGEX.replace_all(last, "").trim().to_string()
}

/// DOI for a manuscript number: `prefix` plus the number zero-padded to five
/// digits.
pub fn elife_doi(manuscript_number: &str, prefix: &str) -> Result<String, DataError> {
    let number: u64 = manuscript_number.trim().parse().map_err(|_| {
        DataError::invalid(
            "manuscript_number",
            format!("'{}' is not numeric", manuscript_number),
        )
    })?;
    Ok(format!("{}{:05}", prefix, number))
}
