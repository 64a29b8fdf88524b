//! Escaped-payload decoder.
//!
//! Ethics and dataset declarations are exported as XML squeezed into one CSV
//! cell, with `<` and `>` replaced by sentinel tokens so the text survives the
//! delimited format. Decoding is three steps:
//!
//! ```text
//! raw cell ──▶ decode_brackets ──▶ escape_ampersand ──▶ parse_tree ──▶ Element
//!  (LTLT..)      (<..>)             (bare & → &amp;)     (small grammar)
//! ```
//!
//! [`parse_ethics`] and [`parse_datasets`] then walk the tree.

pub mod datasets;
pub mod ethics;
pub mod tree;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DecodeResult;

pub use datasets::parse_datasets;
pub use ethics::parse_ethics;
pub use tree::{parse_tree, Element, Node};

/// Entity references that `escape_ampersand` leaves alone.
static ENTITY_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:#[0-9]+|#x[0-9A-Fa-f]+|amp|lt|gt|quot|apos);")
        .expect("entity prefix regex is valid")
});

/// Tokens standing in for angle brackets in packed cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentinels {
    pub less_than: String,
    pub greater_than: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            less_than: "LTLT".to_string(),
            greater_than: "GTGT".to_string(),
        }
    }
}

/// Replace the sentinel tokens with literal angle brackets.
pub fn decode_brackets(raw: &str, sentinels: &Sentinels) -> String {
    let mut text = raw.to_string();
    if !sentinels.less_than.is_empty() {
        text = text.replace(&sentinels.less_than, "<");
    }
    if !sentinels.greater_than.is_empty() {
        text = text.replace(&sentinels.greater_than, ">");
    }
    text
}

/// Escape every `&` that does not start an XML entity or character reference.
pub fn escape_ampersand(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, ch) in text.char_indices() {
        if ch == '&' && !ENTITY_PREFIX_REGEX.is_match(&text[index..]) {
            out.push_str("&amp;");
        } else {
            out.push(ch);
        }
    }
    out
}

/// Decode a packed cell into its element tree.
pub fn decode_payload(raw: &str, sentinels: &Sentinels) -> DecodeResult<Element> {
    let xml = escape_ampersand(&decode_brackets(raw, sentinels));
    parse_tree(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_brackets() {
        let sentinels = Sentinels::default();
        assert_eq!(
            decode_brackets("LTLTyearGTGT2016LTLT/yearGTGT", &sentinels),
            "<year>2016</year>"
        );
    }

    #[test]
    fn test_custom_sentinels() {
        let sentinels = Sentinels {
            less_than: "[[".into(),
            greater_than: "]]".into(),
        };
        assert_eq!(decode_brackets("[[b]]x[[/b]]", &sentinels), "<b>x</b>");
    }

    #[test]
    fn test_escape_ampersand() {
        assert_eq!(escape_ampersand("A & B"), "A &amp; B");
        assert_eq!(escape_ampersand("A &amp; B &lt; &#x00FC; &#252;"), "A &amp; B &lt; &#x00FC; &#252;");
        assert_eq!(escape_ampersand("&alpha;"), "&amp;alpha;");
        assert_eq!(escape_ampersand("trailing &"), "trailing &amp;");
    }

    #[test]
    fn test_decode_payload() {
        let root = decode_payload(
            "LTLTxmlGTGTLTLTnoteGTGTcells & tissuesLTLT/noteGTGTLTLT/xmlGTGT",
            &Sentinels::default(),
        )
        .unwrap();

        let note = root.find("note").unwrap();
        assert_eq!(note.text(), "cells & tissues");
    }
}
