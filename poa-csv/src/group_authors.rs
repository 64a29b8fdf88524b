//! Group-author decoder.
//!
//! The group-author column packs collaborations with their author position:
//!
//! ```text
//! order_start15order_endANECS111order_start3order_endThe XYZ Consortium2
//! ```
//!
//! Each segment is `order_start <position> order_end <name><trailing digits>`.

use indexmap::IndexMap;

pub const ORDER_START: &str = "order_start";
pub const ORDER_END: &str = "order_end";

/// Position (as written) to collaboration name, in first-seen order.
pub type GroupAuthors = IndexMap<String, String>;

/// Decode a raw group-author cell.
///
/// `None`, blank and `"0"` mean no group authors. Segments without an end
/// marker are skipped; a repeated position keeps its first slot and takes the
/// latest name.
pub fn parse_group_authors(raw: Option<&str>) -> Option<GroupAuthors> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return None;
    }

    let mut authors = GroupAuthors::new();
    for segment in raw.split(ORDER_START).filter(|s| !s.is_empty()) {
        let Some((position, remainder)) = segment.split_once(ORDER_END) else {
            continue;
        };
        let name = remainder.trim_end_matches(|c: char| c.is_ascii_digit());
        authors.insert(position.to_string(), name.to_string());
    }
    Some(authors)
}
