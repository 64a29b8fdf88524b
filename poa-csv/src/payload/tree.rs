//! Small-grammar element tree for decoded payloads.
//!
//! Supports what the exports actually contain: elements with attributes,
//! self-closing tags, text, comments, `<?...?>` declarations, `<!...>`
//! declarations before the root, CDATA, the five XML entities and numeric
//! character references. Anything else is a [`DecodeError`].

use crate::error::{DecodeError, DecodeResult};

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First element named `name`, this element included, in document order.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(name))
    }

    /// Every descendant named `name` in document order, this element excluded.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, text: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => text.push_str(t),
                Node::Element(element) => element.collect_text(text),
            }
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse a complete document with exactly one root element.
pub fn parse_tree(xml: &str) -> DecodeResult<Element> {
    TreeParser::new(xml).parse()
}

// =============================================================================
// Parser
// =============================================================================

struct TreeParser<'a> {
    input: &'a str,
    pos: usize,
    stack: Vec<Element>,
    root: Option<Element>,
}

impl<'a> TreeParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::new(),
            root: None,
        }
    }

    fn parse(mut self) -> DecodeResult<Element> {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_past("-->", "unterminated comment")?;
            } else if rest.starts_with("<?") {
                self.skip_past("?>", "unterminated declaration")?;
            } else if rest.starts_with("<![CDATA[") {
                self.parse_cdata()?;
            } else if rest.starts_with("<!") {
                self.skip_past(">", "unterminated declaration")?;
            } else if rest.starts_with("</") {
                self.parse_close_tag()?;
            } else if rest.starts_with('<') {
                self.parse_open_tag()?;
            } else {
                self.parse_text()?;
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(DecodeError::UnexpectedEof {
                open: open.name.clone(),
            });
        }
        self.root.ok_or(DecodeError::EmptyDocument)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn malformed(&self, message: impl Into<String>) -> DecodeError {
        DecodeError::Malformed {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_past(&mut self, terminator: &str, message: &str) -> DecodeResult<()> {
        match self.rest().find(terminator) {
            Some(index) => {
                self.pos += index + terminator.len();
                Ok(())
            }
            None => Err(self.malformed(message)),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn parse_name(&mut self) -> DecodeResult<String> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_alphabetic() || c == '_' || c == ':' => {}
            _ => return Err(self.malformed("expected a name")),
        }
        let end = chars
            .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')))
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        self.pos += end;
        Ok(rest[..end].to_string())
    }

    fn expect(&mut self, token: char) -> DecodeResult<()> {
        if self.rest().starts_with(token) {
            self.pos += token.len_utf8();
            Ok(())
        } else {
            Err(self.malformed(format!("expected '{}'", token)))
        }
    }

    fn parse_open_tag(&mut self) -> DecodeResult<()> {
        if self.root.is_some() {
            return Err(DecodeError::TrailingContent { offset: self.pos });
        }
        self.pos += 1;
        let mut element = Element::new(self.parse_name()?);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                self.attach(element);
                return Ok(());
            }
            if rest.starts_with('>') {
                self.pos += 1;
                self.stack.push(element);
                return Ok(());
            }
            if rest.is_empty() {
                return Err(DecodeError::UnexpectedEof { open: element.name });
            }
            let attribute = self.parse_attribute()?;
            element.attributes.push(attribute);
        }
    }

    fn parse_attribute(&mut self) -> DecodeResult<(String, String)> {
        let name = self.parse_name()?;
        self.skip_whitespace();
        self.expect('=')?;
        self.skip_whitespace();

        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.malformed("expected a quoted attribute value")),
        };
        self.pos += 1;
        let rest = self.rest();
        let end = rest
            .find(quote)
            .ok_or_else(|| self.malformed("unterminated attribute value"))?;
        let raw = &rest[..end];
        if raw.contains('<') {
            return Err(self.malformed("'<' in attribute value"));
        }
        self.pos += end + 1;
        Ok((name, decode_entities(raw)?))
    }

    fn parse_close_tag(&mut self) -> DecodeResult<()> {
        let offset = self.pos;
        self.pos += 2;
        let name = self.parse_name()?;
        self.skip_whitespace();
        self.expect('>')?;

        let element = self.stack.pop().ok_or_else(|| DecodeError::UnexpectedCloseTag {
            found: name.clone(),
            offset,
        })?;
        if element.name != name {
            return Err(DecodeError::MismatchedTag {
                expected: element.name,
                found: name,
                offset,
            });
        }
        self.attach(element);
        Ok(())
    }

    fn parse_cdata(&mut self) -> DecodeResult<()> {
        let start = self.pos + "<![CDATA[".len();
        let end = self.input[start..]
            .find("]]>")
            .ok_or_else(|| self.malformed("unterminated CDATA section"))?;
        let text = self.input[start..start + end].to_string();
        let offset = self.pos;
        self.pos = start + end + 3;
        self.push_text(text, offset)
    }

    fn parse_text(&mut self) -> DecodeResult<()> {
        let offset = self.pos;
        let rest = self.rest();
        let end = rest.find('<').unwrap_or(rest.len());
        let raw = &rest[..end];
        self.pos += end;

        if self.stack.is_empty() {
            if raw.trim().is_empty() {
                return Ok(());
            }
            if self.root.is_some() {
                return Err(DecodeError::TrailingContent { offset });
            }
            return Err(DecodeError::Malformed {
                offset,
                message: "text outside the root element".into(),
            });
        }
        self.push_text(decode_entities(raw)?, offset)
    }

    fn push_text(&mut self, text: String, offset: usize) -> DecodeResult<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(Node::Text(text));
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(DecodeError::TrailingContent { offset }),
        }
    }

    fn attach(&mut self, element: Element) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => self.root = Some(element),
        }
    }
}

/// Resolve the five XML entities and numeric character references.
fn decode_entities(raw: &str) -> DecodeResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after.find(';').ok_or_else(|| DecodeError::InvalidEntity {
            entity: after.chars().take(12).collect(),
        })?;
        let entity = &after[..semi];
        out.push(resolve_entity(entity).ok_or_else(|| DecodeError::InvalidEntity {
            entity: entity.to_string(),
        })?);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let root = parse_tree(
            "<?xml version=\"1.0\"?><xml><a id=\"1\">one <b>two</b></a><!-- note --><c/></xml>",
        )
        .unwrap();

        assert_eq!(root.name, "xml");
        assert_eq!(root.child_elements().count(), 2);
        let a = root.find("a").unwrap();
        assert_eq!(a.attribute("id"), Some("1"));
        assert_eq!(a.text(), "one two");
        assert!(root.find("c").unwrap().children.is_empty());
    }

    #[test]
    fn test_entities_resolved() {
        let root = parse_tree("<t>A &amp; B &lt;3 &#x03B1; &#946;</t>").unwrap();
        assert_eq!(root.text(), "A & B <3 \u{3b1} \u{3b2}");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = parse_tree(
            "<r><g><d>1</d></g><d>2</d><g><x><d>3</d></x></g></r>",
        )
        .unwrap();
        let texts: Vec<String> = root.descendants("d").iter().map(|d| d.text()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_mismatched_tag() {
        let err = parse_tree("<a><b></a></b>").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MismatchedTag { ref expected, ref found, .. } if expected == "b" && found == "a"
        ));
    }

    #[test]
    fn test_unexpected_eof() {
        assert_eq!(
            parse_tree("<a><b>text</b>").unwrap_err(),
            DecodeError::UnexpectedEof { open: "a".into() }
        );
    }

    #[test]
    fn test_unexpected_close() {
        assert!(matches!(
            parse_tree("</a>").unwrap_err(),
            DecodeError::UnexpectedCloseTag { .. }
        ));
    }

    #[test]
    fn test_trailing_content() {
        assert!(matches!(
            parse_tree("<a/><b/>").unwrap_err(),
            DecodeError::TrailingContent { .. }
        ));
        assert!(matches!(
            parse_tree("<a/>tail").unwrap_err(),
            DecodeError::TrailingContent { .. }
        ));
    }

    #[test]
    fn test_invalid_entity() {
        assert_eq!(
            parse_tree("<a>&alpha;</a>").unwrap_err(),
            DecodeError::InvalidEntity { entity: "alpha".into() }
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse_tree("  <!-- -->  ").unwrap_err(), DecodeError::EmptyDocument);
        assert_eq!(parse_tree("").unwrap_err(), DecodeError::EmptyDocument);
    }

    #[test]
    fn test_malformed_markup() {
        assert!(matches!(
            parse_tree("<a>< b</a>").unwrap_err(),
            DecodeError::Malformed { .. }
        ));
    }
}
