//! Minimal PHPDoc block model.
//!
//! A block is parsed into an ordered list of nodes: free text lines and tags.
//! Tag bodies are kept as raw text (continuation lines included) so anything
//! the tool does not own is written back untouched. Only property tags are
//! inspected, to learn which property they describe.
//!
//! Canonical form:
//!
//! ```text
//! /**
//!  * Summary line
//!  *
//!  * @property-read string $name
//!  */
//! ```
//!
//! `parse` followed by `to_string` is idempotent on canonical input.
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::AnnotationEntry;

const PROPERTY_TAGS: [&str; 3] = ["@property", "@property-read", "@property-write"];

static PROPERTY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocNode {
    Text(String),
    Tag(DocTag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTag {
    /// `@property-read`, `@deprecated`, ...
    pub name: String,
    /// Everything after the name, leading whitespace included; may span lines.
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    pub children: Vec<DocNode>,
}

impl DocTag {
    pub fn property(entry: &AnnotationEntry) -> Self {
        Self {
            name: AnnotationEntry::TAG.to_string(),
            body: format!(" {}", entry.tag_value()),
        }
    }

    pub fn is_property(&self) -> bool {
        PROPERTY_TAGS.contains(&self.name.as_str())
    }

    /// `foo` for `@property-read int $foo`; `None` for any other tag.
    pub fn property_name(&self) -> Option<&str> {
        if !self.is_property() {
            return None;
        }
        PROPERTY_NAME
            .captures(&self.body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

impl DocNode {
    pub fn property_name(&self) -> Option<&str> {
        match self {
            DocNode::Tag(tag) => tag.property_name(),
            DocNode::Text(_) => None,
        }
    }
}

impl DocBlock {
    pub fn parse(text: &str) -> Self {
        let inner = text.trim();
        let inner = inner.strip_prefix("/**").unwrap_or(inner);
        let inner = inner.strip_suffix("*/").unwrap_or(inner);

        let mut lines = inner.lines().map(clean_line).collect::<Vec<_>>();
        while lines.first().is_some_and(|l| l.is_empty()) {
            lines.remove(0);
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        let mut children = Vec::<DocNode>::new();
        for line in lines {
            let trimmed = line.trim_start();
            if trimmed.starts_with('@') {
                let split = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
                let (name, body) = trimmed.split_at(split);
                children.push(DocNode::Tag(DocTag { name: name.to_string(), body: body.to_string() }));
                continue;
            }
            match children.last_mut() {
                // non-blank lines right after a tag continue its description
                Some(DocNode::Tag(tag)) if !line.is_empty() => {
                    tag.body.push('\n');
                    tag.body.push_str(line);
                }
                _ => children.push(DocNode::Text(line.to_string())),
            }
        }
        Self { children }
    }

    pub fn push_property(&mut self, entry: &AnnotationEntry) {
        self.children.push(DocNode::Tag(DocTag::property(entry)));
    }
}

/// Strip indentation, the leading `*` and one space of padding.
fn clean_line(line: &str) -> &str {
    let line = line.trim_start();
    let line = line.strip_prefix('*').unwrap_or(line);
    let line = line.strip_prefix(' ').unwrap_or(line);
    line.trim_end()
}

impl fmt::Display for DocTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.body)
    }
}

impl fmt::Display for DocNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocNode::Text(text) => f.write_str(text),
            DocNode::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

impl fmt::Display for DocBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/**\n")?;
        for child in &self.children {
            for line in child.to_string().split('\n') {
                if line.is_empty() {
                    f.write_str(" *\n")?;
                } else {
                    writeln!(f, " * {line}")?;
                }
            }
        }
        f.write_str(" */")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "/**
     * Store a user.
     *
     * @property-read string $name
     * @property int $age Age in years,
     *   rounded down.
     * @deprecated
     */";

    #[test]
    fn parses_text_and_tags() {
        let block = DocBlock::parse(SAMPLE);
        assert_eq!(block.children.len(), 5);
        assert_eq!(block.children[0], DocNode::Text("Store a user.".into()));
        assert_eq!(block.children[1], DocNode::Text(String::new()));
        assert_eq!(block.children[2].property_name(), Some("name"));
        assert_eq!(block.children[3].property_name(), Some("age"));
        assert_eq!(block.children[4].property_name(), None);
        match &block.children[3] {
            DocNode::Tag(tag) => assert_eq!(tag.body, " int $age Age in years,\n  rounded down."),
            other => panic!("expected tag, got {other:?}"),
        }
    }

    #[test]
    fn prints_canonical_form() {
        let block = DocBlock::parse(SAMPLE);
        assert_eq!(block.to_string(), "/**
 * Store a user.
 *
 * @property-read string $name
 * @property int $age Age in years,
 *   rounded down.
 * @deprecated
 */");
    }

    #[test]
    fn reparse_is_stable() {
        let once = DocBlock::parse(SAMPLE).to_string();
        let twice = DocBlock::parse(&once).to_string();
        assert_eq!(once, twice);
    }

    #[test]
    fn single_line_block() {
        let block = DocBlock::parse("/** @mixin \\Eloquent */");
        assert_eq!(block.children, vec![DocNode::Tag(DocTag {
            name: "@mixin".into(),
            body: " \\Eloquent".into(),
        })]);
        assert_eq!(block.to_string(), "/**\n * @mixin \\Eloquent\n */");
    }

    #[test]
    fn shape_types_with_spaces_still_find_the_property() {
        let block = DocBlock::parse("/**\n * @property-read array{a: int, b: ?string} $payload\n */");
        assert_eq!(block.children[0].property_name(), Some("payload"));
    }

    #[test]
    fn non_property_tags_have_no_property_name() {
        let block = DocBlock::parse("/**\n * @method string $notAProperty()\n */");
        assert_eq!(block.children[0].property_name(), None);
    }
}
