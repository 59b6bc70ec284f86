//! Merge generated property annotations into an existing docblock.
use std::collections::HashSet;

use crate::ir::AnnotationEntry;
use crate::phpdoc::{DocBlock, DocNode};

/// Replace property tags named like a generated entry, keep everything else in
/// place, then append the generated entries in order.
pub fn merge(existing: Option<&str>, entries: &[AnnotationEntry]) -> String {
    let mut block = existing.map(DocBlock::parse).unwrap_or_default();
    merge_into(&mut block, entries);
    block.to_string()
}

pub fn merge_into(block: &mut DocBlock, entries: &[AnnotationEntry]) {
    let generated = entries.iter().map(|e| e.name.as_str()).collect::<HashSet<_>>();
    block
        .children
        .retain(|node| node.property_name().is_none_or(|name| !generated.contains(name)));

    // a removed first tag can leave a blank line on top, which `parse` would drop next time
    let leading = block
        .children
        .iter()
        .take_while(|node| matches!(node, DocNode::Text(text) if text.is_empty()))
        .count();
    block.children.drain(..leading);
    for entry in entries {
        block.push_property(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypeExpr;

    fn entry(name: &str, ty: TypeExpr) -> AnnotationEntry {
        AnnotationEntry { name: name.into(), ty }
    }

    fn generated() -> Vec<AnnotationEntry> {
        vec![
            entry("age", TypeExpr::identifier("int").nullable()),
            entry("name", TypeExpr::identifier("string")),
        ]
    }

    #[test]
    fn fresh_block_without_existing_doc() {
        assert_eq!(merge(None, &generated()), "/**
 * @property-read ?int $age
 * @property-read string $name
 */");
    }

    #[test]
    fn replaces_colliding_entries_and_keeps_the_rest() {
        let existing = "/**
 * Handles sign up.
 *
 * @property-read string $age
 * @property-read bool $remember
 * @see \\App\\Http\\Controllers\\UserController
 */";
        let merged = merge(Some(existing), &generated());
        assert_eq!(merged, "/**
 * Handles sign up.
 *
 * @property-read bool $remember
 * @see \\App\\Http\\Controllers\\UserController
 * @property-read ?int $age
 * @property-read string $name
 */");
        assert_eq!(merged.matches("$age").count(), 1);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let existing = "/**\n * @property-read string $Age\n */";
        let merged = merge(Some(existing), &generated());
        assert!(merged.contains("@property-read string $Age"));
        assert!(merged.contains("@property-read ?int $age"));
    }

    #[test]
    fn any_property_tag_flavour_collides() {
        let existing = "/**\n * @property int $name\n * @property-write int $age\n */";
        let merged = merge(Some(existing), &generated());
        assert_eq!(merged, "/**\n * @property-read ?int $age\n * @property-read string $name\n */");
    }

    #[test]
    fn merge_is_idempotent() {
        let existing = "/**
     * Handles sign up.
     * @property-read string $age
     * @method static void boot()
     */";
        let once = merge(Some(existing), &generated());
        let twice = merge(Some(&once), &generated());
        assert_eq!(once, twice);

        let fresh = merge(None, &generated());
        assert_eq!(merge(Some(&fresh), &generated()), fresh);
    }

    #[test]
    fn removed_leading_tag_leaves_no_blank_line() {
        let existing = "/**\n * @property-read string $age\n *\n * @see Foo\n */";
        let entries = [entry("age", TypeExpr::identifier("int"))];
        let once = merge(Some(existing), &entries);
        assert_eq!(once, "/**\n * @see Foo\n * @property-read int $age\n */");
        assert_eq!(merge(Some(&once), &entries), once);
    }

    #[test]
    fn blank_separator_before_generated_tags_is_stable() {
        let existing = "/**\n * Summary\n *\n * @property-read string $age\n */";
        let entries = [entry("age", TypeExpr::identifier("int"))];
        let once = merge(Some(existing), &entries);
        assert_eq!(once, "/**\n * Summary\n *\n * @property-read int $age\n */");
        assert_eq!(merge(Some(&once), &entries), once);
    }

    #[test]
    fn empty_entries_keep_block_text() {
        let existing = "/**\n * Summary\n */";
        assert_eq!(merge(Some(existing), &[]), existing);
    }
}
