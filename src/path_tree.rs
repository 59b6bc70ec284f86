//! Rule paths → nested field tree.
//!
//! Every rule path (`items.*.name`) is walked segment by segment. Intermediate
//! nodes are created lazily and start out `Unresolved`; the segment that lands
//! on a node decides what kind of array it is:
//! - `*` narrows the parent to an indexed array (`T[]`)
//! - any other name narrows it to a shaped array (`array{name: T}`)
//!
//! Once narrowed, a node only accepts segments of the same flavour. Violations
//! are reported per rule entry and the entry is skipped; the rest of the
//! rules still build.
use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::diagnostics::{Conflict, Diagnostic};
use crate::rules::types::{ARRAY, MIXED};
use crate::rules::{self, LeafType, RuleSet, RuleSpec, WILDCARD};

// ------------------------------ State ------------------------------------ //

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Unresolved,
    Scalar(String),
    ShapedArray,
    IndexedArray,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    pub name: String,
    pub kind: NodeKind,
    /// Only leaves carry this; `None` on intermediate nodes.
    pub required: Option<bool>,
    pub children: IndexMap<String, PathNode>,
}

const ROOT_NAME: &str = "root";

impl NodeKind {
    fn container(indexed: bool) -> Self {
        if indexed { NodeKind::IndexedArray } else { NodeKind::ShapedArray }
    }

    /// Kinds that a nested path may refine into an array shape.
    fn is_placeholder(&self) -> bool {
        match self {
            NodeKind::Unresolved => true,
            NodeKind::Scalar(t) => t == ARRAY || t == MIXED,
            _ => false,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Unresolved => "unresolved",
            NodeKind::Scalar(t) => t,
            NodeKind::ShapedArray => "shaped-array",
            NodeKind::IndexedArray => "indexed-array",
        }
    }
}

impl PathNode {
    pub fn root() -> Self {
        Self::new(ROOT_NAME, NodeKind::Root, None)
    }

    fn new(name: &str, kind: NodeKind, required: Option<bool>) -> Self {
        Self { name: name.to_string(), kind, required, children: IndexMap::new() }
    }

    fn intermediate(name: &str) -> Self {
        Self::new(name, NodeKind::Unresolved, None)
    }

    fn leaf(name: &str, leaf: &LeafType) -> Self {
        Self::new(name, NodeKind::Scalar(leaf.type_name.clone()), Some(leaf.required))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&PathNode> {
        self.children.get(name)
    }

    /// Check that `segment` may hang below this node, narrowing it if still open.
    fn accept_segment(&mut self, segment: &str) -> Result<(), Conflict> {
        let indexed = segment == WILDCARD;
        if self.kind.is_placeholder() {
            self.kind = NodeKind::container(indexed);
            return Ok(());
        }
        match &self.kind {
            NodeKind::IndexedArray if !indexed => Err(Conflict::MixedArrayKinds),
            NodeKind::ShapedArray if indexed => Err(Conflict::MixedArrayKinds),
            NodeKind::IndexedArray | NodeKind::ShapedArray | NodeKind::Root | NodeKind::Unresolved => Ok(()),
            NodeKind::Scalar(type_name) => Err(Conflict::ScalarGivenChildren {
                segment: segment.to_string(),
                type_name: type_name.clone(),
            }),
        }
    }

    /// Insert one dotted path whose terminal segment resolves to `leaf`.
    pub fn insert(&mut self, path: &str, leaf: &LeafType) -> Result<(), Conflict> {
        let segments = path.split('.').collect::<Vec<_>>();
        let last = segments.len() - 1;

        let mut node = self;
        for (index, segment) in segments.into_iter().enumerate() {
            // a lone top-level field is always acceptable
            if index > 0 {
                node.accept_segment(segment)?;
            }
            let is_last = index == last;
            node = match node.children.entry(segment.to_string()) {
                Entry::Occupied(_) if is_last => {
                    return Err(Conflict::DuplicateDefinition { segment: segment.to_string() });
                }
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) if is_last => entry.insert(PathNode::leaf(segment, leaf)),
                Entry::Vacant(entry) => entry.insert(PathNode::intermediate(segment)),
            };
        }
        Ok(())
    }
}

// ------------------------------- Observe ---------------------------------- //

/// Accumulates rule entries into a tree, collecting diagnostics on the way.
pub struct PathTreeBuilder {
    root: PathNode,
    diagnostics: Vec<Diagnostic>,
}

impl PathTreeBuilder {
    pub fn new() -> Self {
        Self { root: PathNode::root(), diagnostics: Vec::new() }
    }

    pub fn observe(&mut self, spec: &RuleSpec) {
        let result = spec
            .value
            .tokens()
            .map(|tokens| rules::resolve(&tokens))
            .and_then(|leaf| self.root.insert(&spec.path, &leaf));

        if let Err(conflict) = result {
            log::debug!("skipping rule `{}`: {conflict}", spec.path);
            self.diagnostics.push(Diagnostic { path: spec.path.clone(), conflict });
        }
    }

    pub fn finish(self) -> (PathNode, Vec<Diagnostic>) {
        (self.root, self.diagnostics)
    }
}

impl Default for PathTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build(rules: &RuleSet) -> (PathNode, Vec<Diagnostic>) {
    let mut builder = PathTreeBuilder::new();
    for spec in rules.iter() {
        builder.observe(spec);
    }
    builder.finish()
}

// ------------------------------- Tests ------------------------------------ //
