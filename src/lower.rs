use crate::diagnostics::RenderError;
use crate::ir::{AnnotationEntry, ShapeItem, TypeExpr};
use crate::path_tree::{NodeKind, PathNode};

/// One annotation per top-level field, in rule order.
pub fn synthesize(root: &PathNode) -> Result<Vec<AnnotationEntry>, RenderError> {
    root.children
        .values()
        .map(|node| {
            Ok(AnnotationEntry {
                name: node.name.clone(),
                ty: lower_to_ir(node)?,
            })
        })
        .collect()
}

pub fn lower_to_ir(node: &PathNode) -> Result<TypeExpr, RenderError> {
    let base = lower_core(node)?;
    // containers carry no nullability of their own; `required` lives on leaves
    if node.required == Some(false) { Ok(base.nullable()) } else { Ok(base) }
}

fn lower_core(node: &PathNode) -> Result<TypeExpr, RenderError> {
    match &node.kind {
        NodeKind::Root | NodeKind::Unresolved => Err(RenderError::UnknownType { name: node.name.clone() }),

        NodeKind::ShapedArray => {
            if node.children.is_empty() {
                return Err(RenderError::EmptyShape { name: node.name.clone() });
            }
            let items = node
                .children
                .values()
                .map(|child| {
                    Ok(ShapeItem {
                        key: child.name.clone(),
                        value: lower_to_ir(child)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TypeExpr::Shape(items))
        }

        NodeKind::IndexedArray => match (node.children.len(), node.children.values().next()) {
            (1, Some(item)) => Ok(TypeExpr::ArrayOf(Box::new(lower_to_ir(item)?))),
            (found, _) => Err(RenderError::IndexedArity { name: node.name.clone(), found }),
        },

        NodeKind::Scalar(type_name) => {
            if !node.is_leaf() {
                return Err(RenderError::ScalarWithChildren {
                    name: node.name.clone(),
                    type_name: type_name.clone(),
                });
            }
            Ok(TypeExpr::from_type_name(type_name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_tree::build;
    use crate::rules::RuleSet;

    fn entries(pairs: &[(&str, &str)]) -> Vec<AnnotationEntry> {
        let rules: RuleSet = pairs.iter().copied().collect();
        let (root, diags) = build(&rules);
        assert!(diags.is_empty(), "{diags:?}");
        synthesize(&root).unwrap()
    }

    fn rendered(entries: &[AnnotationEntry]) -> Vec<String> {
        entries.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn flat_fields_render_in_rule_order() {
        let out = entries(&[("age", "nullable|integer"), ("name", "required|string")]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "age");
        assert!(out[0].nullable());
        assert_eq!(out[0].ty, TypeExpr::identifier("int").nullable());
        assert_eq!(out[1].name, "name");
        assert!(!out[1].nullable());
        assert_eq!(rendered(&out), ["@property-read ?int $age", "@property-read string $name"]);
    }

    #[test]
    fn indexed_array_of_shapes() {
        let out = entries(&[("items.*.name", "required|string"), ("items.*.age", "nullable|integer")]);
        assert_eq!(rendered(&out), ["@property-read array{name: string, age: ?int}[] $items"]);
    }

    #[test]
    fn nested_shapes_and_unions() {
        let out = entries(&[
            ("address", "nullable|array"),
            ("address.city", "string"),
            ("address.geo.lat", "numeric"),
            ("price", "nullable|numeric"),
        ]);
        assert_eq!(rendered(&out), [
            "@property-read ?array{city: string, geo: array{lat: (int | float)}} $address",
            "@property-read ?(int | float) $price",
        ]);
    }

    #[test]
    fn files_and_unknown_rules() {
        let out = entries(&[("avatar", "image|max:1024"), ("token", "confirmed")]);
        assert_eq!(rendered(&out), [
            "@property-read \\Illuminate\\Http\\UploadedFile $avatar",
            "@property-read mixed $token",
        ]);
    }

    #[test]
    fn conflicting_entry_leaves_first_shape() {
        let rules: RuleSet = [("tags.*", "string"), ("tags.label", "string")].into_iter().collect();
        let (root, diags) = build(&rules);
        assert_eq!(diags.len(), 1);
        let out = synthesize(&root).unwrap();
        assert_eq!(rendered(&out), ["@property-read string[] $tags"]);
        assert!(!out[0].to_string().contains("label"));
    }

    #[test]
    fn unresolved_node_is_fatal() {
        let mut root = PathNode::root();
        let mut orphan = root.clone();
        orphan.name = "orphan".into();
        orphan.kind = NodeKind::Unresolved;
        root.children.insert("orphan".into(), orphan);
        assert_eq!(synthesize(&root), Err(RenderError::UnknownType { name: "orphan".into() }));
    }

    #[test]
    fn empty_shape_is_fatal() {
        let mut root = PathNode::root();
        let mut meta = root.clone();
        meta.name = "meta".into();
        meta.kind = NodeKind::ShapedArray;
        root.children.insert("meta".into(), meta);
        assert_eq!(synthesize(&root), Err(RenderError::EmptyShape { name: "meta".into() }));
    }

    #[test]
    fn indexed_array_needs_exactly_one_child() {
        let mut root = PathNode::root();
        let mut list = root.clone();
        list.name = "list".into();
        list.kind = NodeKind::IndexedArray;
        root.children.insert("list".into(), list);
        assert_eq!(
            synthesize(&root),
            Err(RenderError::IndexedArity { name: "list".into(), found: 0 })
        );

        let mut item = PathNode::root();
        item.kind = NodeKind::Scalar("int".into());
        let children = &mut root.children["list"].children;
        children.insert("*".into(), item.clone());
        assert!(synthesize(&root).is_ok());
        root.children["list"].children.insert("extra".into(), item);
        assert_eq!(
            synthesize(&root),
            Err(RenderError::IndexedArity { name: "list".into(), found: 2 })
        );
    }

    #[test]
    fn scalar_with_children_is_fatal() {
        let mut root = PathNode::root();
        let mut name = root.clone();
        name.name = "name".into();
        name.kind = NodeKind::Scalar("string".into());
        name.children.insert("first".into(), PathNode::root());
        root.children.insert("name".into(), name);
        assert_eq!(
            synthesize(&root),
            Err(RenderError::ScalarWithChildren { name: "name".into(), type_name: "string".into() })
        );
    }
}
