// Strongly-typed annotation IR. Printing follows the PHPDoc type syntax
// understood by PHPStan and Psalm.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Identifier(String),      // int, string, \Illuminate\Http\UploadedFile
    Union(Vec<TypeExpr>),    // (int | float)
    Nullable(Box<TypeExpr>), // ?T
    ArrayOf(Box<TypeExpr>),  // T[]
    Shape(Vec<ShapeItem>),   // array{key: T}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeItem {
    pub key: String,
    pub value: TypeExpr,
}

/// One `@property-read` line to be written into a class docblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationEntry {
    pub name: String,
    pub ty: TypeExpr,
}

impl TypeExpr {
    pub fn identifier(name: impl Into<String>) -> Self {
        TypeExpr::Identifier(name.into())
    }

    /// `int|float` → union, `int` → identifier.
    pub fn from_type_name(type_name: &str) -> Self {
        if type_name.contains('|') {
            TypeExpr::Union(type_name.split('|').map(TypeExpr::identifier).collect())
        } else {
            TypeExpr::identifier(type_name)
        }
    }

    pub fn nullable(self) -> Self {
        TypeExpr::Nullable(Box::new(self))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeExpr::Nullable(_))
    }
}

impl AnnotationEntry {
    pub const TAG: &'static str = "@property-read";

    pub fn nullable(&self) -> bool {
        self.ty.is_nullable()
    }

    /// Tag body without the tag name, e.g. `?int $age`.
    pub fn tag_value(&self) -> String {
        format!("{} ${}", self.ty, self.name)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Identifier(name) => f.write_str(name),
            TypeExpr::Union(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
            TypeExpr::Nullable(inner) => write!(f, "?{inner}"),
            // `?int[]` would read as nullable array
            TypeExpr::ArrayOf(item) if item.is_nullable() => write!(f, "({item})[]"),
            TypeExpr::ArrayOf(item) => write!(f, "{item}[]"),
            TypeExpr::Shape(items) => {
                f.write_str("array{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", item.key, item.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for AnnotationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Self::TAG, self.tag_value())
    }
}
