//! Problems found while turning rules into annotations.
//!
//! Two severities:
//! - [`Conflict`]: one rule entry is malformed or contradicts an earlier one.
//!   The entry is skipped, the class still gets its annotations.
//! - [`RenderError`]: the tree for a class cannot be rendered at all.
//!   Generation for that class is aborted, other classes are unaffected.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    #[error("rules must be a sequence or delimited string (found {found})")]
    MalformedRules { found: String },

    #[error("the indexed-array and the shaped-array cannot be specified together")]
    MixedArrayKinds,

    #[error("inconsistency in the rules: `{segment}` nested under scalar `{type_name}`")]
    ScalarGivenChildren { segment: String, type_name: String },

    #[error("duplicate names rule specification: `{segment}`")]
    DuplicateDefinition { segment: String },
}

/// A conflict tied to the rule path that caused it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {conflict}")]
pub struct Diagnostic {
    pub path: String,
    pub conflict: Conflict,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("unknown type: {name}")]
    UnknownType { name: String },

    #[error("required child property information: {name}: shaped-array")]
    EmptyShape { name: String },

    #[error("only 1 child property information: {name}: indexed-array (found {found})")]
    IndexedArity { name: String, found: usize },

    #[error("don't have child property information: {name}: {type_name}")]
    ScalarWithChildren { name: String, type_name: String },
}

/// Everything worth reporting about one class, in the order it happened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    #[error("{0}")]
    Conflict(#[from] Diagnostic),

    #[error("{0}")]
    Render(#[from] RenderError),

    /// Reading or writing the class's source failed.
    #[error("{0}")]
    Artifact(String),
}

impl Problem {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Problem::Render(_) | Problem::Artifact(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_message_names_path() {
        let d = Diagnostic {
            path: "tags.label".into(),
            conflict: Conflict::MixedArrayKinds,
        };
        assert_eq!(
            d.to_string(),
            "tags.label: the indexed-array and the shaped-array cannot be specified together"
        );
    }

    #[test]
    fn only_render_errors_are_fatal() {
        let conflict = Problem::from(Diagnostic {
            path: "email".into(),
            conflict: Conflict::DuplicateDefinition { segment: "email".into() },
        });
        let render = Problem::from(RenderError::EmptyShape { name: "meta".into() });
        assert!(!conflict.is_fatal());
        assert!(render.is_fatal());
    }
}
