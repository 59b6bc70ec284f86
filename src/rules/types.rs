//! Rule → PHPDoc type resolution for a single leaf.

use super::RuleToken;

pub const MIXED: &str = "mixed";
pub const ARRAY: &str = "array";
pub const UPLOADED_FILE: &str = "\\Illuminate\\Http\\UploadedFile";

/// The rule that turns a field optional.
const NULLABLE: &str = "nullable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafType {
    /// May be a `|`-joined union such as `int|float`.
    pub type_name: String,
    pub required: bool,
}

pub fn resolve(tokens: &[RuleToken]) -> LeafType {
    LeafType {
        type_name: type_name(tokens).to_string(),
        required: is_required(tokens),
    }
}

pub fn is_required(tokens: &[RuleToken]) -> bool {
    !tokens.iter().any(|t| t.as_rule() == Some(NULLABLE))
}

/// First rule with a known type wins; arguments after `:` are ignored.
pub fn type_name(tokens: &[RuleToken]) -> &'static str {
    tokens
        .iter()
        .filter_map(|token| match token {
            RuleToken::Rule(rule) => Some(rule.as_str()),
            RuleToken::Opaque(raw) => {
                log::debug!("ignoring non-string rule {raw} while resolving type");
                None
            }
        })
        .find_map(|rule| type_for_rule(rule_name(rule)))
        .unwrap_or(MIXED)
}

fn rule_name(rule: &str) -> &str {
    rule.split(':').next().unwrap_or(rule)
}

fn type_for_rule(rule: &str) -> Option<&'static str> {
    let ty = match rule {
        "integer" | "int" | "digits" | "digits_between" => "int",
        "numeric" => "int|float",
        "string" | "email" | "url"
        | "alpha" | "alpha_dash" | "alpha_num"
        | "ip" | "ipv4" | "ipv6"
        | "timezone" | "uuid" | "ulid" => "string",
        "boolean" => "bool",
        "array" => ARRAY,
        "file" | "image" | "mimes" | "mimetypes" => UPLOADED_FILE,
        "json" => MIXED,
        _ => return None,
    };
    Some(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(text: &str) -> Vec<RuleToken> {
        text.split('|').map(|r| RuleToken::Rule(r.to_string())).collect()
    }

    #[test]
    fn nullable_makes_field_optional() {
        assert_eq!(resolve(&rules("nullable|integer")), LeafType { type_name: "int".into(), required: false });
        assert_eq!(resolve(&rules("required|string")), LeafType { type_name: "string".into(), required: true });
    }

    #[test]
    fn nullable_match_is_exact() {
        assert!(is_required(&rules("Nullable|string")));
        assert!(is_required(&rules("nullable:1|string")));
    }

    #[test]
    fn first_known_rule_wins_and_arguments_are_ignored() {
        assert_eq!(type_name(&rules("required|max:10|digits_between:1,4|string")), "int");
        assert_eq!(type_name(&rules("mimes:jpg,png|file")), UPLOADED_FILE);
        assert_eq!(type_name(&rules("json|array")), MIXED);
    }

    #[test]
    fn numeric_is_a_union() {
        assert_eq!(type_name(&rules("numeric")), "int|float");
    }

    #[test]
    fn unknown_rules_fall_back_to_mixed() {
        assert_eq!(type_name(&rules("required|confirmed")), MIXED);
        assert_eq!(type_name(&[]), MIXED);
    }

    #[test]
    fn opaque_tokens_are_skipped() {
        let tokens = vec![
            RuleToken::Opaque("{\"class\":\"Enum\"}".into()),
            RuleToken::Rule("nullable".into()),
            RuleToken::Rule("boolean".into()),
        ];
        assert_eq!(resolve(&tokens), LeafType { type_name: "bool".into(), required: false });
    }
}
