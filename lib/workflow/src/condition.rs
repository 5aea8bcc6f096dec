//! Condition evaluation.

use crate::definition::JsonObject;
use serde_json::Value as JsonValue;

/// Resolved condition behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKind {
    /// True if the text contains any keyword (case-insensitive).
    ///
    /// Keywords are kept as split, so an empty list entry is the empty
    /// string and matches every text.
    Keyword { keywords: Vec<String> },
    /// Condition kind the engine does not evaluate, named by its label.
    Unimplemented { kind: String },
}

impl ConditionKind {
    /// Resolves a condition from its label and config.
    #[must_use]
    pub fn from_config(label: &str, config: &JsonObject) -> Self {
        if !label.contains("Keyword") {
            return Self::Unimplemented {
                kind: label.to_string(),
            };
        }

        let keywords = config
            .get("keywords")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        Self::Keyword {
            keywords: keywords
                .split(',')
                .map(|keyword| keyword.trim().to_lowercase())
                .collect(),
        }
    }

    /// Evaluates the condition against the inbound text.
    #[must_use]
    pub fn evaluate(&self, text: &str) -> ConditionOutcome {
        match self {
            Self::Keyword { keywords } => {
                let text = text.to_lowercase();
                ConditionOutcome::Evaluated(
                    keywords.iter().any(|keyword| text.contains(keyword.as_str())),
                )
            }
            Self::Unimplemented { kind } => ConditionOutcome::Unimplemented { kind: kind.clone() },
        }
    }
}

/// Result of evaluating a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    Evaluated(bool),
    /// Routed as false, and flagged in the trace.
    Unimplemented { kind: String },
}

impl ConditionOutcome {
    /// Returns the branch to follow.
    #[must_use]
    pub fn branch(&self) -> bool {
        match self {
            Self::Evaluated(result) => *result,
            Self::Unimplemented { .. } => false,
        }
    }

    /// Returns the trace entry describing the outcome.
    #[must_use]
    pub fn trace_entry(&self) -> String {
        match self {
            Self::Evaluated(result) => format!("Condition result: {result}"),
            Self::Unimplemented { kind } => {
                format!("Condition result: false (unimplemented condition kind: {kind})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn condition(label: &str, config: serde_json::Value) -> ConditionKind {
        ConditionKind::from_config(label, config.as_object().expect("object"))
    }

    #[test]
    fn keyword_matching_is_case_insensitive_and_trimmed() {
        let kind = condition("Keyword Match", json!({ "keywords": " Yes , OK" }));
        assert_eq!(kind.evaluate("yes please"), ConditionOutcome::Evaluated(true));
        assert_eq!(kind.evaluate("it's ok"), ConditionOutcome::Evaluated(true));
        assert_eq!(kind.evaluate("nope"), ConditionOutcome::Evaluated(false));
    }

    #[test]
    fn empty_keywords_match_everything() {
        let kind = condition("Keyword", json!({}));
        assert_eq!(kind.evaluate("anything"), ConditionOutcome::Evaluated(true));

        let kind = condition("Keyword", json!({ "keywords": "alpha,,beta" }));
        assert_eq!(kind.evaluate("gamma"), ConditionOutcome::Evaluated(true));
    }

    #[test]
    fn other_kinds_are_unimplemented_and_route_false() {
        let kind = condition("User is Admin", json!({ "keywords": "admin" }));
        let outcome = kind.evaluate("anything");
        assert!(!outcome.branch());
        assert_eq!(
            outcome.trace_entry(),
            "Condition result: false (unimplemented condition kind: User is Admin)"
        );
    }

    #[test]
    fn evaluated_trace_entry() {
        assert_eq!(ConditionOutcome::Evaluated(true).trace_entry(), "Condition result: true");
        assert_eq!(
            ConditionOutcome::Evaluated(false).trace_entry(),
            "Condition result: false"
        );
    }
}
