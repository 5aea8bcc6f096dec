//! Prompt templates for agent nodes.
//!
//! Templates use `{{variable}}` placeholders. Placeholders without a value
//! are left in place so a misspelt variable is visible in the output.

use std::collections::HashMap;

/// Values substituted into a template.
pub type PromptVariables = HashMap<String, String>;

/// A prompt with `{{variable}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    content: String,
}

impl PromptTemplate {
    /// Creates a template from raw content.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Returns the raw template content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Renders the template with the given variables.
    #[must_use]
    pub fn render(&self, variables: &PromptVariables) -> String {
        variables
            .iter()
            .fold(self.content.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{{{name}}}}}"), value)
            })
    }
}
