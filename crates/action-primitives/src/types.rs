//! Query vocabulary for locating elements on a surface

use serde::{Deserialize, Serialize};
use std::fmt;

/// Accessible role of an element, as used by role-based queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Heading,
    Button,
    Link,
    Radio,
    Checkbox,
    Textbox,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Heading => "heading",
            Role::Button => "button",
            Role::Link => "link",
            Role::Radio => "radio",
            Role::Checkbox => "checkbox",
            Role::Textbox => "textbox",
        }
    }
}

/// How an accessible name or label is compared against candidate text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "text", rename_all = "lowercase")]
pub enum TextMatch {
    /// Whole text equal after trimming
    Exact(String),
    /// Case-insensitive substring
    Contains(String),
}

impl TextMatch {
    pub fn exact(text: impl Into<String>) -> Self {
        TextMatch::Exact(text.into())
    }

    pub fn contains(text: impl Into<String>) -> Self {
        TextMatch::Contains(text.into())
    }

    pub fn text(&self) -> &str {
        match self {
            TextMatch::Exact(t) | TextMatch::Contains(t) => t,
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = normalize_whitespace(candidate);
        match self {
            TextMatch::Exact(expected) => candidate == normalize_whitespace(expected),
            TextMatch::Contains(needle) => candidate
                .to_lowercase()
                .contains(&normalize_whitespace(needle).to_lowercase()),
        }
    }
}

fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Element query. Actions always target the first match in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// Element with an accessible role and name
    Role { role: Role, name: TextMatch },
    /// Form control associated with a label
    Label { label: TextMatch },
    /// Raw CSS selector
    Css { selector: String },
    /// CSS selector filtered to elements whose text contains `text`
    CssWithText { selector: String, text: String },
    /// Value cell (`dd`) following the term (`dt`) whose text contains `term`
    DescriptionValue { term: String },
    /// The document body
    Body,
}

impl Locator {
    pub fn role(role: Role, name: TextMatch) -> Self {
        Locator::Role { role, name }
    }

    /// Heading whose accessible name contains `name` (case-insensitive).
    pub fn heading(name: impl Into<String>) -> Self {
        Locator::Role {
            role: Role::Heading,
            name: TextMatch::contains(name),
        }
    }

    pub fn button(name: TextMatch) -> Self {
        Locator::Role {
            role: Role::Button,
            name,
        }
    }

    pub fn link(name: TextMatch) -> Self {
        Locator::Role {
            role: Role::Link,
            name,
        }
    }

    pub fn radio(name: TextMatch) -> Self {
        Locator::Role {
            role: Role::Radio,
            name,
        }
    }

    pub fn label(label: TextMatch) -> Self {
        Locator::Label { label }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
        }
    }

    pub fn css_with_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::CssWithText {
            selector: selector.into(),
            text: text.into(),
        }
    }

    pub fn description_value(term: impl Into<String>) -> Self {
        Locator::DescriptionValue { term: term.into() }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Role { role, name } => write!(f, "{}[name~={:?}]", role.as_str(), name.text()),
            Locator::Label { label } => write!(f, "label~={:?}", label.text()),
            Locator::Css { selector } => f.write_str(selector),
            Locator::CssWithText { selector, text } => {
                write!(f, "{selector}:has-text({text:?})")
            }
            Locator::DescriptionValue { term } => write!(f, "dt:has-text({term:?}) + dd"),
            Locator::Body => f.write_str("body"),
        }
    }
}

/// Element condition awaited by [`wait_for`](crate::wait_for).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementState {
    /// Present in the document
    Attached,
    /// Present and rendered
    #[default]
    Visible,
}
