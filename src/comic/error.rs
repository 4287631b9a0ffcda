//! Error types for page parsing.

use thiserror::Error;

/// Structural problems found while reading a comic or chapter page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A required element was not present on the page.
    #[error("missing {what} (selector `{selector}`)")]
    MissingElement {
        /// What the element holds, e.g. "comic title".
        what: &'static str,
        /// CSS selector that matched nothing.
        selector: &'static str,
    },

    /// An element was present but lacked a required attribute.
    #[error("{what} has no `{attribute}` attribute")]
    MissingAttribute {
        /// What the element holds.
        what: &'static str,
        /// Attribute that was expected.
        attribute: &'static str,
    },

    /// A link on the page could not be resolved to an absolute URL.
    #[error("cannot resolve link '{link}' against '{base}': {reason}")]
    InvalidLink {
        /// Link as it appears on the page.
        link: String,
        /// Base URL used for resolution.
        base: String,
        /// Parser message.
        reason: String,
    },
}

impl ParseError {
    /// Creates a `MissingElement` error.
    #[must_use]
    pub fn missing_element(what: &'static str, selector: &'static str) -> Self {
        Self::MissingElement { what, selector }
    }

    /// Creates a `MissingAttribute` error.
    #[must_use]
    pub fn missing_attribute(what: &'static str, attribute: &'static str) -> Self {
        Self::MissingAttribute { what, attribute }
    }

    /// Creates an `InvalidLink` error.
    #[must_use]
    pub fn invalid_link(link: &str, base: &str, reason: impl ToString) -> Self {
        Self::InvalidLink {
            link: link.to_string(),
            base: base.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_element_names_selector() {
        let err = ParseError::missing_element("comic title", ".detail-main-info-title");
        let msg = err.to_string();
        assert!(msg.contains("comic title"));
        assert!(msg.contains(".detail-main-info-title"));
    }

    #[test]
    fn test_invalid_link_message() {
        let err = ParseError::invalid_link("::", "nope", "relative URL without a base");
        assert!(err.to_string().contains("'::'"));
    }
}
