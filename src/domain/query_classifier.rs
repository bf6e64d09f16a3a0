//! Free-text input classification
//!
//! Decides whether what the user typed is a product URL that can be analyzed
//! directly or a product name that should go through the cross-platform search.

use serde::{Deserialize, Serialize};
use url::Url;

/// Marketplace domains recognized even when the pasted text is not a valid URL
/// (e.g. `amazon.com/dp/B0...` without a scheme).
pub const MARKETPLACE_HINTS: [&str; 3] = ["amazon.com", "ebay.com", "mercadolibre"];

/// Result of classifying a piece of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Text points at a concrete product page
    DirectUrl,
    /// Text is a product name to search for
    SearchQuery,
}

impl InputKind {
    pub fn is_direct_url(self) -> bool {
        matches!(self, Self::DirectUrl)
    }
}

/// Classify user input. Never fails: anything that is not recognizably a URL
/// is treated as a search query.
pub fn classify_input(text: &str) -> InputKind {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return InputKind::SearchQuery;
    }

    if parses_as_absolute_url(trimmed) {
        return InputKind::DirectUrl;
    }

    let lowered = trimmed.to_lowercase();
    if MARKETPLACE_HINTS.iter().any(|hint| lowered.contains(hint)) {
        InputKind::DirectUrl
    } else {
        InputKind::SearchQuery
    }
}

/// Convenience wrapper over [`classify_input`].
pub fn is_direct_url(text: &str) -> bool {
    classify_input(text).is_direct_url()
}

// Any absolute URL counts, hostless schemes (`mailto:`, `urn:`) included.
fn parses_as_absolute_url(text: &str) -> bool {
    Url::parse(text).is_ok()
}
