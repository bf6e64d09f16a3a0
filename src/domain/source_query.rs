//! Practice source query normalization
//!
//! The practice flow scrapes one of three public review sites. Users may paste
//! either a full page URL or a plain title; the backend scraper wants the
//! canonical slug (or a readable title recovered from it).

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

static TRUSTPILOT_REVIEW: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)/review/([^/?#]+)").ok());
static ROTTEN_TOMATOES_MOVIE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)/m/([^/?#]+)").ok());
static GOODREADS_BOOK: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)/book/show/([^/?#]+)").ok());

/// External review site supported by the practice flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeSource {
    Trustpilot,
    RottenTomatoes,
    Goodreads,
}

impl PracticeSource {
    pub const ALL: [Self; 3] = [Self::Trustpilot, Self::RottenTomatoes, Self::Goodreads];

    /// Identifier sent to the backend as `source`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trustpilot => "trustpilot",
            Self::RottenTomatoes => "rottentomatoes",
            Self::Goodreads => "goodreads",
        }
    }

    fn slug_pattern(self) -> Option<&'static Regex> {
        match self {
            Self::Trustpilot => TRUSTPILOT_REVIEW.as_ref(),
            Self::RottenTomatoes => ROTTEN_TOMATOES_MOVIE.as_ref(),
            Self::Goodreads => GOODREADS_BOOK.as_ref(),
        }
    }

    /// Trustpilot slugs are domain names and must keep their hyphens
    fn slug_is_title(self) -> bool {
        !matches!(self, Self::Trustpilot)
    }
}

impl fmt::Display for PracticeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown practice source '{0}' (expected trustpilot, rottentomatoes or goodreads)")]
pub struct UnknownSourceError(pub String);

impl FromStr for PracticeSource {
    type Err = UnknownSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trustpilot" => Ok(Self::Trustpilot),
            "rottentomatoes" | "rotten-tomatoes" | "rotten_tomatoes" => Ok(Self::RottenTomatoes),
            "goodreads" => Ok(Self::Goodreads),
            other => Err(UnknownSourceError(other.to_string())),
        }
    }
}

/// Produce the canonical query for `source` from raw user input.
///
/// Only `http(s)://` input is parsed; a matching path yields the slug (with
/// hyphens turned into spaces for title-like sources). Anything else,
/// including malformed URLs, falls back to the trimmed input. Blank input
/// yields an empty string, which callers must reject themselves.
pub fn normalize_query(source: PracticeSource, input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if has_http_scheme(trimmed) {
        if let Some(slug) = extract_slug(source, trimmed) {
            return slug;
        }
    }

    trimmed.to_string()
}

fn has_http_scheme(text: &str) -> bool {
    let lowered = text.get(..8).unwrap_or(text).to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

fn extract_slug(source: PracticeSource, raw_url: &str) -> Option<String> {
    let parsed = Url::parse(raw_url).ok()?;
    let captures = source.slug_pattern()?.captures(parsed.path())?;
    let slug = captures.get(1)?.as_str();

    let query = if source.slug_is_title() {
        slug.replace('-', " ").trim().to_string()
    } else {
        slug.to_string()
    };
    (!query.is_empty()).then_some(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(PracticeSource::Trustpilot, "https://www.trustpilot.com/review/example.com", "example.com")]
    #[case(PracticeSource::Trustpilot, "https://www.trustpilot.com/review/my-shop.co.uk?page=2", "my-shop.co.uk")]
    #[case(PracticeSource::RottenTomatoes, "https://www.rottentomatoes.com/m/the-matrix", "the matrix")]
    #[case(PracticeSource::RottenTomatoes, "HTTPS://www.rottentomatoes.com/M/dune-part-two/reviews", "dune part two")]
    #[case(PracticeSource::Goodreads, "https://www.goodreads.com/book/show/44767458-dune", "44767458 dune")]
    fn extracts_slug_from_source_urls(
        #[case] source: PracticeSource,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(normalize_query(source, input), expected);
    }

    #[test]
    fn plain_titles_pass_through() {
        assert_eq!(normalize_query(PracticeSource::Goodreads, "dune"), "dune");
        assert_eq!(normalize_query(PracticeSource::RottenTomatoes, "  the-matrix  "), "the-matrix");
    }

    #[test]
    fn non_matching_url_falls_back_to_input() {
        let url = "https://www.rottentomatoes.com/tv/severance";
        assert_eq!(normalize_query(PracticeSource::RottenTomatoes, url), url);
        // Path pattern belongs to a different source
        let tp = "https://www.trustpilot.com/review/example.com";
        assert_eq!(normalize_query(PracticeSource::Goodreads, tp), tp);
    }

    #[test]
    fn malformed_url_falls_back_to_trimmed_input() {
        assert_eq!(
            normalize_query(PracticeSource::Trustpilot, "  https://exa mple.com/review/x  "),
            "https://exa mple.com/review/x"
        );
        assert_eq!(normalize_query(PracticeSource::Trustpilot, "https://"), "https://");
    }

    #[test]
    fn blank_input_normalizes_to_empty() {
        assert_eq!(normalize_query(PracticeSource::Trustpilot, ""), "");
        assert_eq!(normalize_query(PracticeSource::Goodreads, " \t\n"), "");
    }

    #[test]
    fn parses_source_names() {
        assert_eq!("Trustpilot".parse::<PracticeSource>(), Ok(PracticeSource::Trustpilot));
        assert_eq!("rotten-tomatoes".parse::<PracticeSource>(), Ok(PracticeSource::RottenTomatoes));
        assert!("imdb".parse::<PracticeSource>().is_err());
        for source in PracticeSource::ALL {
            assert_eq!(source.as_str().parse::<PracticeSource>(), Ok(source));
        }
    }

    proptest! {
        #[test]
        fn never_panics_and_stays_trimmed(input in ".{0,64}") {
            for source in PracticeSource::ALL {
                let out = normalize_query(source, &input);
                prop_assert_eq!(out.trim(), out.as_str());
            }
        }
    }
}
