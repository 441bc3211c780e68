//! Genre intent detection for free-text queries.

use crate::config::GENRE_VOCABULARY;

/// Finds known genre tokens in a query.
///
/// Matching is case-insensitive substring containment, so "warm" matches
/// "war" and "musical" also matches "music".
///
/// # Examples
///
/// ```
/// use marquee_core::search::IntentExtractor;
///
/// let intent = IntentExtractor::new();
/// assert_eq!(intent.extract_genres("dark SCI-FI thriller"), vec!["Sci-Fi", "Thriller"]);
/// ```
#[derive(Debug, Clone)]
pub struct IntentExtractor {
    vocabulary: Vec<String>,
}

impl IntentExtractor {
    /// Extractor over the built-in genre vocabulary.
    pub fn new() -> Self {
        Self::with_vocabulary(GENRE_VOCABULARY.iter().copied())
    }

    /// Extractor over a custom vocabulary. Tokens are lowercased; order is
    /// kept and determines result order.
    pub fn with_vocabulary<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim().to_lowercase();
            if !token.is_empty() && !vocabulary.contains(&token) {
                vocabulary.push(token);
            }
        }
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Genres mentioned in `query`, title-cased, in vocabulary order.
    pub fn extract_genres(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        self.vocabulary
            .iter()
            .filter(|token| query.contains(token.as_str()))
            .map(|token| title_case(token))
            .collect()
    }
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Capitalizes each hyphen-separated segment: "film-noir" -> "Film-Noir".
pub fn title_case(token: &str) -> String {
    token
        .split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}
