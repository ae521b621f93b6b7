//! Conversion of a search fragment into a bound `LIKE` pattern.

/// Escape character declared in the `ESCAPE` clause of every search query
pub const LIKE_ESCAPE: char = '\\';

/// A lower-cased `LIKE` pattern of the form `%fragment%`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPattern {
    fragment: String,
    like: String,
}

impl SearchPattern {
    /// Match the fragment literally: `%`, `_` and `\` lose their special meaning
    pub fn literal(fragment: &str) -> Self {
        let fragment = fragment.to_lowercase();
        let mut like = String::with_capacity(fragment.len() + 2);
        like.push('%');
        for c in fragment.chars() {
            if matches!(c, '%' | '_' | LIKE_ESCAPE) {
                like.push(LIKE_ESCAPE);
            }
            like.push(c);
        }
        like.push('%');
        SearchPattern { fragment, like }
    }

    /// Let `%` and `_` in the fragment act as `LIKE` wildcards
    pub fn wildcard(fragment: &str) -> Self {
        let fragment = fragment.to_lowercase();
        let like = format!("%{fragment}%");
        SearchPattern { fragment, like }
    }

    /// The lower-cased fragment as typed
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// The value bound to the query parameter
    pub fn as_like(&self) -> &str {
        &self.like
    }
}
