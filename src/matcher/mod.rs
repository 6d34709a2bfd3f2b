//! Phrase matching over fetched page text.

pub mod normalize;

pub use normalize::normalize;

/// Returns whether `needle` occurs in `page` after both are normalized.
pub fn contains(page: &str, needle: &str) -> bool {
    normalize(page).contains(&normalize(needle))
}

/// A search phrase with its normalized form computed once.
///
/// Sweeps check many pages against the same phrase, so the needle side of
/// [`contains`] is cached here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    raw: String,
    normalized: String,
}

impl Phrase {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
        }
    }

    /// The phrase as the user typed it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Same result as `contains(page, self.raw())`.
    pub fn found_in(&self, page: &str) -> bool {
        normalize(page).contains(&self.normalized)
    }
}
