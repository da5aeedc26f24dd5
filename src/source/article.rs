//! The article types shared by every stage of the pipeline.
//!
//! `RawArticle` is what a headline source hands back; `EnrichedArticle` is what
//! the UI draws.  A raw article has no surrogate key: two provider items with
//! the same title and description are the same article everywhere
//! (favorites, re-tagging, lookups).
//!
//! ## For contributors
//!
//! Do **not** add an id field here.  Favorite matching depends on
//! structural equality, including its false positives on coincidental
//! duplicates.

use serde::{Deserialize, Serialize};

/// A headline as supplied by the provider.
///
/// This is also the on-disk record of the favorites file, so the serde shape
/// (`{"title": .., "description": ..}`) is part of the file format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub description: String,
}

impl RawArticle {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// A raw article plus its translation and favorite flag, ready for display.
///
/// Rebuilt on every pipeline run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedArticle {
    pub raw: RawArticle,
    pub translated_title: String,
    pub translated_description: String,
    pub is_favorite: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_title_plus_description() {
        let a = RawArticle::new("Quake", "M6.1 off the coast");
        let b = RawArticle::new("Quake", "M6.1 off the coast");
        let c = RawArticle::new("Quake", "M5.0 inland");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn serializes_as_plain_title_description_record() {
        let a = RawArticle::new("東京", "晴れ");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"title":"東京","description":"晴れ"}"#);
    }

    #[test]
    fn deserialize_ignores_extra_fields() {
        let a: RawArticle =
            serde_json::from_str(r#"{"title":"T","description":"D","url":"https://x"}"#).unwrap();
        assert_eq!(a, RawArticle::new("T", "D"));
    }
}
