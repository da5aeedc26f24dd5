//! Raw headlines → translated, favorite-tagged articles.
//!
//! One pipeline run takes a list of [`RawArticle`]s and a snapshot of the
//! favorite set and returns one [`EnrichedArticle`] per input, in input order.
//! Translation failures never drop an article: the failing field keeps its
//! original text.
//!
//! Articles are translated through a bounded `buffered` stream.  With a
//! concurrency of 1 that is the strictly sequential loop the translation
//! service's rate limits were tuned for; higher values overlap requests while
//! `buffered` still yields results in submission order.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::favorites::FavoriteSet;
use crate::source::{EnrichedArticle, RawArticle};
use crate::translate::{TranslationError, Translator};

/// Shown instead of a translation when the article has no title.
pub const NO_TITLE: &str = "(no title)";
/// Shown instead of a translation when the article has no description.
pub const NO_DESCRIPTION: &str = "(no description)";

#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions {
    /// Articles translated at once.  0 is treated as 1.
    pub concurrency: usize,
    /// Upper bound for one translation call.
    pub timeout: Duration,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Run the pipeline over `raw`.
pub async fn enrich(
    raw: Vec<RawArticle>,
    favorites: &FavoriteSet,
    translator: &dyn Translator,
    opts: EnrichOptions,
) -> Vec<EnrichedArticle> {
    if raw.is_empty() {
        return Vec::new();
    }
    let total = raw.len();

    let enriched: Vec<EnrichedArticle> = stream::iter(raw)
        .map(|article| translate_article(article, translator, opts.timeout))
        .buffered(opts.concurrency.max(1))
        .map(|(raw, translated_title, translated_description)| EnrichedArticle {
            is_favorite: favorites.contains(&raw),
            raw,
            translated_title,
            translated_description,
        })
        .collect()
        .await;

    debug!(total, "pipeline run finished");
    enriched
}

/// Re-derive `is_favorite` for already-enriched articles without
/// translating again.
pub fn retag(articles: &mut [EnrichedArticle], favorites: &FavoriteSet) {
    for article in articles {
        article.is_favorite = favorites.contains(&article.raw);
    }
}

async fn translate_article(
    article: RawArticle,
    translator: &dyn Translator,
    timeout: Duration,
) -> (RawArticle, String, String) {
    let title = translate_field(translator, &article.title, NO_TITLE, timeout).await;
    let description =
        translate_field(translator, &article.description, NO_DESCRIPTION, timeout).await;
    (article, title, description)
}

async fn translate_field(
    translator: &dyn Translator,
    text: &str,
    placeholder: &str,
    timeout: Duration,
) -> String {
    if text.is_empty() {
        return placeholder.to_string();
    }
    let result = match tokio::time::timeout(timeout, translator.translate(text)).await {
        Ok(r) => r,
        Err(_) => Err(TranslationError::Timeout(timeout)),
    };
    match result {
        Ok(translated) => translated,
        Err(e) => {
            warn!(error = %e, "translation failed, keeping original text");
            text.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Upper-cases its input.  Fails on texts listed in `fail_on` and sleeps
    /// for `delay_for(text)` when set.
    #[derive(Default)]
    struct FakeTranslator {
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
        fail_on: Vec<&'static str>,
        delay_for: Option<fn(&str) -> Duration>,
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(&self, text: &str) -> Result<String, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            if let Some(delay) = self.delay_for {
                tokio::time::sleep(delay(text)).await;
            }
            if self.fail_on.iter().any(|f| *f == text) {
                return Err(TranslationError::Decode("boom".into()));
            }
            Ok(text.to_uppercase())
        }
    }

    fn slow_only(text: &str) -> Duration {
        if text == "slow" {
            Duration::from_millis(500)
        } else {
            Duration::ZERO
        }
    }

    fn earlier_is_slower(text: &str) -> Duration {
        let n: u64 = text.trim_start_matches(['t', 'd']).parse().unwrap_or(0);
        Duration::from_millis(60 - n * 10)
    }

    fn raw(title: &str, description: &str) -> RawArticle {
        RawArticle::new(title, description)
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let t = FakeTranslator::default();
        let out = enrich(vec![], &FavoriteSet::new(), &t, EnrichOptions::default()).await;
        assert!(out.is_empty());
        assert_eq!(t.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn translates_both_fields_in_input_order() {
        let t = FakeTranslator::default();
        let input = vec![raw("a", "b"), raw("c", "d"), raw("e", "f")];

        let out = enrich(input.clone(), &FavoriteSet::new(), &t, EnrichOptions::default()).await;

        let pairs: Vec<_> = out
            .iter()
            .map(|e| (e.translated_title.as_str(), e.translated_description.as_str()))
            .collect();
        assert_eq!(pairs, [("A", "B"), ("C", "D"), ("E", "F")]);
        assert_eq!(out.iter().map(|e| e.raw.clone()).collect::<Vec<_>>(), input);
        assert_eq!(
            *t.seen.lock().unwrap(),
            ["a", "b", "c", "d", "e", "f"],
            "sequential by default"
        );
    }

    #[tokio::test]
    async fn empty_description_uses_placeholder_without_calling_translator() {
        let t = FakeTranslator::default();

        let out = enrich(
            vec![raw("title", "")],
            &FavoriteSet::new(),
            &t,
            EnrichOptions::default(),
        )
        .await;

        assert_eq!(out[0].translated_description, NO_DESCRIPTION);
        assert_eq!(out[0].translated_title, "TITLE");
        assert_eq!(*t.seen.lock().unwrap(), ["title"]);
    }

    #[tokio::test]
    async fn empty_title_uses_placeholder() {
        let t = FakeTranslator::default();
        let none = FavoriteSet::new();
        let out = enrich(vec![raw("", "")], &none, &t, EnrichOptions::default()).await;
        assert_eq!(out[0].translated_title, NO_TITLE);
        assert_eq!(t.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_title_falls_back_to_original_verbatim() {
        let t = FakeTranslator {
            fail_on: vec!["Breaking: ünïcode"],
            ..Default::default()
        };

        let out = enrich(
            vec![raw("Breaking: ünïcode", "details"), raw("next", "item")],
            &FavoriteSet::new(),
            &t,
            EnrichOptions::default(),
        )
        .await;

        assert_eq!(out.len(), 2, "no article is dropped");
        assert_eq!(out[0].translated_title, "Breaking: ünïcode");
        assert_eq!(out[0].translated_description, "DETAILS", "sibling field still translated");
        assert_eq!(out[1].translated_title, "NEXT");
    }

    #[tokio::test]
    async fn slow_translation_times_out_to_original() {
        let t = FakeTranslator {
            delay_for: Some(slow_only as fn(&str) -> Duration),
            ..Default::default()
        };
        let opts = EnrichOptions {
            concurrency: 1,
            timeout: Duration::from_millis(30),
        };

        let out = enrich(vec![raw("slow", "fast")], &FavoriteSet::new(), &t, opts).await;

        assert_eq!(out[0].translated_title, "slow");
        assert_eq!(out[0].translated_description, "FAST");
    }

    #[tokio::test]
    async fn concurrent_run_preserves_input_order() {
        // Earlier items take longer, so they complete last.
        let t = FakeTranslator {
            delay_for: Some(earlier_is_slower as fn(&str) -> Duration),
            fail_on: vec!["t2"],
            ..Default::default()
        };
        let input: Vec<_> = (0..5).map(|i| raw(&format!("t{i}"), &format!("d{i}"))).collect();
        let opts = EnrichOptions {
            concurrency: 4,
            timeout: Duration::from_secs(5),
        };

        let out = enrich(input, &FavoriteSet::new(), &t, opts).await;

        let titles: Vec<_> = out.iter().map(|e| e.translated_title.as_str()).collect();
        assert_eq!(titles, ["T0", "T1", "t2", "T3", "T4"]);
    }

    #[tokio::test]
    async fn favorite_flag_follows_structural_membership() {
        let t = FakeTranslator::default();
        let favorites: FavoriteSet = vec![raw("a", "b")].into_iter().collect();

        let out = enrich(
            vec![raw("a", "b"), raw("a", "other"), raw("a", "b")],
            &favorites,
            &t,
            EnrichOptions::default(),
        )
        .await;

        let flags: Vec<_> = out.iter().map(|e| e.is_favorite).collect();
        assert_eq!(flags, [true, false, true]);
    }

    #[tokio::test]
    async fn retag_updates_flags_in_place() {
        let t = FakeTranslator::default();
        let none = FavoriteSet::new();
        let mut out = enrich(vec![raw("a", "b")], &none, &t, EnrichOptions::default()).await;
        assert!(!out[0].is_favorite);

        let favorites: FavoriteSet = vec![raw("a", "b")].into_iter().collect();
        retag(&mut out, &favorites);

        assert!(out[0].is_favorite);
        assert_eq!(out[0].translated_title, "A");
    }
}
