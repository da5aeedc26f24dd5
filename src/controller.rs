//! The feed controller: owner of [`FeedState`] and the only place it changes.
//!
//! ## State machine
//!
//! ```text
//!             select_country / refresh / timer_tick
//!   Idle ─┐   select_favorites
//!   Ready ├──────────────────────────► Loading ──► Ready  (articles, or an empty message)
//!   Error ┘                                    └─► Error  (fetch failed, list cleared)
//! ```
//!
//! State lives in a [`watch`] channel.  Every mutation goes through
//! `send_modify`/`send_if_modified`, which serialises writers, and
//! subscribers see each committed state.  Fetching and translating happen
//! outside that lock, so page navigation of what is already on screen keeps
//! working while a load is in flight.
//!
//! Each load takes a generation number in the same state update that switches
//! the view.  A load only commits its result if no newer load has started
//! since and its view is still the active one; a slow, superseded fetch is
//! dropped on the floor instead of overwriting a newer one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::favorites::{FavoriteSet, FavoriteStore, PersistenceError};
use crate::paginator;
use crate::pipeline::{self, EnrichOptions};
use crate::source::{Country, EnrichedArticle, FeedError, HeadlineSource, RawArticle};
use crate::translate::Translator;

/// Shown after a timer refresh replaced the visible articles.
pub const UPDATE_NOTICE: &str = "New articles available";
/// Status for a successful favorites load with nothing in it.
pub const NO_FAVORITES: &str = "No favorite articles yet";

/// Which tab is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Country(Country),
    Favorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct FeedState {
    pub view: View,
    /// Last selected country; the timer refreshes this feed.
    pub current_country: Country,
    pub current_page: usize,
    pub page_size: usize,
    pub articles: Vec<EnrichedArticle>,
    pub status: String,
    pub is_loading: bool,
    pub phase: Phase,
    /// Transient notification, cleared by the next user command.
    pub notice: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl FeedState {
    pub fn new(country: Country, page_size: usize) -> Self {
        Self {
            view: View::Country(country),
            current_country: country,
            current_page: 0,
            page_size,
            articles: Vec::new(),
            status: "Starting…".into(),
            is_loading: false,
            phase: Phase::Idle,
            notice: None,
            last_updated: None,
        }
    }

    /// Articles on the active page.
    pub fn page(&self) -> &[EnrichedArticle] {
        paginator::slice(&self.articles, self.current_page, self.page_size)
    }

    pub fn page_count(&self) -> usize {
        paginator::page_count(self.articles.len(), self.page_size)
    }

    /// Pagination controls are only shown when there is more than one page.
    pub fn show_pagination(&self) -> bool {
        self.articles.len() > self.page_size
    }

    pub fn page_label(&self) -> String {
        paginator::page_label(self.current_page, self.articles.len(), self.page_size)
    }

    fn clamp_page(&mut self) {
        let pages = self.page_count();
        if pages == 0 {
            self.current_page = 0;
        } else if self.current_page >= pages {
            self.current_page = pages - 1;
        }
    }
}

/// Commands accepted from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectCountry(Country),
    SelectFavorites,
    Refresh,
    NextPage,
    PrevPage,
    ToggleFavorite(RawArticle),
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub initial_country: Country,
    pub page_size: usize,
    pub enrich: EnrichOptions,
    /// Extra fetch attempts after a failure.
    pub fetch_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            initial_country: Country::default(),
            page_size: 10,
            enrich: EnrichOptions::default(),
            fetch_retries: 0,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_country: config.feed.default_country,
            page_size: config.display.page_size,
            enrich: config.enrich_options(),
            fetch_retries: config.feed.fetch_retries,
            retry_delay: config.retry_delay(),
        }
    }
}

pub struct FeedController {
    source: Arc<dyn HeadlineSource>,
    translator: Arc<dyn Translator>,
    favorites: Mutex<FavoriteStore>,
    state: watch::Sender<FeedState>,
    generation: AtomicU64,
    options: ControllerOptions,
}

impl FeedController {
    pub fn new(
        source: Arc<dyn HeadlineSource>,
        translator: Arc<dyn Translator>,
        favorites: FavoriteStore,
        options: ControllerOptions,
    ) -> Self {
        let initial = FeedState::new(options.initial_country, options.page_size.max(1));
        let (state, _) = watch::channel(initial);
        Self {
            source,
            translator,
            favorites: Mutex::new(favorites),
            state,
            generation: AtomicU64::new(0),
            options,
        }
    }

    /// Receive every committed [`FeedState`].
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub async fn dispatch(&self, command: Command) {
        match command {
            Command::SelectCountry(c) => self.select_country(c).await,
            Command::SelectFavorites => self.select_favorites().await,
            Command::Refresh => self.refresh().await,
            Command::NextPage => {
                self.next_page();
            }
            Command::PrevPage => {
                self.prev_page();
            }
            Command::ToggleFavorite(article) => {
                // The failure is already reflected in the status line.
                let _ = self.toggle_favorite(article).await;
            }
        }
    }

    // -- commands ------------------------------------------------------------

    pub async fn select_country(&self, country: Country) {
        let (generation, _) = self.begin_load(|_| View::Country(country));
        self.load_country(generation, country, false).await;
    }

    /// Reload the selected country feed.
    pub async fn refresh(&self) {
        let mut country = Country::default();
        let (generation, _) = self.begin_load(|s| {
            country = s.current_country;
            View::Country(country)
        });
        self.load_country(generation, country, false).await;
    }

    pub async fn select_favorites(&self) {
        let (generation, _) = self.begin_load(|_| View::Favorites);
        let favorites = self.favorites.lock().await.snapshot();
        self.show_favorites(generation, favorites, Vec::new()).await;
    }

    /// Periodic refresh of the selected country feed.
    ///
    /// Skipped while the favorites tab is active.
    pub async fn timer_tick(&self) {
        let claimed = self.try_begin_load(|s| match s.view {
            View::Country(country) => Some(View::Country(country)),
            View::Favorites => None,
        });
        match claimed {
            Some((generation, View::Country(country))) => {
                self.load_country(generation, country, true).await;
            }
            _ => debug!("timer tick skipped on favorites view"),
        }
    }

    pub fn next_page(&self) -> usize {
        self.change_page(1)
    }

    pub fn prev_page(&self) -> usize {
        self.change_page(-1)
    }

    /// Flip the favorite status of `article` and persist it.
    ///
    /// On a failed save the flip is undone, the status line reports the
    /// error, and the error is returned.  In the favorites view the list is
    /// rebuilt; elsewhere only the flags of visible articles change.
    pub async fn toggle_favorite(&self, article: RawArticle) -> Result<bool, PersistenceError> {
        let (now_favorite, snapshot) = {
            let mut store = self.favorites.lock().await;
            match store.toggle_and_save(&article).await {
                Ok(now) => (now, store.snapshot()),
                Err(e) => {
                    error!(error = %e, "failed to save favorites");
                    self.state.send_modify(|s| {
                        s.status = format!("Could not save favorites: {e}");
                        s.notice = None;
                    });
                    return Err(e);
                }
            }
        };
        info!(title = %article.title, favorite = now_favorite, "favorite toggled");

        // Either rebuild the favorites list under a fresh generation or
        // retag in place, decided under the same lock as the view.
        let mut rerun = None;
        self.state.send_modify(|s| {
            s.notice = None;
            if s.view == View::Favorites {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                rerun = Some((generation, s.articles.clone()));
            } else {
                pipeline::retag(&mut s.articles, &snapshot);
            }
        });
        if let Some((generation, known)) = rerun {
            self.show_favorites(generation, snapshot, known).await;
        }
        Ok(now_favorite)
    }

    // -- internals -----------------------------------------------------------

    fn change_page(&self, delta: isize) -> usize {
        let mut page = 0;
        self.state.send_modify(|s| {
            s.current_page =
                paginator::change_page(s.current_page, delta, s.articles.len(), s.page_size);
            s.notice = None;
            page = s.current_page;
        });
        page
    }

    /// Enter `Loading` for the view chosen by `target`.
    fn begin_load(&self, target: impl FnOnce(&FeedState) -> View) -> (u64, View) {
        let mut claimed = (0, View::Favorites);
        self.state.send_modify(|s| {
            let view = target(&*s);
            claimed = (self.claim(s, view), view);
        });
        claimed
    }

    /// Like [`begin_load`](Self::begin_load), but leaves the state untouched
    /// when `target` declines.
    fn try_begin_load(
        &self,
        target: impl FnOnce(&FeedState) -> Option<View>,
    ) -> Option<(u64, View)> {
        let mut claimed = None;
        self.state.send_if_modified(|s| match target(&*s) {
            Some(view) => {
                claimed = Some((self.claim(s, view), view));
                true
            }
            None => false,
        });
        claimed
    }

    /// Switch to `view`, clear the list and take a new generation.  Only
    /// called with the state lock held.
    fn claim(&self, s: &mut FeedState, view: View) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        s.view = view;
        s.status = match view {
            View::Country(country) => {
                s.current_country = country;
                format!("Fetching news for {country}…")
            }
            View::Favorites => "Loading favorites…".to_string(),
        };
        s.articles.clear();
        s.current_page = 0;
        s.phase = Phase::Loading;
        s.is_loading = true;
        s.notice = None;
        generation
    }

    /// Apply `f` only if `generation` is still the newest load and `view`
    /// is still on screen.
    fn commit(&self, generation: u64, view: View, f: impl FnOnce(&mut FeedState)) -> bool {
        self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation || s.view != view {
                return false;
            }
            f(s);
            true
        })
    }

    async fn load_country(&self, generation: u64, country: Country, from_timer: bool) -> bool {
        let view = View::Country(country);

        let raw = match self.fetch_with_retry(country).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%country, error = %e, "fetch failed");
                return self.commit(generation, view, |s| {
                    s.phase = Phase::Error;
                    s.is_loading = false;
                    s.status = format!("Failed to fetch news: {e}");
                });
            }
        };

        if raw.is_empty() {
            return self.commit(generation, view, |s| {
                s.phase = Phase::Ready;
                s.is_loading = false;
                s.status = format!("No articles found for {country}");
                s.last_updated = Some(Utc::now());
            });
        }

        let total = raw.len();
        let translating = self.commit(generation, view, |s| {
            s.status = format!("Translating {total} articles…");
        });
        if !translating {
            debug!(%country, "load superseded before translation");
            return false;
        }

        let favorites = self.favorites.lock().await.snapshot();
        let articles =
            pipeline::enrich(raw, &favorites, self.translator.as_ref(), self.options.enrich).await;

        let applied = self.commit(generation, view, |s| {
            s.articles = articles;
            s.current_page = 0;
            s.phase = Phase::Ready;
            s.is_loading = false;
            s.status = format!("{total} articles fetched");
            s.last_updated = Some(Utc::now());
            if from_timer {
                s.notice = Some(UPDATE_NOTICE.to_string());
            }
        });
        if applied {
            info!(%country, total, "feed loaded");
        } else {
            debug!(%country, "discarding superseded load");
        }
        applied
    }

    async fn fetch_with_retry(&self, country: Country) -> Result<Vec<RawArticle>, FeedError> {
        let mut attempt = 0;
        loop {
            match self.source.fetch(country).await {
                Ok(raw) => return Ok(raw),
                Err(e) if attempt < self.options.fetch_retries => {
                    attempt += 1;
                    warn!(%country, attempt, error = %e, "fetch failed, retrying");
                    tokio::time::sleep(self.options.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Build the favorites list, reusing translations from `known` where
    /// the article is already enriched.  Entries whose translation fell
    /// back to the source text are translated again.
    async fn show_favorites(
        &self,
        generation: u64,
        favorites: FavoriteSet,
        known: Vec<EnrichedArticle>,
    ) {
        if favorites.is_empty() {
            self.commit(generation, View::Favorites, |s| {
                s.articles.clear();
                s.current_page = 0;
                s.phase = Phase::Ready;
                s.is_loading = false;
                s.status = NO_FAVORITES.to_string();
            });
            return;
        }

        let mut cache: HashMap<RawArticle, EnrichedArticle> = known
            .into_iter()
            .filter(is_fully_translated)
            .map(|a| (a.raw.clone(), a))
            .collect();
        let missing: Vec<RawArticle> = favorites
            .iter()
            .filter(|a| !cache.contains_key(*a))
            .cloned()
            .collect();
        let fresh = pipeline::enrich(
            missing,
            &favorites,
            self.translator.as_ref(),
            self.options.enrich,
        )
        .await;
        for article in fresh {
            cache.insert(article.raw.clone(), article);
        }

        let articles: Vec<EnrichedArticle> = favorites
            .iter()
            .filter_map(|raw| cache.remove(raw))
            .map(|mut a| {
                a.is_favorite = true;
                a
            })
            .collect();
        let total = articles.len();

        self.commit(generation, View::Favorites, |s| {
            s.articles = articles;
            s.clamp_page();
            s.phase = Phase::Ready;
            s.is_loading = false;
            s.status = format!("{total} favorite articles");
            s.last_updated = Some(Utc::now());
        });
    }
}

/// False when either field still shows its untranslated source text.
fn is_fully_translated(article: &EnrichedArticle) -> bool {
    let untouched = |source: &str, translated: &str| !source.is_empty() && source == translated;
    !untouched(&article.raw.title, &article.translated_title)
        && !untouched(&article.raw.description, &article.translated_description)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
