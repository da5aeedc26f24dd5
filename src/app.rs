use ratatui::widgets::ListState;

use crate::controller::{Command, FeedState, View};
use crate::source::{Country, EnrichedArticle};

/// Front-end state: the latest [`FeedState`] from the controller plus what
/// only the terminal cares about (row selection, quit flag).
pub struct App {
    pub state: FeedState,
    /// Selected row within the current page.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
}

impl App {
    pub fn new(state: FeedState) -> Self {
        let mut app = Self {
            state,
            list_state: ListState::default(),
            quit: false,
        };
        app.clamp_selection();
        app
    }

    /// Swap in a newer controller state, keeping the selection on the page.
    pub fn update(&mut self, state: FeedState) {
        let page_changed =
            state.current_page != self.state.current_page || state.view != self.state.view;
        self.state = state;
        if page_changed {
            self.list_state.select(None);
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.state.page().len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn selected_article(&self) -> Option<&EnrichedArticle> {
        self.list_state
            .selected()
            .and_then(|i| self.state.page().get(i))
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        let len = self.state.page().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.state.page().is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    // -- tabs ----------------------------------------------------------------

    /// Index of the active tab: one per country, favorites last.
    pub fn tab_index(&self) -> usize {
        match self.state.view {
            View::Country(c) => c.index(),
            View::Favorites => Country::ALL.len(),
        }
    }

    /// Command that activates the tab `step` positions away, wrapping.
    pub fn tab_command(&self, step: isize) -> Command {
        let tabs = Country::ALL.len() as isize + 1;
        let next = (self.tab_index() as isize + step).rem_euclid(tabs) as usize;
        match Country::ALL.get(next) {
            Some(c) => Command::SelectCountry(*c),
            None => Command::SelectFavorites,
        }
    }
}
