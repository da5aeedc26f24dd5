//! Keyboard input handling.
//!
//! Maps terminal key events to either a local [`App`] change (selection,
//! quit) or a [`Command`] for the controller.  Adding a new keybinding is a
//! single match arm in [`handle_key_event`].
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a `Command` variant (controller work) or an `App` method (local).
//! 2. Add a `KeyCode` match arm in [`handle_key_event`].
//! 3. Update the help text in [`crate::ui::draw_help_bar`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;
use crate::controller::Command;
use crate::source::Country;

/// Process a single key event.
///
/// Returns the command to send to the controller, if any.  Only key-press
/// events count, so each physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.quit = true;
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.select_next();
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.select_previous();
            None
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => Some(Command::NextPage),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => Some(Command::PrevPage),
        KeyCode::Tab => Some(app.tab_command(1)),
        KeyCode::BackTab => Some(app.tab_command(-1)),
        KeyCode::Char('r') => Some(Command::Refresh),
        KeyCode::Char('f') => Some(Command::SelectFavorites),
        KeyCode::Char(' ') | KeyCode::Enter => app
            .selected_article()
            .map(|a| Command::ToggleFavorite(a.raw.clone())),
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c as usize - '1' as usize;
            Country::ALL.get(idx).copied().map(Command::SelectCountry)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FeedState;
    use crate::source::{EnrichedArticle, RawArticle};
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_article() -> App {
        let mut s = FeedState::new(Country::Jp, 10);
        s.articles.push(EnrichedArticle {
            raw: RawArticle::new("A", "B"),
            translated_title: "a".into(),
            translated_description: "b".into(),
            is_favorite: false,
        });
        App::new(s)
    }

    #[test]
    fn q_quits_without_command() {
        let mut app = app_with_article();
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('q'))), None);
        assert!(app.quit);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = app_with_article();
        let key = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(handle_key_event(&mut app, key), None);
        assert!(!app.quit);
    }

    #[test]
    fn number_keys_select_countries() {
        let mut app = app_with_article();
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Char('2'))),
            Some(Command::SelectCountry(Country::Us))
        );
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('9'))), None);
    }

    #[test]
    fn space_toggles_selected_article() {
        let mut app = app_with_article();
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Char(' '))),
            Some(Command::ToggleFavorite(RawArticle::new("A", "B")))
        );
    }

    #[test]
    fn paging_and_refresh_keys() {
        let mut app = app_with_article();
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Right)), Some(Command::NextPage));
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Left)), Some(Command::PrevPage));
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('r'))), Some(Command::Refresh));
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Char('f'))),
            Some(Command::SelectFavorites)
        );
    }
}
