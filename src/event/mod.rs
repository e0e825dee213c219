//! Event handling module
//!
//! Keyboard input, settled provider results, and the main draw loop.

mod handlers;

use crate::{app::AppState, config, ui::render};
use color_eyre::eyre::Result;
use crossterm::{
    cursor::SetCursorStyle,
    event::{self, Event, KeyModifiers},
};
use handlers::{handle_main_view, handle_password_popup};
use ratatui::DefaultTerminal;
use std::time::Duration;

pub async fn run(mut terminal: DefaultTerminal, state: &mut AppState) -> Result<()> {
    crossterm::execute!(std::io::stdout(), SetCursorStyle::BlinkingBlock)?;

    loop {
        terminal.draw(|frame| render(frame, state))?;

        // Fold settled provider results into the session
        let notices = state.session.poll();
        if let Some(notice) = notices.into_iter().last() {
            state.ui.notice = Some(notice);
        }
        state.clamp_selection();

        if event::poll(Duration::from_millis(config::EVENT_POLL_MS))? {
            if let Event::Key(key) = event::read()?
                && key.kind == event::KeyEventKind::Press
            {
                // Any key dismisses the last notice
                if state.ui.notice.is_some() {
                    state.ui.notice = None;
                }

                if key.code == event::KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    break;
                }

                let should_quit = if state.ui.show_password_popup {
                    handle_password_popup(key, state)
                } else {
                    handle_main_view(key, state)
                };
                if should_quit {
                    break;
                }
            }
        } else if state.session.scanning() || state.session.link_busy() {
            state.ui.loading_frame = state.ui.loading_frame.wrapping_add(1);
        }
    }
    Ok(())
}
