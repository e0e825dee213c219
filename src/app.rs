use std::sync::Arc;

use ratatui::widgets::ListState;

use crate::config::IconSet;
use crate::input::InputState;
use crate::provider::WifiProvider;
use crate::session::{Notice, Session};

/// UI-facing flags and widget state
#[derive(Debug, Default)]
pub struct UiState {
    pub l_state: ListState,
    pub show_password_popup: bool,
    pub notice: Option<Notice>,
    pub icons: IconSet,
    pub loading_frame: usize,
}

#[derive(Debug, Default)]
pub struct InputsState {
    pub password_input: InputState,
}

pub struct AppState {
    pub session: Session,
    pub ui: UiState,
    pub inputs: InputsState,
}

impl AppState {
    pub fn new(provider: Arc<dyn WifiProvider>, icons: IconSet) -> AppState {
        AppState {
            session: Session::new(provider),
            ui: UiState {
                l_state: ListState::default().with_selected(Some(0)),
                icons,
                ..UiState::default()
            },
            inputs: InputsState::default(),
        }
    }

    pub fn next(&mut self) {
        let i = match self.ui.l_state.selected() {
            Some(i) => {
                if i >= self.session.discovered.len().saturating_sub(1) {
                    i
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.ui.l_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let i = match self.ui.l_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.ui.l_state.select(Some(i));
    }

    pub fn go_to_top(&mut self) {
        if !self.session.discovered.is_empty() {
            self.ui.l_state.select(Some(0));
        }
    }

    pub fn go_to_bottom(&mut self) {
        if !self.session.discovered.is_empty() {
            self.ui.l_state.select(Some(self.session.discovered.len() - 1));
        }
    }

    /// Keep the highlight inside the list after `discovered` was replaced
    pub fn clamp_selection(&mut self) {
        if let Some(selected) = self.ui.l_state.selected()
            && selected >= self.session.discovered.len()
        {
            self.ui.l_state.select(Some(0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockProvider, NetworkRecord};

    fn record(ssid: &str) -> NetworkRecord {
        NetworkRecord {
            ssid: ssid.to_string(),
            bssid: "00:00:00:00:00:00".to_string(),
            capabilities: "WPA2-PSK/AES".to_string(),
            frequency: 2412,
            level: -50,
            timestamp: 0,
        }
    }

    fn app_with(count: usize) -> AppState {
        let mut app = AppState::new(Arc::new(MockProvider::new()), IconSet::Ascii);
        app.session.discovered = (0..count).map(|i| record(&format!("net-{i}"))).collect();
        app
    }

    #[test]
    fn next_stops_at_the_last_row() {
        let mut app = app_with(2);
        app.next();
        app.next();
        app.next();
        assert_eq!(app.ui.l_state.selected(), Some(1));
    }

    #[test]
    fn previous_stops_at_the_first_row() {
        let mut app = app_with(2);
        app.previous();
        assert_eq!(app.ui.l_state.selected(), Some(0));
    }

    #[test]
    fn clamp_selection_resets_after_the_list_shrinks() {
        let mut app = app_with(5);
        app.go_to_bottom();
        app.session.discovered.truncate(2);
        app.clamp_selection();
        assert_eq!(app.ui.l_state.selected(), Some(0));
    }
}
