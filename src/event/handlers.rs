use crate::app::AppState;
use crossterm::event::{self, KeyEvent, KeyModifiers};

/// Keys for the credential popup. Connect closes the popup immediately;
/// the result lands on the notice line whenever it settles.
pub fn handle_password_popup(key: KeyEvent, state: &mut AppState) -> bool {
    match key.code {
        event::KeyCode::Enter => {
            let password = state.inputs.password_input.submit();
            state.session.start_connect(password);
            state.ui.show_password_popup = false;
        }
        event::KeyCode::Esc => {
            state.ui.show_password_popup = false;
            state.inputs.password_input.clear();
            state.session.clear_selection();
        }
        event::KeyCode::Char('[') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.ui.show_password_popup = false;
            state.inputs.password_input.clear();
            state.session.clear_selection();
        }
        _ => {
            state.inputs.password_input.handle_key(&key);
        }
    }
    false
}

/// Keys for the main view (network list)
pub fn handle_main_view(key: KeyEvent, state: &mut AppState) -> bool {
    match key.code {
        event::KeyCode::Char('q') => return true,
        event::KeyCode::Char('j') | event::KeyCode::Down => state.next(),
        event::KeyCode::Char('k') | event::KeyCode::Up => state.previous(),
        event::KeyCode::Char('g') | event::KeyCode::Home => state.go_to_top(),
        event::KeyCode::Char('G') | event::KeyCode::End => state.go_to_bottom(),
        event::KeyCode::Char('s') | event::KeyCode::Char('r') => {
            state.session.start_scan();
        }
        event::KeyCode::Enter => {
            if let Some(selected) = state.ui.l_state.selected()
                && let Some(record) = state.session.discovered.get(selected).cloned()
            {
                state.session.select(record);
                state.inputs.password_input.clear();
                state.ui.show_password_popup = true;
            }
        }
        event::KeyCode::Char('d') => {
            // Offered only while a connection is tracked; the session does
            // not enforce this itself.
            if state.session.connected_ssid.is_some() && !state.session.link_busy() {
                state.session.start_disconnect();
            }
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IconSet;
    use crate::provider::{MockProvider, NetworkRecord, WifiProvider};
    use crossterm::event::{KeyCode, KeyEventKind, KeyEventState};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn record(ssid: &str) -> NetworkRecord {
        NetworkRecord {
            ssid: ssid.to_string(),
            bssid: "aa:bb:cc".to_string(),
            capabilities: "WPA2-PSK/AES".to_string(),
            frequency: 2412,
            level: -40,
            timestamp: 1000,
        }
    }

    #[tokio::test]
    async fn enter_on_a_row_opens_the_popup_with_that_selection() {
        let provider = Arc::new(MockProvider::new());
        let mut state = AppState::new(
            Arc::clone(&provider) as Arc<dyn WifiProvider>,
            IconSet::Ascii,
        );
        state.session.discovered = vec![record("CafeNet"), record("Other")];
        state.inputs.password_input.insert('x');

        handle_main_view(key(KeyCode::Enter), &mut state);

        assert!(state.ui.show_password_popup);
        assert_eq!(
            state.session.selected.as_ref().map(|r| r.ssid.as_str()),
            Some("CafeNet")
        );
        assert_eq!(state.inputs.password_input.value, "");
    }

    #[tokio::test]
    async fn enter_on_an_empty_list_does_nothing() {
        let provider = Arc::new(MockProvider::new());
        let mut state = AppState::new(
            Arc::clone(&provider) as Arc<dyn WifiProvider>,
            IconSet::Ascii,
        );

        handle_main_view(key(KeyCode::Enter), &mut state);

        assert!(!state.ui.show_password_popup);
        assert_eq!(state.session.selected, None);
    }

    #[tokio::test]
    async fn popup_escape_clears_password_and_selection() {
        let provider = Arc::new(MockProvider::new());
        let mut state = AppState::new(
            Arc::clone(&provider) as Arc<dyn WifiProvider>,
            IconSet::Ascii,
        );
        state.session.select(record("CafeNet"));
        state.ui.show_password_popup = true;
        state.inputs.password_input.insert('x');

        handle_password_popup(key(KeyCode::Esc), &mut state);

        assert!(!state.ui.show_password_popup);
        assert_eq!(state.inputs.password_input.value, "");
        assert_eq!(state.session.selected, None);
        assert_eq!(provider.connect_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn popup_enter_closes_optimistically_and_wipes_the_password() {
        let provider = Arc::new(MockProvider::new());
        let mut state = AppState::new(
            Arc::clone(&provider) as Arc<dyn WifiProvider>,
            IconSet::Ascii,
        );
        state.session.select(record("CafeNet"));
        state.ui.show_password_popup = true;
        for c in "hunter2".chars() {
            state.inputs.password_input.insert(c);
        }

        handle_password_popup(key(KeyCode::Enter), &mut state);

        // Closed before the connect result is known
        assert!(!state.ui.show_password_popup);
        assert_eq!(state.inputs.password_input.value, "");
    }

    #[tokio::test]
    async fn disconnect_key_is_inert_without_a_tracked_connection() {
        let provider = Arc::new(MockProvider::new());
        let mut state = AppState::new(
            Arc::clone(&provider) as Arc<dyn WifiProvider>,
            IconSet::Ascii,
        );

        handle_main_view(key(KeyCode::Char('d')), &mut state);

        assert_eq!(provider.disconnect_calls.load(Ordering::SeqCst), 0);
    }
}
