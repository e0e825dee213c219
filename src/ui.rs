use crate::app::AppState;
use crate::config;
use crate::session::Notice;
use crate::theme;
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Padding, Paragraph},
};

pub fn render(frame: &mut Frame, state: &mut AppState) {
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BACKGROUND).fg(theme::FOREGROUND)),
        area,
    );

    // Match the parity of the terminal so the window centers exactly
    let height = config::MAIN_WINDOW_HEIGHT + (config::MAIN_WINDOW_HEIGHT + area.height) % 2;
    let width = config::MAIN_WINDOW_WIDTH + (config::MAIN_WINDOW_WIDTH + area.width) % 2;

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(area);
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(vertical[1]);
    let main_area = horizontal[1];

    let title = if state.session.scanning() {
        let spinner = config::LOADING_CHARS[state.ui.loading_frame % config::LOADING_CHARS.len()];
        format!(" WISCAN v{} {} ", env!("CARGO_PKG_VERSION"), spinner)
    } else {
        format!(" WISCAN v{} ", env!("CARGO_PKG_VERSION"))
    };

    let main_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::DIMMED))
        .title(title)
        .title_alignment(Alignment::Center)
        .title_style(Style::default().fg(theme::CYAN).add_modifier(Modifier::BOLD));
    frame.render_widget(main_block, main_area);

    let inner = main_area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });

    let layout = Layout::vertical([
        Constraint::Min(8),    // Network list
        Constraint::Length(6), // Details
        Constraint::Length(1), // Status / notice
        Constraint::Length(1), // Help bar
    ])
    .split(inner);

    render_network_list(frame, state, layout[0]);
    render_details(frame, state, layout[1]);
    render_status_line(frame, state, layout[2]);
    render_help_bar(frame, state, layout[3]);

    if state.ui.show_password_popup {
        render_password_popup(frame, state, area);
    }
}

fn render_network_list(frame: &mut Frame, state: &mut AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::NONE)
        .padding(Padding::vertical(1));

    if state.session.discovered.is_empty() {
        let empty = Paragraph::new("No Wi-Fi networks found. Press 's' to scan.")
            .style(Style::default().fg(theme::DIMMED))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let icons = state.ui.icons;
    let connected = state.session.connected_ssid.as_deref();
    let items: Vec<ListItem> = state
        .session
        .discovered
        .iter()
        .map(|record| {
            let lock = if record.capabilities == "Open" {
                icons.open()
            } else {
                icons.locked()
            };
            let mut spans = vec![
                Span::styled(lock, Style::default().fg(theme::YELLOW)),
                Span::raw(record.ssid.clone()),
                Span::styled(
                    format!("  {} dBm", record.level),
                    Style::default().fg(theme::DIMMED),
                ),
            ];
            if connected == Some(record.ssid.as_str()) {
                spans.push(Span::styled(
                    icons.connected(),
                    Style::default().fg(theme::GREEN),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(theme::SELECTION_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(icons.highlight());
    frame.render_stateful_widget(list, area, &mut state.ui.l_state);
}

fn render_details(frame: &mut Frame, state: &AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(theme::DIMMED))
        .title(" Details ")
        .title_style(Style::default().fg(theme::DIMMED));

    let Some(record) = state
        .ui
        .l_state
        .selected()
        .and_then(|i| state.session.discovered.get(i))
    else {
        frame.render_widget(block, area);
        return;
    };

    let label = Style::default().fg(theme::DIMMED);
    let lines = vec![
        Line::from(vec![
            Span::styled("BSSID       ", label),
            Span::raw(record.bssid.clone()),
        ]),
        Line::from(vec![
            Span::styled("Security    ", label),
            Span::raw(record.capabilities.clone()),
        ]),
        Line::from(vec![
            Span::styled("Frequency   ", label),
            Span::raw(format!("{} MHz", record.frequency)),
        ]),
        Line::from(vec![
            Span::styled("Signal      ", label),
            Span::raw(format!("{} dBm", record.level)),
        ]),
        Line::from(vec![
            Span::styled("Seen        ", label),
            Span::raw(format!("t={}", record.timestamp)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_line(frame: &mut Frame, state: &AppState, area: Rect) {
    let line = match &state.ui.notice {
        Some(Notice::Connected(ssid)) => Line::from(Span::styled(
            format!("Connected to {ssid}"),
            Style::default().fg(theme::GREEN),
        )),
        Some(Notice::ConnectFailed(ssid)) => Line::from(Span::styled(
            format!("Failed to connect to {ssid}"),
            Style::default().fg(theme::RED),
        )),
        Some(Notice::Disconnected) => Line::from(Span::styled(
            "Disconnected from current Wi-Fi",
            Style::default().fg(theme::GREEN),
        )),
        Some(Notice::DisconnectFailed) => Line::from(Span::styled(
            "Failed to disconnect",
            Style::default().fg(theme::RED),
        )),
        None => match &state.session.connected_ssid {
            Some(ssid) => Line::from(vec![
                Span::styled("Connected: ", Style::default().fg(theme::DIMMED)),
                Span::styled(ssid.clone(), Style::default().fg(theme::GREEN)),
            ]),
            None => Line::from(Span::styled(
                "Not connected",
                Style::default().fg(theme::DIMMED),
            )),
        },
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_help_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let key = Style::default().fg(theme::CYAN);
    let label = Style::default().fg(theme::DIMMED);
    // Disconnect is offered only while a connection is tracked
    let disconnect_style = if state.session.connected_ssid.is_some() {
        key
    } else {
        Style::default().fg(theme::SELECTION_BG)
    };
    let help = Line::from(vec![
        Span::styled("s", key),
        Span::styled(" scan  ", label),
        Span::styled(state.ui.icons.enter(), key),
        Span::styled(" connect  ", label),
        Span::styled("d", disconnect_style),
        Span::styled(" disconnect  ", label),
        Span::styled("q", key),
        Span::styled(" quit", label),
    ]);
    frame.render_widget(Paragraph::new(help).alignment(Alignment::Center), area);
}

fn render_password_popup(frame: &mut Frame, state: &AppState, area: Rect) {
    let Some(record) = &state.session.selected else {
        return;
    };

    let popup = centered_rect(46, 8, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::CYAN))
        .style(Style::default().bg(theme::BACKGROUND))
        .title(format!(" SSID: {} ", record.ssid))
        .title_alignment(Alignment::Center)
        .padding(Padding::horizontal(2));

    let masked: String = "•".repeat(state.inputs.password_input.value.chars().count());
    let cursor = state.inputs.password_input.cursor;
    let (before, after) = masked.split_at(cursor * "•".len());
    let field = Line::from(vec![
        Span::raw(before.to_string()),
        Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after.to_string()),
    ]);

    let lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "Password",
            Style::default().fg(theme::DIMMED),
        )),
        field,
        Line::default(),
        Line::from(vec![
            Span::styled("Esc", Style::default().fg(theme::CYAN)),
            Span::styled(" Close   ", Style::default().fg(theme::DIMMED)),
            Span::styled(state.ui.icons.enter(), Style::default().fg(theme::CYAN)),
            Span::styled(" Connect", Style::default().fg(theme::DIMMED)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(area);
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IconSet;
    use crate::provider::{MockProvider, NetworkRecord};
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    fn draw(state: &mut AppState) -> String {
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| render(frame, state)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn empty_session_shows_the_empty_state_message() {
        let mut state = AppState::new(Arc::new(MockProvider::new()), IconSet::Ascii);
        let screen = draw(&mut state);
        assert!(screen.contains("No Wi-Fi networks found"));
    }

    #[test]
    fn discovered_networks_render_as_list_rows() {
        let mut state = AppState::new(Arc::new(MockProvider::new()), IconSet::Ascii);
        state.session.discovered = vec![NetworkRecord {
            ssid: "CafeNet".to_string(),
            bssid: "aa:bb:cc".to_string(),
            capabilities: "WPA2-PSK/AES".to_string(),
            frequency: 2412,
            level: -40,
            timestamp: 1000,
        }];
        let screen = draw(&mut state);
        assert!(screen.contains("CafeNet"));
        assert!(!screen.contains("No Wi-Fi networks found"));
    }

    #[test]
    fn password_popup_masks_the_entered_text() {
        let mut state = AppState::new(Arc::new(MockProvider::new()), IconSet::Ascii);
        state.session.select(NetworkRecord {
            ssid: "CafeNet".to_string(),
            bssid: "aa:bb:cc".to_string(),
            capabilities: "WPA2-PSK/AES".to_string(),
            frequency: 2412,
            level: -40,
            timestamp: 1000,
        });
        state.ui.show_password_popup = true;
        for c in "hunter2".chars() {
            state.inputs.password_input.insert(c);
        }
        let screen = draw(&mut state);
        assert!(screen.contains("SSID: CafeNet"));
        assert!(!screen.contains("hunter2"));
    }
}
