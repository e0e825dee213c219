/// Centralized configuration constants
use crate::provider::PermissionRationale;

// UI dimensions
pub const MAIN_WINDOW_HEIGHT: u16 = 28;
pub const MAIN_WINDOW_WIDTH: u16 = 72;

// Timing
pub const EVENT_POLL_MS: u64 = 100;

// Loading animation frames
pub const LOADING_CHARS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Rationale shown by platforms that gate scanning behind a permission dialog
pub const PERMISSION_RATIONALE: PermissionRationale = PermissionRationale {
    title: "Wifi networks",
    message: "We need your permission in order to find wifi networks",
    neutral: "Ask Me Later",
    negative: "Cancel",
    positive: "OK",
};

// Icons
pub mod icons {
    pub mod nerd {
        pub const OPEN: &str = " "; // nf-fa-rss
        pub const LOCKED: &str = " "; // nf-fa-lock
        pub const CONNECTED: &str = " 󰖩"; // nf-md-wifi_check
        pub const HIGHLIGHT: &str = "  ";
        pub const ENTER: &str = "󰌑"; // nf-md-keyboard_return
    }

    pub mod ascii {
        pub const OPEN: &str = "[O] ";
        pub const LOCKED: &str = "[*] ";
        pub const CONNECTED: &str = " <-";
        pub const HIGHLIGHT: &str = "> ";
        pub const ENTER: &str = "Enter";
    }
}

/// Icon set to use based on configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IconSet {
    #[default]
    Nerd,
    Ascii,
}

impl IconSet {
    pub fn open(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::OPEN,
            IconSet::Ascii => icons::ascii::OPEN,
        }
    }

    pub fn locked(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::LOCKED,
            IconSet::Ascii => icons::ascii::LOCKED,
        }
    }

    pub fn connected(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::CONNECTED,
            IconSet::Ascii => icons::ascii::CONNECTED,
        }
    }

    pub fn highlight(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::HIGHLIGHT,
            IconSet::Ascii => icons::ascii::HIGHLIGHT,
        }
    }

    pub fn enter(&self) -> &'static str {
        match self {
            IconSet::Nerd => icons::nerd::ENTER,
            IconSet::Ascii => icons::ascii::ENTER,
        }
    }
}
