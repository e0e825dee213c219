use ratatui::style::Color;

pub const BACKGROUND: Color = Color::Rgb(18, 20, 24); // #121418
pub const FOREGROUND: Color = Color::Rgb(178, 183, 190); // #B2B7BE
pub const RED: Color = Color::Rgb(191, 73, 67); // #BF4943
pub const GREEN: Color = Color::Rgb(94, 167, 102); // #5EA766
pub const YELLOW: Color = Color::Rgb(186, 156, 66); // #BA9C42
pub const CYAN: Color = Color::Rgb(87, 157, 170); // #579DAA
pub const DIMMED: Color = Color::Rgb(94, 99, 107); // #5E636B
pub const SELECTION_BG: Color = Color::Rgb(42, 48, 58); // #2A303A
