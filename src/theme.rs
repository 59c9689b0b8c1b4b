use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const PIN_STYLE: Style = Style::new()
    .fg(Color::Rgb(0xFB, 0x54, 0x9D))
    .bg(Color::Black)
    .add_modifier(Modifier::BOLD);

pub(crate) const SELECTED_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

pub(crate) const SKELETON_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

pub(crate) const ERROR_STYLE: Style = BASE_STYLE.fg(Color::LightRed);

pub(crate) const MONTH_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const WEEKDAY_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) mod jumpto {
    use super::*;

    pub(crate) const UNFILLED_CELL_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

    pub(crate) const READY_ENTER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::UNDERLINED);
}
