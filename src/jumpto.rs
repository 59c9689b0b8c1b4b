use crate::theme::{
    jumpto::{READY_ENTER_STYLE, UNFILLED_CELL_STYLE},
    BASE_STYLE,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Margin, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Clear, StatefulWidget, Widget},
};
use time::{Date, Month};

const OUTER_WIDTH: u16 = 17;
const OUTER_HEIGHT: u16 = 8;
const ENTER_POS: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct JumpTo;

impl StatefulWidget for JumpTo {
    type State = JumpToState;

    /*
     * .................
     * .┌─ Jump To… ──┐.
     * .│             │.
     * .│ -YYYY-MM-DD │.
     * .│             │.
     * .│   [ENTER]   │.
     * .└─────────────┘.
     * .................
     */

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [outer_area] = Layout::horizontal([OUTER_WIDTH])
            .flex(Flex::Center)
            .areas(area);
        let [outer_area] = Layout::vertical([OUTER_HEIGHT])
            .flex(Flex::Center)
            .areas(outer_area);
        Clear.render(outer_area, buf);
        Block::new().style(BASE_STYLE).render(outer_area, buf);
        let block_area = outer_area.inner(Margin::new(1, 1));
        Block::bordered()
            .title(" Jump To… ")
            .title_alignment(Alignment::Center)
            .render(block_area, buf);
        let text_area = block_area.inner(Margin::new(1, 1));
        state.to_text().render(text_area, buf);
    }
}

/// Partially entered `YYYY-MM-DD` date, filled in one digit at a time
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct JumpToState {
    negative: bool,
    year: [Option<u8>; 4],
    month: [Option<u8>; 2],
    day: [Option<u8>; 2],
    pos: usize,
}

impl JumpToState {
    pub(crate) fn new() -> JumpToState {
        JumpToState::default()
    }

    fn to_text(self) -> Text<'static> {
        Text::from_iter([
            Line::styled("", BASE_STYLE),
            self.to_line(),
            Line::styled("", BASE_STYLE),
            // Only the "[ENTER]" text and not its centering padding should be
            // underlined, so style a span rather than the line:
            Line::from(Span::styled(
                "[ENTER]",
                if self.pos == ENTER_POS {
                    READY_ENTER_STYLE
                } else {
                    BASE_STYLE
                },
            )),
        ])
        .centered()
    }

    fn to_line(self) -> Line<'static> {
        let mut spans = Vec::new();
        spans.push(Span::styled(
            if self.negative { "-" } else { " " },
            BASE_STYLE,
        ));
        let mut first = true;
        for (fallback, digits) in [
            ("Y", self.year.as_slice()),
            ("M", self.month.as_slice()),
            ("D", self.day.as_slice()),
        ] {
            if !std::mem::replace(&mut first, false) {
                spans.push(Span::styled("-", BASE_STYLE));
            }
            for dg in digits {
                spans.push(match dg {
                    Some(d) => Span::styled(format!("{d}"), BASE_STYLE),
                    None => Span::styled(fallback, UNFILLED_CELL_STYLE),
                });
            }
        }
        Line::from_iter(spans)
    }

    pub(crate) fn handle_input(&mut self, input: JumpToInput) -> JumpToOutput {
        match (input, self.pos) {
            (JumpToInput::Negative, 0) => {
                self.negative = !self.negative;
                JumpToOutput::Ok
            }
            (JumpToInput::Positive, 0) => {
                self.negative = false;
                JumpToOutput::Ok
            }
            (JumpToInput::Digit(d), 0..ENTER_POS) if d < 10 => {
                *self.cell(self.pos) = Some(d);
                self.pos += 1;
                JumpToOutput::Ok
            }
            (JumpToInput::Backspace, 1..) => {
                self.pos -= 1;
                *self.cell(self.pos) = None;
                JumpToOutput::Ok
            }
            (JumpToInput::Enter, ENTER_POS) => self
                .to_date()
                .map_or(JumpToOutput::Invalid, JumpToOutput::Jump),
            _ => JumpToOutput::Invalid,
        }
    }

    fn cell(&mut self, pos: usize) -> &mut Option<u8> {
        match pos {
            0..4 => &mut self.year[pos],
            4..6 => &mut self.month[pos - 4],
            _ => &mut self.day[pos - 6],
        }
    }

    fn to_date(self) -> Option<Date> {
        let mut year = i32::from(number::<u16>(&self.year)?);
        if self.negative {
            year = -year;
        }
        let month = Month::try_from(number::<u8>(&self.month)?).ok()?;
        let day = number(&self.day)?;
        Date::from_calendar_date(year, month, day).ok()
    }
}

// Returns `None` if any digit is still missing or the number doesn't fit
fn number<T: TryFrom<u16>>(digits: &[Option<u8>]) -> Option<T> {
    let mut n = 0u16;
    for d in digits {
        n = n * 10 + u16::from((*d)?);
    }
    T::try_from(n).ok()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JumpToInput {
    Negative,
    Positive,
    Digit(u8),
    Backspace,
    Enter,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JumpToOutput {
    Ok,
    Invalid,
    Jump(Date),
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn enter(state: &mut JumpToState, digits: &str) {
        for c in digits.chars() {
            let d = c.to_digit(10).and_then(|d| u8::try_from(d).ok()).unwrap();
            assert_eq!(state.handle_input(JumpToInput::Digit(d)), JumpToOutput::Ok);
        }
    }

    #[test]
    fn test_jump() {
        let mut state = JumpToState::new();
        enter(&mut state, "20240315");
        assert_eq!(
            state.handle_input(JumpToInput::Enter),
            JumpToOutput::Jump(date!(2024 - 03 - 15))
        );
    }

    #[test]
    fn test_negative_year() {
        let mut state = JumpToState::new();
        assert_eq!(state.handle_input(JumpToInput::Negative), JumpToOutput::Ok);
        enter(&mut state, "00440315");
        assert_eq!(
            state.handle_input(JumpToInput::Enter),
            JumpToOutput::Jump(Date::from_calendar_date(-44, Month::March, 15).unwrap())
        );
    }

    #[test]
    fn test_sign_only_at_start() {
        let mut state = JumpToState::new();
        enter(&mut state, "2");
        assert_eq!(state.handle_input(JumpToInput::Negative), JumpToOutput::Invalid);
    }

    #[test]
    fn test_enter_too_early() {
        let mut state = JumpToState::new();
        enter(&mut state, "202403");
        assert_eq!(state.handle_input(JumpToInput::Enter), JumpToOutput::Invalid);
    }

    #[test]
    fn test_too_many_digits() {
        let mut state = JumpToState::new();
        enter(&mut state, "20240315");
        assert_eq!(state.handle_input(JumpToInput::Digit(1)), JumpToOutput::Invalid);
    }

    #[test]
    fn test_backspace() {
        let mut state = JumpToState::new();
        assert_eq!(state.handle_input(JumpToInput::Backspace), JumpToOutput::Invalid);
        enter(&mut state, "20240399");
        assert_eq!(state.handle_input(JumpToInput::Backspace), JumpToOutput::Ok);
        assert_eq!(state.handle_input(JumpToInput::Backspace), JumpToOutput::Ok);
        enter(&mut state, "31");
        assert_eq!(
            state.handle_input(JumpToInput::Enter),
            JumpToOutput::Jump(date!(2024 - 03 - 31))
        );
    }

    #[test]
    fn test_invalid_dates() {
        for digits in ["20240230", "20241301", "20240000"] {
            let mut state = JumpToState::new();
            enter(&mut state, digits);
            assert_eq!(state.handle_input(JumpToInput::Enter), JumpToOutput::Invalid);
        }
    }
}
