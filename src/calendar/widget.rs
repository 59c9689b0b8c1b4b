use super::util::{month_weeks, WeekdayExt};
use super::DateStyler;
use crate::config::ymd;
use crate::source::FetchError;
use crate::theme::{ERROR_STYLE, MONTH_STYLE, SELECTED_STYLE, SKELETON_STYLE, WEEKDAY_STYLE};
use ratatui::prelude::*;
use time::{Date, Weekday};

static HEADER: &str = " Su     Mo     Tu     We     Th     Fr     Sa ";

/// Width of the calendar in columns
const MAIN_WIDTH: u16 = 46;

/// Number of lines taken up by the month title, the weekday header, and its
/// rule
const HEADER_LINES: u16 = 3;

/// Number of lines taken up by each week of the calendar
const WEEK_LINES: u16 = 2;

/// Most weeks any month touches
const MAX_WEEKS: u16 = 6;

/// Line on which loading and error messages are shown
const STATUS_LINE: u16 = HEADER_LINES + MAX_WEEKS * WEEK_LINES;

/// Number of columns per day of week
const DAY_WIDTH: u16 = 7;

const ACS_HLINE: char = '─';

/// Where the highlighted days of the displayed month stand
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Status<'a> {
    Loading,
    Ready,
    Failed(&'a FetchError),
}

/// One month of days, with the month being that of the cursor
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Calendar<'a, S> {
    styler: S,
    cursor: Date,
    selected: Option<Date>,
    status: Status<'a>,
}

impl<'a, S: DateStyler> Calendar<'a, S> {
    pub(crate) fn new(styler: S, cursor: Date) -> Self {
        Calendar {
            styler,
            cursor,
            selected: None,
            status: Status::Ready,
        }
    }

    pub(crate) fn selected(mut self, selected: Option<Date>) -> Self {
        self.selected = selected;
        self
    }

    pub(crate) fn status(mut self, status: Status<'a>) -> Self {
        self.status = status;
        self
    }

    fn status_line(&self) -> Option<Span<'static>> {
        match self.status {
            Status::Failed(e) => Some(Span::styled(e.to_string(), ERROR_STYLE)),
            Status::Loading => Some(Span::styled("Loading highlighted days…", SKELETON_STYLE)),
            Status::Ready => self
                .selected
                .map(|d| Span::raw(format!("Selected {}", ymd(d)))),
        }
    }
}

impl<S: DateStyler> Widget for Calendar<'_, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let left = area.width.saturating_sub(MAIN_WIDTH) / 2;
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(left),
                Constraint::Length(MAIN_WIDTH.min(area.width)),
                Constraint::Min(0),
            ])
            .split(area);
        let area = chunks[1];
        let loading = self.status == Status::Loading;
        let mut canvas = BufferCanvas::new(area, buf);
        canvas.draw_title(self.cursor);
        canvas.draw_header();
        let weeks = month_weeks(self.cursor, &self.styler);
        for (i, week) in std::iter::zip(0u16.., &weeks) {
            for (wd, date) in week.enumerate() {
                let mut s = date.show(date.date == self.cursor, loading);
                if loading {
                    s = s.style(SKELETON_STYLE);
                } else if Some(date.date) == self.selected {
                    s = s.patch_style(SELECTED_STYLE);
                }
                canvas.draw_day(i, wd, s);
            }
        }
        if let Some(s) = self.status_line() {
            canvas.draw_status(s);
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn draw_title(&mut self, date: Date) {
        let title = format!("{} {}", date.month(), date.year());
        let width = u16::try_from(title.chars().count()).unwrap_or(MAIN_WIDTH);
        self.mvprint(
            0,
            MAIN_WIDTH.saturating_sub(width) / 2,
            title,
            Some(MONTH_STYLE),
        );
    }

    fn draw_header(&mut self) {
        self.mvprint(1, 0, HEADER, Some(WEEKDAY_STYLE));
        self.hline(2, 0, ACS_HLINE, MAIN_WIDTH);
    }

    fn draw_day(&mut self, week_no: u16, wd: Weekday, s: Span<'_>) {
        self.mvprint(
            week_no * WEEK_LINES + HEADER_LINES,
            DAY_WIDTH * wd.index0(),
            s.content,
            Some(s.style),
        );
    }

    fn draw_status(&mut self, s: Span<'_>) {
        self.mvprint(STATUS_LINE, 0, s.content, Some(s.style));
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            // `set_stringn()` stops at the edge of the calendar rather than
            // writing past the buffer
            self.buf.set_stringn(
                x + self.area.x,
                y + self.area.y,
                s,
                usize::from(self.area.width - x),
                style.unwrap_or_default(),
            );
        }
    }

    fn hline(&mut self, y: u16, x: u16, ch: char, length: u16) {
        self.mvprint(y, x, String::from(ch).repeat(length.into()), None);
    }
}
