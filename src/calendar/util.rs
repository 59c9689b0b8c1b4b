use super::month::first_of_month;
use super::DateStyler;
use ratatui::{style::Style, text::Span};
use std::iter::successors;
use time::{Date, Month, Weekday, Weekday::*};

const DAYS_IN_WEEK: usize = 7;

/// Placeholder drawn in place of a day number while highlights are loading
const SKELETON: &str = "··";

pub(super) trait WeekdayExt {
    fn index0(&self) -> u16;
}

impl WeekdayExt for Weekday {
    fn index0(&self) -> u16 {
        self.number_days_from_sunday().into()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct StyledDate {
    pub(super) date: Date,
    pub(super) highlight: Option<Style>,
}

impl StyledDate {
    pub(super) fn day(&self) -> u8 {
        self.date.day()
    }

    /// Renders the day as a four-column cell.  The cursor is bracketed, and a
    /// highlighted day not under the cursor is followed by a pin marker.
    pub(super) fn show(&self, is_cursor: bool, loading: bool) -> Span<'static> {
        let (open, close) = if is_cursor {
            ('[', ']')
        } else if self.highlight.is_some() && !loading {
            (' ', '*')
        } else {
            (' ', ' ')
        };
        if loading {
            Span::raw(format!("{open}{SKELETON}{close}"))
        } else {
            Span::styled(
                format!("{open}{:2}{close}", self.day()),
                self.highlight.unwrap_or_default(),
            )
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
// Invariant: At least one element of the array is Some
pub(super) struct Week([Option<StyledDate>; DAYS_IN_WEEK]);

impl Week {
    fn new(date: StyledDate) -> Self {
        let mut this = Week([None; DAYS_IN_WEEK]);
        this.set(date);
        this
    }

    fn set(&mut self, date: StyledDate) {
        let i = usize::from(date.date.weekday().index0());
        assert!(i < DAYS_IN_WEEK);
        self.0[i] = Some(date);
    }

    pub(super) fn enumerate(&self) -> EnumerateWeek<'_> {
        EnumerateWeek::new(self)
    }

    pub(super) fn get(&self, wd: Weekday) -> Option<StyledDate> {
        self.0.get(usize::from(wd.index0())).copied().flatten()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct EnumerateWeek<'a> {
    week: &'a Week,
    next_weekday: Option<Weekday>,
}

impl<'a> EnumerateWeek<'a> {
    fn new(week: &'a Week) -> Self {
        EnumerateWeek {
            week,
            next_weekday: Some(Sunday),
        }
    }
}

impl Iterator for EnumerateWeek<'_> {
    type Item = (Weekday, StyledDate);

    fn next(&mut self) -> Option<(Weekday, StyledDate)> {
        loop {
            let wd = self.next_weekday?;
            self.next_weekday = match wd.next() {
                Sunday => None,
                wd2 => Some(wd2),
            };
            if let Some(date) = self.week.get(wd) {
                return Some((wd, date));
            }
        }
    }
}

/// The days of the month containing `date`, grouped into Sunday-first weeks.
/// Days of neighboring months are left out.
pub(super) fn month_weeks<S: DateStyler>(date: Date, styler: &S) -> Vec<Week> {
    let month: Month = date.month();
    let mut weeks: Vec<Week> = Vec::with_capacity(6);
    for d in successors(Some(first_of_month(date)), |d| d.next_day())
        .take_while(|d| d.month() == month)
    {
        let sd = StyledDate {
            date: d,
            highlight: styler.highlight(d),
        };
        match weeks.last_mut() {
            Some(week) if d.weekday() != Sunday => week.set(sd),
            _ => weeks.push(Week::new(sd)),
        }
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::HighlightSet;
    use crate::theme::PIN_STYLE;
    use time::macros::date;

    struct NullStyler;

    impl DateStyler for NullStyler {
        fn highlight(&self, _date: Date) -> Option<Style> {
            None
        }
    }

    fn week_dates(week: &Week) -> Vec<(Weekday, Date)> {
        week.enumerate().map(|(wd, sd)| (wd, sd.date)).collect()
    }

    #[test]
    fn test_month_weeks() {
        let weeks = month_weeks(date!(2024 - 04 - 10), &NullStyler);
        assert_eq!(weeks.len(), 5);
        assert_eq!(
            week_dates(&weeks[0]),
            [
                (Monday, date!(2024 - 04 - 01)),
                (Tuesday, date!(2024 - 04 - 02)),
                (Wednesday, date!(2024 - 04 - 03)),
                (Thursday, date!(2024 - 04 - 04)),
                (Friday, date!(2024 - 04 - 05)),
                (Saturday, date!(2024 - 04 - 06)),
            ]
        );
        assert_eq!(weeks[1].get(Sunday).map(|sd| sd.date), Some(date!(2024 - 04 - 07)));
        assert_eq!(
            week_dates(&weeks[4]),
            [
                (Sunday, date!(2024 - 04 - 28)),
                (Monday, date!(2024 - 04 - 29)),
                (Tuesday, date!(2024 - 04 - 30)),
            ]
        );
    }

    #[test]
    fn test_six_week_month() {
        // March 2024 starts on a Friday and has 31 days
        let weeks = month_weeks(date!(2024 - 03 - 31), &NullStyler);
        assert_eq!(weeks.len(), 6);
        assert_eq!(week_dates(&weeks[5]), [(Sunday, date!(2024 - 03 - 31))]);
    }

    #[test]
    fn test_four_week_month() {
        let weeks = month_weeks(date!(2015 - 02 - 14), &NullStyler);
        assert_eq!(weeks.len(), 4);
        assert!(weeks.iter().all(|w| w.enumerate().count() == 7));
    }

    #[test]
    fn test_highlighted_days() {
        let highlights = HighlightSet::from_iter([date!(2024 - 03 - 02), date!(2024 - 03 - 15)]);
        let weeks = month_weeks(date!(2024 - 03 - 01), &highlights);
        let pinned = weeks
            .iter()
            .flat_map(Week::enumerate)
            .filter(|(_, sd)| sd.highlight == Some(PIN_STYLE))
            .map(|(_, sd)| sd.date)
            .collect::<Vec<_>>();
        assert_eq!(pinned, [date!(2024 - 03 - 02), date!(2024 - 03 - 15)]);
    }

    #[test]
    fn test_show() {
        let plain = StyledDate {
            date: date!(2024 - 03 - 06),
            highlight: None,
        };
        let pinned = StyledDate {
            date: date!(2024 - 03 - 15),
            highlight: Some(PIN_STYLE),
        };
        assert_eq!(plain.show(false, false), Span::raw("  6 "));
        assert_eq!(plain.show(true, false), Span::raw("[ 6]"));
        assert_eq!(pinned.show(false, false), Span::styled(" 15*", PIN_STYLE));
        assert_eq!(pinned.show(true, false), Span::styled("[15]", PIN_STYLE));
        assert_eq!(pinned.show(false, true), Span::raw(" ·· "));
        assert_eq!(plain.show(true, true), Span::raw("[··]"));
    }
}
