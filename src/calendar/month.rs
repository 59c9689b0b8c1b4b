use thiserror::Error;
use time::{util::days_in_month, Date, Duration};

/// A movement of the calendar cursor
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Motion {
    DayBackwards,
    DayForwards,
    WeekBackwards,
    WeekForwards,
    /// Same day of the previous month, clamped to that month's length
    MonthBackwards,
    /// Same day of the next month, clamped to that month's length
    MonthForwards,
}

impl Motion {
    pub(crate) fn apply(self, date: Date) -> Result<Date, OutOfTimeError> {
        match self {
            Motion::DayBackwards => date.previous_day(),
            Motion::DayForwards => date.next_day(),
            Motion::WeekBackwards => date.checked_sub(Duration::WEEK),
            Motion::WeekForwards => date.checked_add(Duration::WEEK),
            Motion::MonthBackwards => first_of_month(date)
                .previous_day()
                .map(|d| with_day_clamped(d, date.day())),
            Motion::MonthForwards => last_of_month(date)
                .next_day()
                .map(|d| with_day_clamped(d, date.day())),
        }
        .ok_or(OutOfTimeError)
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;

pub(crate) fn first_of_month(date: Date) -> Date {
    with_day_clamped(date, 1)
}

pub(crate) fn last_of_month(date: Date) -> Date {
    with_day_clamped(date, u8::MAX)
}

pub(crate) fn same_month(a: Date, b: Date) -> bool {
    (a.year(), a.month()) == (b.year(), b.month())
}

fn with_day_clamped(date: Date, day: u8) -> Date {
    let day = day.clamp(1, days_in_month(date.month(), date.year()));
    date.replace_day(day)
        .expect("a day clamped to the length of its month should be valid")
}
