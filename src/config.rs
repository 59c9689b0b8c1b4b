use std::path::PathBuf;
use std::time::Duration;
use time::{
    format_description::FormatItem,
    macros::{date, format_description},
    Date,
};

pub(crate) static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Latency of the simulated backend when none is given on the command line
pub(crate) const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Dates the simulated backend reports when none are given on the command line
pub(crate) const DEFAULT_HIGHLIGHTS: [Date; 4] = [
    date!(2024 - 04 - 13),
    date!(2024 - 03 - 06),
    date!(2024 - 03 - 02),
    date!(2024 - 03 - 15),
];

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Config {
    /// Initial reference date; today if not set
    pub(crate) date: Option<Date>,
    pub(crate) delay: Duration,
    pub(crate) highlights: Vec<Date>,
    /// Months for which the simulated backend fails, given by any date in them
    pub(crate) failing: Vec<Date>,
    pub(crate) log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            date: None,
            delay: DEFAULT_DELAY,
            highlights: DEFAULT_HIGHLIGHTS.to_vec(),
            failing: Vec::new(),
            log_file: None,
        }
    }
}

pub(crate) fn parse_ymd(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s, &YMD_FMT)
}

/// Formats a date as `YYYY-MM-DD`
pub(crate) fn ymd(date: Date) -> String {
    date.format(&YMD_FMT).unwrap_or_else(|_| date.to_string())
}
