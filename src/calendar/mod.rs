mod month;
mod util;
mod widget;
pub(crate) use self::month::{first_of_month, same_month, Motion};
pub(crate) use self::widget::{Calendar, Status};
use crate::source::HighlightSet;
use crate::theme::PIN_STYLE;
use ratatui::style::Style;
use time::Date;

pub(crate) trait DateStyler {
    /// Returns the style for a highlighted day, or `None` if the day is not
    /// highlighted
    fn highlight(&self, date: Date) -> Option<Style>;
}

impl<T: DateStyler + ?Sized> DateStyler for &T {
    fn highlight(&self, date: Date) -> Option<Style> {
        (**self).highlight(date)
    }
}

impl DateStyler for HighlightSet {
    fn highlight(&self, date: Date) -> Option<Style> {
        self.contains(date).then_some(PIN_STYLE)
    }
}
