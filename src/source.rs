use crate::calendar::same_month;
use async_trait::async_trait;
use std::collections::{btree_set, BTreeSet};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use time::Date;
use tokio_util::sync::CancellationToken;

/// The set of days the backend reports as highlighted
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct HighlightSet(BTreeSet<Date>);

impl HighlightSet {
    pub(crate) fn new() -> HighlightSet {
        HighlightSet::default()
    }

    pub(crate) fn contains(&self, date: Date) -> bool {
        self.0.contains(&date)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    pub(crate) fn iter(&self) -> btree_set::Iter<'_, Date> {
        self.0.iter()
    }
}

impl FromIterator<Date> for HighlightSet {
    fn from_iter<I: IntoIterator<Item = Date>>(iter: I) -> HighlightSet {
        HighlightSet(iter.into_iter().collect())
    }
}

/// How a single highlighted-days request ended
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Outcome {
    Success(HighlightSet),
    /// The request's cancellation token fired before it finished
    Cancelled,
    Failure(FetchError),
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("failed to fetch highlighted days: {reason}")]
pub(crate) struct FetchError {
    reason: String,
}

impl FetchError {
    pub(crate) fn new<S: Into<String>>(reason: S) -> FetchError {
        FetchError {
            reason: reason.into(),
        }
    }
}

/// A backend that knows which days of a month are highlighted.
///
/// Implementations must resolve to [`Outcome::Cancelled`] (or at least never
/// to [`Outcome::Success`]) once `cancel` has fired, and should notice the
/// cancellation promptly rather than running to completion.
#[async_trait]
pub(crate) trait DataSource: fmt::Debug + Send + Sync {
    async fn fetch_highlights(&self, date: Date, cancel: CancellationToken) -> Outcome;
}

/// Stand-in for a real backend: after a fixed delay, reports those of a fixed
/// list of dates that fall in the requested month.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SimulatedSource {
    delay: Duration,
    dates: Vec<Date>,
    /// Requests for months containing any of these dates fail
    failing: Vec<Date>,
}

impl SimulatedSource {
    pub(crate) fn new(delay: Duration, dates: Vec<Date>) -> SimulatedSource {
        SimulatedSource {
            delay,
            dates,
            failing: Vec::new(),
        }
    }

    pub(crate) fn failing(mut self, failing: Vec<Date>) -> SimulatedSource {
        self.failing = failing;
        self
    }

    fn respond(&self, date: Date) -> Outcome {
        if self.failing.iter().any(|&d| same_month(d, date)) {
            Outcome::Failure(FetchError::new(format!(
                "backend unavailable for {} {}",
                date.month(),
                date.year()
            )))
        } else {
            Outcome::Success(self.in_month_of(date))
        }
    }

    fn in_month_of(&self, date: Date) -> HighlightSet {
        self.dates
            .iter()
            .copied()
            .filter(|&d| same_month(d, date))
            .collect()
    }
}

#[async_trait]
impl DataSource for SimulatedSource {
    async fn fetch_highlights(&self, date: Date, cancel: CancellationToken) -> Outcome {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Outcome::Cancelled,
            () = tokio::time::sleep(self.delay) => self.respond(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use tokio::time::Instant;

    fn source() -> SimulatedSource {
        SimulatedSource::new(
            Duration::from_millis(500),
            vec![
                date!(2024 - 04 - 13),
                date!(2024 - 03 - 06),
                date!(2024 - 03 - 02),
                date!(2024 - 03 - 15),
            ],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_delay() {
        let start = Instant::now();
        let outcome = source()
            .fetch_highlights(date!(2024 - 04 - 10), CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            Outcome::Success(HighlightSet::from_iter([date!(2024 - 04 - 13)]))
        );
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_requested_month() {
        let outcome = source()
            .fetch_highlights(date!(2024 - 03 - 01), CancellationToken::new())
            .await;
        let Outcome::Success(set) = outcome else {
            panic!("expected a successful fetch, got {outcome:?}");
        };
        assert_eq!(
            set.iter().copied().collect::<Vec<_>>(),
            [
                date!(2024 - 03 - 02),
                date!(2024 - 03 - 06),
                date!(2024 - 03 - 15)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_month_other_year() {
        let outcome = source()
            .fetch_highlights(date!(2025 - 03 - 01), CancellationToken::new())
            .await;
        assert_eq!(outcome, Outcome::Success(HighlightSet::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_month() {
        let source = source().failing(vec![date!(2024 - 03 - 31)]);
        let outcome = source
            .fetch_highlights(date!(2024 - 03 - 01), CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            Outcome::Failure(FetchError::new("backend unavailable for March 2024"))
        );
        let outcome = source
            .fetch_highlights(date!(2024 - 04 - 01), CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            Outcome::Success(HighlightSet::from_iter([date!(2024 - 04 - 13)]))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let start = Instant::now();
        let outcome = source()
            .fetch_highlights(date!(2024 - 04 - 10), token)
            .await;
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_midway() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let start = Instant::now();
        let task = tokio::spawn(async move {
            source()
                .fetch_highlights(date!(2024 - 04 - 10), token)
                .await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
        assert_eq!(task.await.unwrap(), Outcome::Cancelled);
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
