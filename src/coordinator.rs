//! Fetching highlighted days for the displayed month.
//!
//! A [`RequestCoordinator`] owns at most one outstanding request at a time.
//! Each request runs in its own task and reports back through a channel as a
//! [`Completion`]; the owner of the receiving end feeds completions to
//! [`RequestCoordinator::resolve()`], which applies a result only if it
//! belongs to the request that is still active.  A newer request therefore
//! always wins over older ones, no matter which finishes first.
use crate::config::ymd;
use crate::source::{DataSource, FetchError, HighlightSet, Outcome};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use time::Date;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Identifies one request issued by a [`RequestCoordinator`]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The right to cancel one outstanding request
#[derive(Clone, Debug)]
pub(crate) struct CancellationHandle {
    id: RequestId,
    token: CancellationToken,
}

impl CancellationHandle {
    fn new(id: RequestId) -> CancellationHandle {
        CancellationHandle {
            id,
            token: CancellationToken::new(),
        }
    }

    pub(crate) fn id(&self) -> RequestId {
        self.id
    }

    fn invalidate(&self) {
        self.token.cancel();
    }
}

/// A finished request, as sent back from its task
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Completion {
    pub(crate) id: RequestId,
    pub(crate) date: Date,
    pub(crate) outcome: Outcome,
}

/// What [`RequestCoordinator::resolve()`] did with a completion that was not
/// a failure
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Resolution {
    /// The highlights of the active request were stored
    Applied,
    /// The completion was cancelled, superseded, or arrived after teardown
    Discarded,
}

/// Returned when a request is started after [`RequestCoordinator::teardown()`]
#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("request coordinator has already been torn down")]
pub(crate) struct TornDownError;

#[derive(Debug)]
pub(crate) struct RequestCoordinator {
    source: Arc<dyn DataSource>,
    completions: UnboundedSender<Completion>,
    reference: Date,
    active: Option<CancellationHandle>,
    next_id: u64,
    loading: bool,
    highlights: HighlightSet,
    failure: Option<FetchError>,
    selected: Option<Date>,
    torn_down: bool,
}

impl RequestCoordinator {
    /// Creates a coordinator for the month containing `initial`, together
    /// with the receiver on which its requests report back.  No request is
    /// made until [`on_mount()`](Self::on_mount) or [`start()`](Self::start)
    /// is called.
    pub(crate) fn new(
        source: Arc<dyn DataSource>,
        initial: Date,
    ) -> (RequestCoordinator, UnboundedReceiver<Completion>) {
        let (sender, receiver) = unbounded_channel();
        let coordinator = RequestCoordinator {
            source,
            completions: sender,
            reference: initial,
            active: None,
            next_id: 0,
            loading: false,
            highlights: HighlightSet::new(),
            failure: None,
            selected: None,
            torn_down: false,
        };
        (coordinator, receiver)
    }

    pub(crate) fn on_mount(&mut self) -> Result<RequestId, TornDownError> {
        self.start(self.reference)
    }

    pub(crate) fn on_unmount(&mut self) {
        self.teardown();
    }

    /// Cancels any outstanding request, clears the highlights, and requests
    /// the highlights for `date` in a new task.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn start(&mut self, date: Date) -> Result<RequestId, TornDownError> {
        if self.torn_down {
            return Err(TornDownError);
        }
        if let Some(handle) = self.active.take() {
            log::debug!("Superseding request {} for {}", handle.id, ymd(self.reference));
            handle.invalidate();
        }
        self.reference = date;
        self.highlights.clear();
        self.failure = None;
        self.loading = true;
        let handle = CancellationHandle::new(self.issue_id());
        let id = handle.id;
        let token = handle.token.clone();
        self.active = Some(handle);
        log::debug!("Requesting highlighted days for {} as {id}", ymd(date));
        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let outcome = source.fetch_highlights(date, token).await;
            if completions.send(Completion { id, date, outcome }).is_err() {
                log::trace!("Request {id} finished after its coordinator was dropped");
            }
        });
        Ok(id)
    }

    /// Applies a finished request to the coordinator's state.
    ///
    /// Only a completion for the active request can change anything.  A
    /// failure of the active request is recorded (see
    /// [`failure()`](Self::failure)) and also returned.
    pub(crate) fn resolve(&mut self, completion: Completion) -> Result<Resolution, FetchError> {
        let Completion { id, date, outcome } = completion;
        if self.torn_down || self.active.as_ref().map(CancellationHandle::id) != Some(id) {
            log::debug!("Discarding stale result of request {id} for {}", ymd(date));
            return Ok(Resolution::Discarded);
        }
        match outcome {
            Outcome::Success(highlights) => {
                if highlights.is_empty() {
                    log::debug!("Request {id} for {} found no highlighted days", ymd(date));
                } else {
                    let days = highlights.iter().map(|&d| ymd(d)).collect::<Vec<_>>();
                    log::debug!("Request {id} for {} found {}", ymd(date), days.join(", "));
                }
                self.active = None;
                self.highlights = highlights;
                self.loading = false;
                Ok(Resolution::Applied)
            }
            Outcome::Cancelled => {
                log::debug!("Request {id} for {} was cancelled", ymd(date));
                Ok(Resolution::Discarded)
            }
            Outcome::Failure(e) => {
                log::error!("Request {id} for {} failed: {e}", ymd(date));
                self.active = None;
                self.loading = false;
                self.failure = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Cancels any outstanding request and stops the coordinator for good.
    /// Calling this more than once has no further effect.
    pub(crate) fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        if let Some(handle) = self.active.take() {
            log::debug!("Cancelling request {} on teardown", handle.id);
            handle.invalidate();
        }
        self.loading = false;
        self.torn_down = true;
    }

    pub(crate) fn select_date(&mut self, date: Date) {
        if self.torn_down {
            return;
        }
        log::info!("Selected {}", ymd(date));
        self.selected = Some(date);
    }

    pub(crate) fn reference(&self) -> Date {
        self.reference
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    /// The failure of the most recent request, if it failed
    pub(crate) fn failure(&self) -> Option<&FetchError> {
        self.failure.as_ref()
    }

    pub(crate) fn selected(&self) -> Option<Date> {
        self.selected
    }

    fn issue_id(&mut self) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl Drop for RequestCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
