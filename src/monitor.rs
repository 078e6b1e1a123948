//! The polling loop.
//!
//! [`Monitor`] walks the watch list in configured order, one concert at a
//! time, on the calling thread:
//!
//! ```text
//! loop {
//!     for concert not yet open {
//!         check(concert)   // fetch -> classify -> notify
//!         inner delay
//!     }
//!     outer delay
//! }
//! ```
//!
//! A concert that is detected open is recorded in [`MonitorState`] and never
//! fetched again for the life of the process.  A failed check aborts the rest
//! of the pass (remaining concerts wait for the next one) but never the loop.
//!
//! ## Notification failures
//!
//! The two notification paths are deliberately treated differently:
//!
//! * after a bad status or an unparsable body, the diagnostic push is
//!   attempted and its own failure is logged; the original [`CheckError`] is
//!   what aborts the pass.
//! * after an opening is detected, a failed push is logged and the concert is
//!   still marked open.  If the gateway is down at that moment the opening is
//!   only visible in the log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::config::Concert;
use crate::delay::{Delay, Pause};
use crate::error::CheckError;
use crate::notify::Notify;
use crate::source::{classify, Fetch, FeedResult};

/// Which concerts have been seen open, and when.
///
/// Owned by the monitor.  An entry is added at most once and never removed.
#[derive(Debug, Default)]
pub struct MonitorState {
    opened: HashMap<String, DateTime<Utc>>,
}

impl MonitorState {
    pub fn is_open(&self, id: &str) -> bool {
        self.opened.contains_key(id)
    }

    /// Record `id` as open.  Returns `false` if it already was.
    pub fn mark_open(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        if self.opened.contains_key(id) {
            return false;
        }
        self.opened.insert(id.to_string(), at);
        true
    }

    pub fn open_count(&self) -> usize {
        self.opened.len()
    }
}

/// Outcome of a pass that ran to the end of the watch list.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Concerts fetched in this pass.
    pub checked: usize,
    /// Ids of concerts that became open in this pass.
    pub opened: Vec<String>,
}

pub struct Monitor<F, N, P = Delay> {
    concerts: Vec<Concert>,
    source: F,
    notifier: N,
    inner: P,
    outer: P,
    state: MonitorState,
}

impl<F: Fetch, N: Notify, P: Pause> Monitor<F, N, P> {
    pub fn new(concerts: Vec<Concert>, source: F, notifier: N, inner: P, outer: P) -> Self {
        Self {
            concerts,
            source,
            notifier,
            inner,
            outer,
            state: MonitorState::default(),
        }
    }

    /// Run passes forever.  Only process termination stops this.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_once();
        }
    }

    /// One pass followed by the outer delay, whether the pass completed or
    /// was aborted.
    pub fn run_once(&mut self) {
        match self.run_pass() {
            Ok(report) => debug!(
                "pass complete: {} checked, {} newly open, {}/{} open overall",
                report.checked,
                report.opened.len(),
                self.state.open_count(),
                self.concerts.len()
            ),
            Err(err) => error!("pass aborted: {err}"),
        }
        self.outer.pause();
    }

    /// One walk over the watch list.
    ///
    /// Stops at the first failed check and returns its error; concerts after
    /// it are left for the next pass.  The inner delay follows every concert
    /// that was checked successfully.
    pub fn run_pass(&mut self) -> Result<PassReport, CheckError> {
        let mut report = PassReport::default();

        for concert in &self.concerts {
            if self.state.is_open(concert.id()) {
                continue;
            }

            report.checked += 1;
            if check(&self.source, &self.notifier, concert)? {
                let at = Utc::now();
                self.state.mark_open(concert.id(), at);
                info!("{} is open (detected {})", concert.name, at.format("%Y-%m-%d %H:%M:%S UTC"));
                report.opened.push(concert.id().to_string());
            } else {
                debug!("{} not opened", concert.name);
            }

            self.inner.pause();
        }

        Ok(report)
    }
}

/// Fetch, classify and notify for one concert.  Returns whether it is open.
pub fn check<F: Fetch, N: Notify>(
    source: &F,
    notifier: &N,
    concert: &Concert,
) -> Result<bool, CheckError> {
    let response = source.fetch(&concert.url).map_err(|source| CheckError::Fetch {
        url: concert.url.clone(),
        name: concert.name.clone(),
        source,
    })?;

    if response.status != 200 {
        let err = CheckError::BadStatus {
            url: concert.url.clone(),
            name: concert.name.clone(),
            status: response.status,
            body: response.body,
        };
        report(notifier, &err.to_string());
        return Err(err);
    }

    match classify(&response.body) {
        Ok(FeedResult::Open(titles)) => {
            let message = opened_message(&concert.name, &titles);
            if let Err(err) = notifier.notify(&message) {
                warn!("{} is open but the notification failed: {err}", concert.name);
            }
            Ok(true)
        }
        Ok(FeedResult::Closed) => Ok(false),
        Err(source) => {
            report(notifier, &format!("Parse failed: {}", source.body));
            Err(CheckError::Parse {
                url: concert.url.clone(),
                name: concert.name.clone(),
                source,
            })
        }
    }
}

/// Send a diagnostic push; its failure is logged so the caller can still
/// return the error that prompted it.
fn report<N: Notify>(notifier: &N, message: &str) {
    if let Err(err) = notifier.notify(message) {
        warn!("failed to send diagnostic notification: {err}");
    }
}

pub fn opened_message(name: &str, titles: &[String]) -> String {
    format!("`{name}` is out.\n\nNames:\n\n- {}\n", titles.join("\n- "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
