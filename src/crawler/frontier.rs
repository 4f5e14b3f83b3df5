//! Deduplicated crawl frontier with pending-work accounting
//!
//! The frontier owns every piece of shared crawl state: the queue of URLs
//! waiting to be fetched, the set of every URL ever admitted, the log of
//! URLs actually fetched and the pending counter. All of it sits behind one
//! mutex so that admission, dequeue and completion stay consistent.
//!
//! # Pending Count
//!
//! `pending = admitted - marked done`. A worker must admit every link found
//! on a page *before* marking that page done; otherwise `join` could observe
//! zero pending work while new links are still on their way in.

use crate::crawler::policy::PolicyGate;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};
use url::Url;

/// Point-in-time counters, for progress logging and reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    /// URLs admitted but not yet dequeued
    pub queued: usize,
    /// URLs admitted but not yet marked done
    pub pending: usize,
    /// Every URL ever admitted
    pub discovered: usize,
    /// URLs actually fetched
    pub visited: usize,
}

/// What `join` waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    pending: usize,
    closed: bool,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<Url>,
    discovered: HashSet<String>,
    visited: Vec<Url>,
    pending: usize,
    closed: bool,
}

/// Thread-safe work queue shared by every worker
pub struct Frontier {
    gate: PolicyGate,
    state: Mutex<FrontierState>,
    available: Notify,
    progress: watch::Sender<Progress>,
}

impl Frontier {
    /// Creates an empty frontier guarded by `gate`
    pub fn new(gate: PolicyGate) -> Self {
        let (progress, _) = watch::channel(Progress {
            pending: 0,
            closed: false,
        });

        Self {
            gate,
            state: Mutex::new(FrontierState::default()),
            available: Notify::new(),
            progress,
        }
    }

    /// Admits a URL if it is new and allowed by the policy
    ///
    /// The dedup check and insert happen under a single lock, so when two
    /// workers discover the same link at once exactly one of them succeeds.
    ///
    /// # Returns
    ///
    /// * `true` - The URL was queued and counted as pending work
    /// * `false` - Already discovered, refused by the policy, or closed
    pub fn try_admit(&self, url: &Url) -> bool {
        // Most links on a page are already known; skip the robots match for them
        if self.lock().discovered.contains(url.as_str()) {
            return false;
        }

        // The gate is pure, so it is evaluated outside the lock
        if let Err(reason) = self.gate.check(url) {
            tracing::trace!("Refusing {}: {:?}", url, reason);
            return false;
        }

        let mut state = self.lock();
        if state.closed || !state.discovered.insert(url.as_str().to_string()) {
            return false;
        }

        state.queue.push_back(url.clone());
        state.pending += 1;
        self.publish(&state);
        drop(state);

        self.available.notify_one();
        true
    }

    /// Takes the next URL, waiting until one is available
    ///
    /// # Returns
    ///
    /// * `Some(Url)` - The caller now owns this URL and must call `mark_done`
    /// * `None` - The frontier was closed
    pub async fn dequeue(&self) -> Option<Url> {
        loop {
            // Register interest before looking, so an admit or close that
            // lands between the check and the await still wakes us
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(url) = state.queue.pop_front() {
                    return Some(url);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks one dequeued URL as fully processed
    pub fn mark_done(&self) {
        let mut state = self.lock();
        if state.pending == 0 {
            tracing::warn!("mark_done called with no pending work");
            return;
        }

        state.pending -= 1;
        self.publish(&state);
    }

    /// Waits until no URL is queued or in flight, or the frontier is closed
    ///
    /// Resolves immediately on a frontier that has never been seeded.
    pub async fn join(&self) {
        let mut rx = self.progress.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|p| p.pending == 0 || p.closed).await;
    }

    /// Closes the frontier for good
    ///
    /// Every waiting and future `dequeue` returns `None`, `join` returns,
    /// and further admissions are refused.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }

        state.closed = true;
        self.publish(&state);
        drop(state);

        self.available.notify_waiters();
    }

    /// Returns true once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Appends a URL to the visited log
    pub fn record_visit(&self, url: &Url) {
        self.lock().visited.push(url.clone());
    }

    /// Returns the visited log in fetch order
    pub fn visited(&self) -> Vec<Url> {
        self.lock().visited.clone()
    }

    /// Returns a snapshot of the counters
    pub fn stats(&self) -> FrontierStats {
        let state = self.lock();
        FrontierStats {
            queued: state.queue.len(),
            pending: state.pending,
            discovered: state.discovered.len(),
            visited: state.visited.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // Every mutation completes before the guard drops, so a poisoned
        // lock still holds consistent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &FrontierState) {
        self.progress.send_replace(Progress {
            pending: state.pending,
            closed: state.closed,
        });
    }
}
