//! Fetching: the retrieval seam and the single-flight ledger.
//!
//! A [`Fetcher`] retrieves the resource behind a physical id and, while doing
//! so, causes that resource's registrations (`Loader::define`). It reports
//! completion through the [`FetchCompletion`] token, exactly once, whether
//! or not the resource held a valid module.
//!
//! The loader never asks the fetcher twice for the same physical id while a
//! retrieval is in flight or after one finished; see `FetchLedger`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use keel_diagnostic::LoaderError;
use keel_ir::{Locator, PhysicalId};
use rustc_hash::FxHashMap;

use crate::loader::LoaderInner;
use crate::{Define, Loader};

/// Continuation run when a fetch (or a load) finishes.
pub(crate) type Continuation = Box<dyn FnOnce()>;

/// Parameters of one retrieval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub physical_id: PhysicalId,
    pub charset: Option<Rc<str>>,
}

/// Retrieval service.
pub trait Fetcher {
    /// Start retrieving `request.physical_id`.
    ///
    /// Must eventually call [`FetchCompletion::complete`] (synchronously or
    /// later), including on failure.
    fn retrieve(&self, request: FetchRequest, done: FetchCompletion);
}

/// One-shot completion token for a retrieval.
///
/// Holds the loader weakly, so a fetcher that queues tokens does not keep the
/// loader alive. Dropping a token without completing it leaves the physical
/// id in flight forever and is reported as [`LoaderError::FetchAbandoned`].
pub struct FetchCompletion {
    loader: Weak<LoaderInner>,
    physical_id: PhysicalId,
    locator: Locator,
    completed: bool,
}

impl FetchCompletion {
    pub(crate) fn new(loader: Weak<LoaderInner>, physical_id: PhysicalId, locator: Locator) -> Self {
        FetchCompletion {
            loader,
            physical_id,
            locator,
            completed: false,
        }
    }

    pub fn physical_id(&self) -> &PhysicalId {
        &self.physical_id
    }

    /// The locator whose request started this retrieval.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// The loader to register modules with; `None` once it is gone.
    pub fn loader(&self) -> Option<Loader> {
        self.loader.upgrade().map(Loader)
    }

    /// Signal that retrieval finished.
    pub fn complete(mut self) {
        self.completed = true;
        if let Some(loader) = self.loader() {
            loader.finish_fetch(&self.physical_id, &self.locator);
        }
    }
}

impl Drop for FetchCompletion {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        if let Some(inner) = self.loader.upgrade() {
            inner.sink.report_error(&LoaderError::FetchAbandoned {
                physical_id: self.physical_id.clone(),
            });
        }
    }
}

impl fmt::Debug for FetchCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCompletion")
            .field("physical_id", &self.physical_id)
            .field("locator", &self.locator)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

/// A caller waiting on an in-flight retrieval.
pub(crate) struct Waiter {
    pub locator: Locator,
    pub then: Continuation,
}

/// Per-physical-id bookkeeping for single-flight fetches.
#[derive(Default)]
pub(crate) struct FetchLedger {
    /// Waiters per in-flight physical id, in registration order.
    pub in_flight: FxHashMap<PhysicalId, Vec<Waiter>>,
    /// Finished physical ids, with the locator whose request fetched them.
    pub completed: FxHashMap<PhysicalId, Locator>,
}

/// In-memory fetcher: a table of registrations per physical id.
///
/// Retrieval runs the resource's registrations and completes synchronously.
/// Unknown physical ids complete without registering anything, like a
/// missing file. Cloning shares the table and the request log.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    inner: Rc<StaticInner>,
}

#[derive(Default)]
struct StaticInner {
    resources: RefCell<FxHashMap<PhysicalId, Vec<Define>>>,
    requests: RefCell<Vec<FetchRequest>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        StaticFetcher::default()
    }

    /// Add a registration to the resource at `physical_id`.
    #[must_use]
    pub fn with(self, physical_id: &str, define: Define) -> Self {
        self.add(physical_id, define);
        self
    }

    pub fn add(&self, physical_id: &str, define: Define) {
        self.inner
            .resources
            .borrow_mut()
            .entry(PhysicalId::from(physical_id))
            .or_default()
            .push(define);
    }

    /// Every retrieval requested so far, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.inner.requests.borrow().clone()
    }

    /// How many times `physical_id` was retrieved.
    pub fn request_count(&self, physical_id: &str) -> usize {
        self.inner
            .requests
            .borrow()
            .iter()
            .filter(|request| request.physical_id.as_str() == physical_id)
            .count()
    }

    /// Run the registrations of a resource, without completing anything.
    fn execute(&self, physical_id: &PhysicalId, done: &FetchCompletion) {
        let defines = self
            .inner
            .resources
            .borrow()
            .get(physical_id)
            .cloned()
            .unwrap_or_default();
        if let Some(loader) = done.loader() {
            for define in defines {
                loader.define(define);
            }
        }
    }
}

impl Fetcher for StaticFetcher {
    fn retrieve(&self, request: FetchRequest, done: FetchCompletion) {
        self.inner.requests.borrow_mut().push(request.clone());
        self.execute(&request.physical_id, &done);
        done.complete();
    }
}

/// Fetcher whose retrievals finish only when the host says so.
///
/// Requests queue up; `complete` / `complete_next` / `complete_all` run the
/// resource's registrations (from the wrapped [`StaticFetcher`] table) and
/// then signal completion. Useful for driving out-of-order completion.
#[derive(Clone, Default)]
pub struct DeferredFetcher {
    table: StaticFetcher,
    queue: Rc<RefCell<VecDeque<(FetchRequest, FetchCompletion)>>>,
}

impl DeferredFetcher {
    pub fn new(table: StaticFetcher) -> Self {
        DeferredFetcher {
            table,
            queue: Rc::default(),
        }
    }

    pub fn table(&self) -> &StaticFetcher {
        &self.table
    }

    /// Physical ids currently waiting, oldest first.
    pub fn pending(&self) -> Vec<PhysicalId> {
        self.queue
            .borrow()
            .iter()
            .map(|(request, _)| request.physical_id.clone())
            .collect()
    }

    /// Finish the oldest queued retrieval of `physical_id`.
    pub fn complete(&self, physical_id: &str) -> bool {
        let entry = {
            let mut queue = self.queue.borrow_mut();
            let index = queue
                .iter()
                .position(|(request, _)| request.physical_id.as_str() == physical_id);
            index.and_then(|index| queue.remove(index))
        };
        self.finish(entry)
    }

    /// Finish the oldest queued retrieval.
    pub fn complete_next(&self) -> bool {
        let entry = self.queue.borrow_mut().pop_front();
        self.finish(entry)
    }

    /// Finish retrievals until none are queued, including ones queued while
    /// finishing. Returns how many were finished.
    pub fn complete_all(&self) -> usize {
        let mut finished = 0;
        while self.complete_next() {
            finished += 1;
        }
        finished
    }

    fn finish(&self, entry: Option<(FetchRequest, FetchCompletion)>) -> bool {
        let Some((request, done)) = entry else {
            return false;
        };
        self.table.execute(&request.physical_id, &done);
        done.complete();
        true
    }
}

impl Fetcher for DeferredFetcher {
    fn retrieve(&self, request: FetchRequest, done: FetchCompletion) {
        self.table.inner.requests.borrow_mut().push(request.clone());
        self.queue.borrow_mut().push_back((request, done));
    }
}
