use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::warn;

use crate::query::{Hit, Query, SearchMode};
use crate::session::{self, SessionHandle, SessionMessage};
use crate::sort::{self, SortDirection, SortKey, SortSpec};
use crate::store::{EntryStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

#[derive(Debug)]
pub enum EngineError {
    /// Empty search terms are rejected synchronously, before any worker
    /// dispatch and without touching the cached results.
    EmptyQuery,
    /// A search or rebuild is already in flight; one job at a time.
    Busy,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::EmptyQuery => write!(f, "search term is empty"),
            EngineError::Busy => write!(f, "a search or index rebuild is already running"),
        }
    }
}

impl std::error::Error for EngineError {}

/// What one completed job delivered. Each accepted job produces exactly one
/// of these from [`Engine::poll`] or [`Engine::wait`].
#[derive(Debug)]
pub enum Delivery {
    Search {
        hits: Vec<Hit>,
        mode: SearchMode,
    },
    Index {
        entries: usize,
        persist_error: Option<String>,
    },
}

/// The engine context: owns the entry store, the current sort spec, the
/// cached last results, and the Idle/Running gate. All operations go through
/// this one object; there are no ambient singletons.
///
/// The gate, not store locking, is what prevents concurrent mutation: search
/// and rebuild are never in flight together, the worker reads an `Arc`
/// snapshot of the store, and a rebuilt store is swapped in wholesale on
/// completion, so no query ever observes a partially built index.
pub struct Engine {
    handle: SessionHandle,
    rx: Receiver<SessionMessage>,
    store: Arc<EntryStore>,
    index_path: PathBuf,
    sort: SortSpec,
    results: Vec<Hit>,
    state: SessionState,
    active_job: Option<u64>,
}

impl Engine {
    pub fn new(index_path: PathBuf) -> Self {
        let (handle, rx) = session::spawn();
        Self {
            handle,
            rx,
            store: Arc::new(EntryStore::default()),
            index_path,
            sort: SortSpec::default(),
            results: Vec::new(),
            state: SessionState::Idle,
            active_job: None,
        }
    }

    /// Startup load of a previously persisted index. A corrupt or unreadable
    /// file degrades to an empty store (live-search mode) and returns the
    /// warning for the caller to surface once; it is never fatal.
    pub fn load_index_if_present(&mut self) -> Option<String> {
        match EntryStore::load(&self.index_path) {
            Ok(Some(store)) => {
                self.store = Arc::new(store);
                None
            }
            Ok(None) => None,
            Err(err @ StoreError::Corrupt { .. }) | Err(err @ StoreError::Io { .. }) => {
                warn!("{err}; falling back to live search");
                self.store = Arc::new(EntryStore::default());
                Some(err.to_string())
            }
            Err(err) => {
                warn!("{err}");
                Some(err.to_string())
            }
        }
    }

    /// Starts one search. Fails fast, synchronously, on an empty term or
    /// while another job is running; on success the gate closes until the
    /// delivery is polled.
    pub fn search(&mut self, term: &str, root: &Path) -> Result<(), EngineError> {
        if term.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }
        if self.state == SessionState::Running {
            return Err(EngineError::Busy);
        }

        let query = Query {
            term: term.trim().to_string(),
            root: root.to_path_buf(),
            sort: self.sort,
        };
        let job_id = self.handle.request_search(query, Arc::clone(&self.store));
        self.state = SessionState::Running;
        self.active_job = Some(job_id);
        Ok(())
    }

    /// Session-gated full rebuild over `root`. The worker constructs and
    /// persists the new store; it is swapped in wholesale when the delivery
    /// is polled. A persist failure is surfaced in the delivery while the
    /// in-memory store stays valid for this session.
    pub fn index_directory(&mut self, root: &Path) -> Result<(), EngineError> {
        if self.state == SessionState::Running {
            return Err(EngineError::Busy);
        }

        let job_id = self
            .handle
            .request_rebuild(root.to_path_buf(), self.index_path.clone());
        self.state = SessionState::Running;
        self.active_job = Some(job_id);
        Ok(())
    }

    /// Re-orders the cached last-delivered results in place. Pure function
    /// of the cache: touches neither the store nor the disk.
    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort = SortSpec::new(key, direction);
        sort::apply(&mut self.results, self.sort);
    }

    /// Drains completed work without blocking. Delivery and the transition
    /// back to Idle happen in the same call, so a caller never observes
    /// results alongside a stale Running state. Each accepted job yields
    /// exactly one delivery.
    pub fn poll(&mut self) -> Option<Delivery> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if let Some(delivery) = self.handle_message(message) {
                        return Some(delivery);
                    }
                }
                Err(_) => return None,
            }
        }
    }

    /// Blocking variant of [`poll`] for callers without an event loop.
    /// Returns `None` when nothing is running or the timeout elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<Delivery> {
        while self.state == SessionState::Running {
            match self.rx.recv_timeout(timeout) {
                Ok(message) => {
                    if let Some(delivery) = self.handle_message(message) {
                        return Some(delivery);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    fn handle_message(&mut self, message: SessionMessage) -> Option<Delivery> {
        match message {
            SessionMessage::SearchComplete { job_id, hits, mode } => {
                if self.active_job != Some(job_id) {
                    return None;
                }
                self.results = hits.clone();
                self.active_job = None;
                self.state = SessionState::Idle;
                Some(Delivery::Search { hits, mode })
            }
            SessionMessage::RebuildComplete {
                job_id,
                store,
                persist_error,
            } => {
                if self.active_job != Some(job_id) {
                    return None;
                }
                let entries = store.len();
                self.store = Arc::new(store);
                self.active_job = None;
                self.state = SessionState::Idle;
                Some(Delivery::Index {
                    entries,
                    persist_error,
                })
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Cached snapshot of the last delivery, in the current sort order.
    pub fn results(&self) -> &[Hit] {
        &self.results
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }
}
