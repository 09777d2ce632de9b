use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};

use crate::query::{self, Hit, Query, SearchMode};
use crate::sort;
use crate::store::EntryStore;

/// Handle to the single worker thread that executes queries and rebuilds.
///
/// All disk I/O (walk, stat, index load/save) happens on that thread; the
/// interactive side only exchanges messages. There is no cancellation: a
/// dispatched job always runs to completion.
pub struct SessionHandle {
    cmd_tx: Sender<SessionCommand>,
    job_counter: AtomicU64,
}

impl SessionHandle {
    /// Dispatches a search job and returns its id. The store snapshot is
    /// shared read-only; a rebuild never mutates it in place.
    pub fn request_search(&self, query: Query, store: Arc<EntryStore>) -> u64 {
        let job_id = self.next_job_id();
        let _ = self.cmd_tx.send(SessionCommand::Search {
            job_id,
            query,
            store,
        });
        job_id
    }

    pub fn request_rebuild(&self, root: PathBuf, index_path: PathBuf) -> u64 {
        let job_id = self.next_job_id();
        let _ = self.cmd_tx.send(SessionCommand::Rebuild {
            job_id,
            root,
            index_path,
        });
        job_id
    }

    fn next_job_id(&self) -> u64 {
        self.job_counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

enum SessionCommand {
    Search {
        job_id: u64,
        query: Query,
        store: Arc<EntryStore>,
    },
    Rebuild {
        job_id: u64,
        root: PathBuf,
        index_path: PathBuf,
    },
}

#[derive(Debug)]
pub enum SessionMessage {
    /// Single delivery for one accepted search: the final, sorted snapshot.
    SearchComplete {
        job_id: u64,
        hits: Vec<Hit>,
        mode: SearchMode,
    },
    /// Single delivery for one rebuild. The new store is complete even when
    /// persisting it failed; the persist error is surfaced alongside.
    RebuildComplete {
        job_id: u64,
        store: EntryStore,
        persist_error: Option<String>,
    },
}

pub fn spawn() -> (SessionHandle, Receiver<SessionMessage>) {
    let (cmd_tx, cmd_rx) = unbounded();
    let (msg_tx, msg_rx) = unbounded();

    thread::Builder::new()
        .name("findex-worker".into())
        .spawn(move || worker_loop(cmd_rx, msg_tx))
        .expect("failed to spawn search worker thread");

    (
        SessionHandle {
            cmd_tx,
            job_counter: AtomicU64::new(0),
        },
        msg_rx,
    )
}

fn worker_loop(cmd_rx: Receiver<SessionCommand>, msg_tx: Sender<SessionMessage>) {
    while let Ok(command) = cmd_rx.recv() {
        match command {
            SessionCommand::Search {
                job_id,
                query,
                store,
            } => {
                debug!(
                    "search job={job_id} term={:?} root={}",
                    query.term,
                    query.root.display()
                );
                let (mut hits, mode) = query::execute(&query, &store);
                sort::apply(&mut hits, query.sort);
                info!("search job={job_id} mode={mode:?} hits={}", hits.len());
                let _ = msg_tx.send(SessionMessage::SearchComplete {
                    job_id,
                    hits,
                    mode,
                });
            }
            SessionCommand::Rebuild {
                job_id,
                root,
                index_path,
            } => {
                debug!("rebuild job={job_id} root={}", root.display());
                let store = EntryStore::rebuild(&root);
                let persist_error = match store.save(&index_path) {
                    Ok(()) => None,
                    Err(err) => {
                        warn!("rebuild job={job_id} persist failed: {err}");
                        Some(err.to_string())
                    }
                };
                let _ = msg_tx.send(SessionMessage::RebuildComplete {
                    job_id,
                    store,
                    persist_error,
                });
            }
        }
    }
}
