//! Background persistence worker.
//!
//! # Responsibility
//! - Own the gateway on a dedicated thread so callers never share it.
//! - Run blocking requests and detached group-set saves in issue order.
//! - Publish the outcome of detached saves on an event channel.
//!
//! # Invariants
//! - Requests execute strictly in the order they were sent.
//! - A detached save never reports its outcome through the caller's return
//!   value; only through `PersistenceEvent`s and the log.
//! - Dropping the worker drains queued requests before the thread exits.

use crate::model::group::GroupSet;
use crate::persist::gateway::{PersistResult, PersistenceError, PersistenceGateway};
use log::{debug, error, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

const WORKER_THREAD_NAME: &str = "groupmaker-persist";

type Job = Box<dyn FnOnce(&mut dyn PersistenceGateway) + Send>;

enum Command {
    Run(Job),
    SaveGroupSet { revision: u64, group_set: GroupSet },
    Shutdown,
}

/// Outcome of a detached group-set save.
#[derive(Debug)]
pub enum PersistenceEvent {
    GroupSetSaved {
        revision: u64,
        snapshot_id: i64,
    },
    GroupSetSaveFailed {
        revision: u64,
        error: PersistenceError,
    },
}

impl PersistenceEvent {
    pub fn revision(&self) -> u64 {
        match self {
            Self::GroupSetSaved { revision, .. } | Self::GroupSetSaveFailed { revision, .. } => {
                *revision
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::GroupSetSaveFailed { .. })
    }
}

/// Handle to the persistence thread.
pub struct PersistenceWorker {
    commands: Sender<Command>,
    events_tx: Sender<PersistenceEvent>,
    events: Receiver<PersistenceEvent>,
    thread: Option<JoinHandle<()>>,
}

impl PersistenceWorker {
    /// Moves `gateway` onto a new worker thread.
    ///
    /// # Errors
    /// - `Spawn` when the OS refuses to start the thread.
    pub fn spawn<G>(gateway: G) -> PersistResult<Self>
    where
        G: PersistenceGateway + Send + 'static,
    {
        let (commands, command_rx) = mpsc::channel();
        let (events_tx, events) = mpsc::channel();
        let worker_events = events_tx.clone();

        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(gateway, command_rx, worker_events))
            .map_err(PersistenceError::Spawn)?;

        Ok(Self {
            commands,
            events_tx,
            events,
            thread: Some(thread),
        })
    }

    /// Runs `op` on the worker thread and waits for its result.
    ///
    /// # Errors
    /// - Whatever `op` returns.
    /// - `WorkerStopped` when the worker thread is gone.
    pub fn call<T, F>(&self, op: F) -> PersistResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn PersistenceGateway) -> PersistResult<T> + Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        let job: Job = Box::new(move |gateway: &mut dyn PersistenceGateway| {
            // Receiver may already be gone if the caller gave up.
            let _ = reply_tx.send(op(gateway));
        });
        self.commands
            .send(Command::Run(job))
            .map_err(|_| PersistenceError::WorkerStopped)?;
        reply_rx
            .recv()
            .map_err(|_| PersistenceError::WorkerStopped)?
    }

    /// Queues a group-set save without waiting for it.
    ///
    /// The outcome arrives later as a `PersistenceEvent` tagged with
    /// `revision`.
    pub fn save_group_set_detached(&self, revision: u64, group_set: GroupSet) {
        let command = Command::SaveGroupSet {
            revision,
            group_set,
        };
        if self.commands.send(command).is_err() {
            error!(
                "event=group_set_save module=persist status=error revision={} error_code=worker_stopped",
                revision
            );
            let _ = self.events_tx.send(PersistenceEvent::GroupSetSaveFailed {
                revision,
                error: PersistenceError::WorkerStopped,
            });
        }
    }

    /// Blocks until every request issued before this call has completed.
    pub fn flush(&self) -> PersistResult<()> {
        self.call(|_| Ok(()))
    }

    /// Returns save outcomes published since the last drain, oldest first.
    pub fn drain_events(&self) -> Vec<PersistenceEvent> {
        self.events.try_iter().collect()
    }
}

impl Drop for PersistenceWorker {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("event=worker_stop module=persist status=error error_code=worker_panicked");
            }
        }
    }
}

fn run_worker<G: PersistenceGateway>(
    mut gateway: G,
    commands: Receiver<Command>,
    events: Sender<PersistenceEvent>,
) {
    debug!("event=worker_start module=persist status=ok");

    for command in commands {
        match command {
            Command::Run(job) => job(&mut gateway),
            Command::SaveGroupSet {
                revision,
                group_set,
            } => {
                let event = match gateway.save_group_set(&group_set) {
                    Ok(snapshot_id) => {
                        debug!(
                            "event=group_set_save module=persist status=ok revision={} snapshot_id={} groups={} members={}",
                            revision,
                            snapshot_id,
                            group_set.group_count(),
                            group_set.member_count()
                        );
                        PersistenceEvent::GroupSetSaved {
                            revision,
                            snapshot_id,
                        }
                    }
                    Err(err) => {
                        error!(
                            "event=group_set_save module=persist status=error revision={} error={}",
                            revision, err
                        );
                        PersistenceEvent::GroupSetSaveFailed {
                            revision,
                            error: err,
                        }
                    }
                };
                let _ = events.send(event);
            }
            Command::Shutdown => break,
        }
    }

    debug!("event=worker_stop module=persist status=ok");
}
