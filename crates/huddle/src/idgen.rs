//! Sequential group-id allocation.
//!
//! A dedicated thread owns the next-id counter and hands ids to consumers
//! over a rendezvous channel: an id is only minted at the moment some
//! worker is ready to take it, so ids are never duplicated or skipped no
//! matter how many consumers pull concurrently.

use crate::error::{HuddleError, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use huddle_core::trie::GroupId;
use std::thread::{self, JoinHandle};

/// Handle to the allocator task.
///
/// Workers pull ids through cloned [`IdSource`] handles; the owner calls
/// [`shutdown`](IdAllocator::shutdown) once all consumers are done.
pub struct IdAllocator {
    ids: Receiver<GroupId>,
    stop: Sender<()>,
    handle: JoinHandle<GroupId>,
}

impl IdAllocator {
    /// Spawn the allocator task. Ids start at zero.
    #[must_use]
    pub fn spawn() -> Self {
        let (id_tx, id_rx) = bounded::<GroupId>(0);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::spawn(move || {
            let mut next: GroupId = 0;
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    send(id_tx, next) -> sent => {
                        if sent.is_err() {
                            break;
                        }
                        next += 1;
                    }
                }
            }
            next
        });

        Self {
            ids: id_rx,
            stop: stop_tx,
            handle,
        }
    }

    /// A cloneable consumer handle for pulling fresh ids.
    #[must_use]
    pub fn source(&self) -> IdSource {
        IdSource {
            ids: self.ids.clone(),
        }
    }

    /// Signal termination and wait for the allocator task.
    ///
    /// Returns one past the last id actually issued, i.e. the number of
    /// ids handed out.
    pub fn shutdown(self) -> Result<GroupId> {
        let _ = self.stop.send(());
        drop(self.ids);
        self.handle
            .join()
            .map_err(|_| HuddleError::Pipeline("id allocator thread panicked".into()))
    }
}

/// Consumer side of the allocator.
#[derive(Clone)]
pub struct IdSource {
    ids: Receiver<GroupId>,
}

impl IdSource {
    /// Block until the allocator hands over the next unused id.
    pub fn next_id(&self) -> Result<GroupId> {
        self.ids
            .recv()
            .map_err(|_| HuddleError::Pipeline("id allocator stopped".into()))
    }
}
