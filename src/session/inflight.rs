//! Per-manifest markers for process starts that are still running.
//!
//! The first caller to claim a manifest becomes the leader and starts the
//! process; later callers wait on the leader's channel. The channel closes
//! when the leader's [`StartGuard`] drops, whether the start succeeded,
//! failed, or the leader was cancelled.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tokio::sync::watch;

struct InFlight {
    generation: u64,
    done: watch::Receiver<()>,
}

#[derive(Default)]
pub(super) struct InFlightStarts {
    starts: Mutex<HashMap<PathBuf, InFlight>>,
}

pub(super) enum Claim<'a> {
    Leader(StartGuard<'a>),
    Waiter(watch::Receiver<()>),
}

impl InFlightStarts {
    /// Claims the start of `manifest` for registry `generation`.
    ///
    /// A marker left over from an older generation is replaced, so a start
    /// that began before an invalidation never blocks a fresh one.
    pub(super) fn claim(&self, manifest: &Path, generation: u64) -> Claim<'_> {
        let mut starts = self.starts.lock();
        if let Some(start) = starts.get(manifest) {
            if start.generation == generation {
                return Claim::Waiter(start.done.clone());
            }
        }

        let (tx, rx) = watch::channel(());
        starts.insert(
            manifest.to_path_buf(),
            InFlight {
                generation,
                done: rx,
            },
        );
        Claim::Leader(StartGuard {
            starts: self,
            manifest: manifest.to_path_buf(),
            generation,
            _done: tx,
        })
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.starts.lock().len()
    }
}

/// Waits until the leader of a start has finished.
pub(super) async fn finished(mut done: watch::Receiver<()>) {
    // Nothing is ever sent; the leader dropping its sender is the signal.
    while done.changed().await.is_ok() {}
}

/// Held by the leader for the duration of a start.
pub(super) struct StartGuard<'a> {
    starts: &'a InFlightStarts,
    manifest: PathBuf,
    generation: u64,
    _done: watch::Sender<()>,
}

impl StartGuard<'_> {
    pub(super) fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        let mut starts = self.starts.starts.lock();
        if starts
            .get(&self.manifest)
            .is_some_and(|start| start.generation == self.generation)
        {
            starts.remove(&self.manifest);
        }
        // `_done` drops after this body, so waiters wake with the marker gone.
    }
}
