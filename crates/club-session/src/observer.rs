//! Session change subscription
//!
//! Observers are called synchronously, in list order, after every session
//! change. No provider lock is held during the call, so observers may read the
//! provider; they must not block.

use crate::provider::SessionState;
use std::sync::Arc;

/// Receiver of session changes
pub trait SessionObserver: Send + Sync {
    /// Called after the session state changed
    fn on_session_change(&self, state: &SessionState);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionState) + Send + Sync,
{
    fn on_session_change(&self, state: &SessionState) {
        self(state);
    }
}

/// Handle returned by subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered observer list
#[derive(Default)]
pub(crate) struct ObserverList {
    next_id: u64,
    entries: Vec<(ObserverId, Arc<dyn SessionObserver>)>,
}

impl ObserverList {
    fn allocate(&mut self) -> ObserverId {
        self.next_id += 1;
        ObserverId(self.next_id)
    }

    pub(crate) fn push_back(&mut self, observer: Arc<dyn SessionObserver>) -> ObserverId {
        let id = self.allocate();
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn push_front(&mut self, observer: Arc<dyn SessionObserver>) -> ObserverId {
        let id = self.allocate();
        self.entries.insert(0, (id, observer));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn SessionObserver>> {
        self.entries.iter().map(|(_, o)| Arc::clone(o)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.entries.len())
            .finish()
    }
}
