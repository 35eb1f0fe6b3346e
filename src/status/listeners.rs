use super::monitor::ReplicationStatus;
use std::sync::{Arc, Mutex, Weak};

/// Callback fired after a status monitor accepted a snapshot.
///
/// Runs synchronously on the notifying task; implementations must not block.
pub trait StatusListener: Send + Sync {
    fn status_changed(&self, status: &ReplicationStatus);
}

/// Ordered set of listeners keyed by `Arc` identity.
///
/// Entries are held weakly: registering does not keep a listener alive, and
/// a listener dropped by its owner stops receiving notifications.
#[derive(Default)]
pub struct ListenerSet {
    entries: Mutex<Vec<Weak<dyn StatusListener>>>,
}

fn same_listener(entry: &Weak<dyn StatusListener>, listener: &Arc<dyn StatusListener>) -> bool {
    // Compare data pointers only; vtable pointers differ across codegen units.
    std::ptr::eq(
        Weak::as_ptr(entry) as *const (),
        Arc::as_ptr(listener) as *const (),
    )
}

fn prune(entries: &mut Vec<Weak<dyn StatusListener>>) {
    entries.retain(|l| l.strong_count() > 0);
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if this listener was already registered.
    pub fn add(&self, listener: Arc<dyn StatusListener>) -> bool {
        let mut entries = self.entries.lock().unwrap();
        prune(&mut entries);
        if entries.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        entries.push(Arc::downgrade(&listener));
        true
    }

    /// Returns false if this listener was not registered.
    pub fn remove(&self, listener: &Arc<dyn StatusListener>) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|l| !same_listener(l, listener));
        let removed = entries.len() != before;
        prune(&mut entries);
        removed
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        prune(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, listener: &Arc<dyn StatusListener>) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|l| same_listener(l, listener))
    }

    /// Live listeners in registration order. Callers notify from the copy
    /// so a listener may add or remove itself while running.
    pub fn snapshot(&self) -> Vec<Arc<dyn StatusListener>> {
        let mut entries = self.entries.lock().unwrap();
        prune(&mut entries);
        entries.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
