use std::sync::Arc;

/// Handle returned when a listener is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fired after the transport reaches `Open`
pub type OpenListener = dyn Fn() + Send + Sync;
/// Fired with the failure detail when the transport errors
pub type ErrorListener = dyn Fn(&str) + Send + Sync;
/// Fired with the close code when the transport closes
pub type CloseListener = dyn Fn(u16) + Send + Sync;

/// Ordered observer list, de-duplicated by `Arc` identity
pub struct Listeners<F: ?Sized> {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<F>)>,
}

impl<F: ?Sized> Listeners<F> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Register a listener
    ///
    /// Adding an `Arc` that is already registered returns its existing id.
    pub fn add(&mut self, listener: Arc<F>) -> ListenerId {
        if let Some((id, _)) = self
            .entries
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, &listener))
        {
            return *id;
        }

        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Remove a listener; unknown ids are ignored
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        before != self.entries.len()
    }

    /// Copy of the current listeners in registration order
    ///
    /// Callers invoke the snapshot after releasing any lock, so a listener
    /// may add or remove listeners without deadlocking.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// The three transport observer lists
#[derive(Default)]
pub struct TransportListeners {
    pub open: Listeners<OpenListener>,
    pub error: Listeners<ErrorListener>,
    pub close: Listeners<CloseListener>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_same_arc_is_registered_once() {
        let mut listeners: Listeners<OpenListener> = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let listener: Arc<OpenListener> = Arc::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let first = listeners.add(Arc::clone(&listener));
        let second = listeners.add(Arc::clone(&listener));
        assert_eq!(first, second);
        assert_eq!(listeners.len(), 1);

        for l in listeners.snapshot() {
            l();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_removal_is_idempotent_and_keeps_order() {
        let mut listeners: Listeners<CloseListener> = Listeners::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let ids: Vec<ListenerId> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                let l: Arc<CloseListener> = Arc::new(move |_code| order.lock().push(i));
                listeners.add(l)
            })
            .collect();

        assert!(listeners.remove(ids[1]));
        assert!(!listeners.remove(ids[1]));

        for l in listeners.snapshot() {
            l(1000);
        }
        assert_eq!(*order.lock(), vec![0, 2]);
    }
}
