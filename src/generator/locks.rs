use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

use crate::types::identifiers::Identifier;

/// Per-identifier mutual exclusion.
///
/// Requests for the same identifier share an output directory and archive
/// name, so they must not overlap. Different identifiers never block each other.
#[derive(Debug, Default)]
pub struct IdentifierLocks {
    held: Mutex<HashSet<Identifier>>,
    released: Condvar,
}

/// Releases its identifier on drop, including on error paths.
#[derive(Debug)]
pub struct IdentifierGuard<'a> {
    locks: &'a IdentifierLocks,
    identifier: Identifier,
}

impl IdentifierLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `identifier` is free, then hold it.
    pub fn acquire(&self, identifier: &Identifier) -> IdentifierGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        while held.contains(identifier) {
            held = self.released.wait(held).unwrap_or_else(|e| e.into_inner());
        }
        held.insert(identifier.clone());

        IdentifierGuard {
            locks: self,
            identifier: identifier.clone(),
        }
    }

    pub fn try_acquire(&self, identifier: &Identifier) -> Option<IdentifierGuard<'_>> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(identifier.clone()) {
            return None;
        }

        Some(IdentifierGuard {
            locks: self,
            identifier: identifier.clone(),
        })
    }

    pub fn is_held(&self, identifier: &Identifier) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(identifier)
    }
}

impl IdentifierGuard<'_> {
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }
}

impl Drop for IdentifierGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.identifier);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_identifier_is_exclusive_until_released() {
        let locks = IdentifierLocks::new();
        let id = Identifier::from(5u8);

        let guard = locks.acquire(&id);
        assert!(locks.is_held(&id));
        assert!(locks.try_acquire(&id).is_none());
        assert!(locks.try_acquire(&Identifier::from(6u8)).is_some());

        drop(guard);
        assert!(!locks.is_held(&id));
        assert!(locks.try_acquire(&id).is_some());
    }

    #[test]
    fn waiters_never_overlap() {
        let locks = Arc::new(IdentifierLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    let _guard = locks.acquire(&Identifier::from(99u8));
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
