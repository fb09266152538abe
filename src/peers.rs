use std::sync::{Mutex, MutexGuard};

use crate::types::PeerAddress;

/// The list of peers this node sends to.
///
/// Entries are kept in insertion order and never removed or deduplicated:
/// adding the same address twice means it is dialed twice per broadcast.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: Mutex<Vec<PeerAddress>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, address: impl Into<PeerAddress>) {
        self.lock().push(address.into());
    }

    /// Copy of the list as of this call. Later additions do not show up in
    /// a snapshot already taken.
    pub fn snapshot(&self) -> Vec<PeerAddress> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PeerAddress>> {
        // A panic while holding the lock cannot leave a half-pushed entry.
        self.peers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn starts_empty() {
        let registry = PeerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn keeps_insertion_order_and_duplicates() {
        let registry = PeerRegistry::new();
        registry.add("1.2.3.4:1");
        registry.add("127.0.0.1:9001");
        registry.add("1.2.3.4:1");

        assert_eq!(
            registry.snapshot(),
            vec!["1.2.3.4:1", "127.0.0.1:9001", "1.2.3.4:1"]
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn snapshot_is_detached_from_later_adds() {
        let registry = PeerRegistry::new();
        registry.add("a:1");
        let before = registry.snapshot();
        registry.add("b:2");

        assert_eq!(before, vec!["a:1"]);
        assert_eq!(registry.snapshot(), vec!["a:1", "b:2"]);
    }

    #[test]
    fn concurrent_adds_are_all_kept() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 50;

        let registry = Arc::new(PeerRegistry::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        registry.add(format!("10.0.{t}.{i}:9000"));
                        // Everyone also adds the same address.
                        registry.add("shared:1");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), THREADS * PER_THREAD * 2);
        assert_eq!(
            snapshot.iter().filter(|p| *p == "shared:1").count(),
            THREADS * PER_THREAD
        );
        for t in 0..THREADS {
            for i in 0..PER_THREAD {
                assert!(snapshot.contains(&format!("10.0.{t}.{i}:9000")));
            }
        }
    }
}
