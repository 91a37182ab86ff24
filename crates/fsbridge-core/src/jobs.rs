//! Job identity allocation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fsbridge_events::JobHandle;
use once_cell::sync::Lazy;

static GLOBAL: Lazy<Arc<JobIdAllocator>> = Lazy::new(|| Arc::new(JobIdAllocator::new()));

/// Monotonic source of job handles.
///
/// The counter is incremented before each issuance, so the first handle is
/// `1` and [`JobHandle::UNASSIGNED`] is never handed out. It is never reset.
#[derive(Debug, Default)]
pub struct JobIdAllocator {
    issued: AtomicU64,
}

impl JobIdAllocator {
    /// Fresh allocator whose first handle is `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
        }
    }

    /// Process-wide allocator shared by every controller that is not given
    /// its own.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Issue the next handle.
    pub fn next_id(&self) -> JobHandle {
        JobHandle::new(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Number of handles issued so far (equal to the last handle issued).
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn first_handle_is_one_and_handles_increase() {
        let allocator = JobIdAllocator::new();
        assert_eq!(allocator.issued(), 0);
        let first = allocator.next_id();
        let second = allocator.next_id();
        assert_eq!(first.get(), 1);
        assert!(second > first);
        assert_eq!(allocator.issued(), 2);
    }

    #[test]
    fn concurrent_allocation_never_repeats() {
        let allocator = Arc::new(JobIdAllocator::new());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                thread::spawn(move || (0..250).map(|_| allocator.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for worker in workers {
            for handle in worker.join().expect("worker panicked") {
                assert!(handle.is_assigned());
                assert!(seen.insert(handle), "duplicate handle {handle}");
            }
        }
        assert_eq!(seen.len(), 1_000);
        assert_eq!(allocator.issued(), 1_000);
    }

    #[test]
    fn global_allocator_is_shared() {
        let a = JobIdAllocator::global();
        let b = JobIdAllocator::global();
        assert!(Arc::ptr_eq(&a, &b));
        let before = a.next_id();
        assert!(b.next_id() > before);
    }
}
