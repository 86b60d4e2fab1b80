//! Fallback autoplay bookkeeping
//!
//! When a queue runs out with repeat off, the controller plays a random
//! catalog track. If the catalog is not ready the pick is deferred until the
//! catalog load completes. At most one pick is pending at a time; arming a new
//! one or any explicit play supersedes it.

/// What to do when the queue is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayPlan {
    /// Catalog is ready; pick now
    Pick,
    /// Catalog never loaded; start loading and pick when it lands
    LoadCatalog,
    /// Someone else is loading the catalog; wait for it, bounded
    AwaitCatalog,
}

impl AutoplayPlan {
    pub fn for_catalog(loaded: bool, loading: bool) -> Self {
        if loaded {
            AutoplayPlan::Pick
        } else if loading {
            AutoplayPlan::AwaitCatalog
        } else {
            AutoplayPlan::LoadCatalog
        }
    }
}

/// Deferred pick state
#[derive(Debug, Default)]
pub struct Autoplay {
    pending: Option<u64>,
    next_token: u64,
}

impl Autoplay {
    /// Arm a deferred pick, replacing any previous one
    ///
    /// Returns the token a wait timeout must present to expire it.
    pub fn arm(&mut self) -> u64 {
        self.next_token += 1;
        self.pending = Some(self.next_token);
        self.next_token
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume the pending pick, if any
    pub fn take(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Drop the pending pick if it is still the one `token` refers to
    pub fn expire(&mut self, token: u64) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_follows_catalog_status() {
        assert_eq!(AutoplayPlan::for_catalog(true, false), AutoplayPlan::Pick);
        assert_eq!(AutoplayPlan::for_catalog(true, true), AutoplayPlan::Pick);
        assert_eq!(AutoplayPlan::for_catalog(false, true), AutoplayPlan::AwaitCatalog);
        assert_eq!(AutoplayPlan::for_catalog(false, false), AutoplayPlan::LoadCatalog);
    }

    #[test]
    fn stale_timeout_does_not_cancel_newer_pick() {
        let mut autoplay = Autoplay::default();
        let first = autoplay.arm();
        let second = autoplay.arm();

        assert!(!autoplay.expire(first));
        assert!(autoplay.is_pending());
        assert!(autoplay.expire(second));
        assert!(!autoplay.is_pending());
    }

    #[test]
    fn take_consumes_once() {
        let mut autoplay = Autoplay::default();
        autoplay.arm();
        assert!(autoplay.take());
        assert!(!autoplay.take());

        autoplay.arm();
        autoplay.cancel();
        assert!(!autoplay.take());
    }
}
