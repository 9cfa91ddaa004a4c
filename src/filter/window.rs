//! Per-pool observation windows
//!
//! Each pool identity owns one slot. Holding a slot's guard serialises
//! evaluations of that identity, so concurrent callers for the same pool
//! cannot interleave reads and writes of its window.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

/// Window record for one pool identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub started_at: Instant,
    pub reached_target: bool,
}

/// Where a pool stands relative to its window at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// Never observed, or expired and forgotten
    Unseen,
    /// Inside the window, target not reached yet
    Tracking { started_at: Instant, remaining: Duration },
    /// Target reached; terminal
    Passed,
    /// Window elapsed without reaching target
    Expired { elapsed: Duration },
}

type Slot = Arc<Mutex<Option<WindowState>>>;

pub struct WindowTracker {
    window: Duration,
    slots: DashMap<String, Slot>,
}

impl WindowTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slots: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Acquire exclusive access to the window of `key`
    pub async fn lock(&self, key: &str) -> WindowGuard {
        // Clone the slot out so the map shard is not held across the await
        let slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .value()
            .clone();

        WindowGuard {
            guard: slot.lock_owned().await,
            window: self.window,
        }
    }

    /// Drop the slot of `key` if nobody holds it and it carries no state
    pub fn forget_if_idle(&self, key: &str) -> bool {
        self.slots
            .remove_if(key, |_, slot| {
                Arc::strong_count(slot) == 1
                    && slot.try_lock().map(|state| state.is_none()).unwrap_or(false)
            })
            .is_some()
    }

    /// Number of tracked identities
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Exclusive handle on one identity's window
pub struct WindowGuard {
    guard: OwnedMutexGuard<Option<WindowState>>,
    window: Duration,
}

impl WindowGuard {
    pub fn state(&self) -> Option<WindowState> {
        *self.guard
    }

    pub fn phase(&self, now: Instant) -> WindowPhase {
        match *self.guard {
            None => WindowPhase::Unseen,
            Some(state) if state.reached_target => WindowPhase::Passed,
            Some(state) => {
                let elapsed = now.saturating_duration_since(state.started_at);
                if elapsed > self.window {
                    WindowPhase::Expired { elapsed }
                } else {
                    WindowPhase::Tracking {
                        started_at: state.started_at,
                        remaining: self.window - elapsed,
                    }
                }
            }
        }
    }

    /// Begin tracking if the identity is unseen
    pub fn start(&mut self, started_at: Instant) {
        if self.guard.is_none() {
            *self.guard = Some(WindowState {
                started_at,
                reached_target: false,
            });
        }
    }

    pub fn mark_reached(&mut self) {
        if let Some(state) = self.guard.as_mut() {
            state.reached_target = true;
        }
    }

    /// Forget the window; the next observation starts a fresh one
    pub fn expire(&mut self) {
        *self.guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_phase_transitions() {
        let tracker = WindowTracker::new(Duration::from_secs(60));
        let start = Instant::now();

        let mut guard = tracker.lock("mint").await;
        assert_eq!(guard.phase(start), WindowPhase::Unseen);

        guard.start(start);
        assert_eq!(
            guard.phase(start + Duration::from_secs(60)),
            WindowPhase::Tracking {
                started_at: start,
                remaining: Duration::ZERO
            }
        );
        assert!(matches!(
            guard.phase(start + Duration::from_secs(61)),
            WindowPhase::Expired { .. }
        ));

        guard.mark_reached();
        assert_eq!(guard.phase(start + Duration::from_secs(600)), WindowPhase::Passed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_does_not_reset_running_window() {
        let tracker = WindowTracker::new(Duration::from_secs(60));
        let first = Instant::now();

        let mut guard = tracker.lock("mint").await;
        guard.start(first);
        guard.start(first + Duration::from_secs(10));
        assert_eq!(guard.state().unwrap().started_at, first);
    }

    #[tokio::test]
    async fn test_forget_only_idle_empty_slots() {
        let tracker = WindowTracker::new(Duration::from_secs(60));

        {
            let mut guard = tracker.lock("tracked").await;
            guard.start(Instant::now());
        }
        {
            let _guard = tracker.lock("empty").await;
        }
        assert_eq!(tracker.len(), 2);

        assert!(!tracker.forget_if_idle("tracked"));
        assert!(tracker.forget_if_idle("empty"));
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test]
    async fn test_held_slot_is_not_forgotten() {
        let tracker = WindowTracker::new(Duration::from_secs(60));
        let guard = tracker.lock("busy").await;
        assert!(!tracker.forget_if_idle("busy"));
        drop(guard);
        assert!(tracker.forget_if_idle("busy"));
    }

    #[tokio::test]
    async fn test_same_identity_is_serialised() {
        let tracker = Arc::new(WindowTracker::new(Duration::from_secs(60)));
        let guard = tracker.lock("mint").await;

        let contender = {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                let _guard = tracker.lock("mint").await;
            })
        };

        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }
}
