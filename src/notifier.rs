// src/notifier.rs

use log::{debug, error};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CourseEvent {
    Saved { course_id: String, instructor_id: String },
    Deleted { course_id: String, instructor_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&CourseEvent) + Send + Sync>;

/// Fan-out of course changes to whoever shows course lists.
///
/// Owned by [`crate::models::AppState`] and handed out by reference; callers
/// must `unsubscribe` when they stop caring, otherwise the callback lives as
/// long as the notifier.
#[derive(Default)]
pub struct CourseRefreshNotifier {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl CourseRefreshNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CourseEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Calls every listener. A panicking listener is logged and skipped.
    pub fn notify(&self, event: &CourseEvent) {
        // Snapshot so listeners may (un)subscribe from inside a callback.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        debug!(
            "Course refresh triggered: {:?} ({} listeners)",
            event, listeners.len()
        );
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                error!("Course refresh listener panicked on {:?}", event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn saved() -> CourseEvent {
        CourseEvent::Saved {
            course_id: "c1".into(),
            instructor_id: "alice".into(),
        }
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let notifier = CourseRefreshNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let id = notifier.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        notifier.notify(&saved());
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify(&saved());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn panicking_listener_does_not_stop_others() {
        let notifier = CourseRefreshNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        notifier.subscribe(|_| panic!("listener failure"));
        let h = Arc::clone(&hits);
        notifier.subscribe(move |e| {
            assert_eq!(e, &saved());
            h.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify(&saved());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
