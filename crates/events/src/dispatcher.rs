//! In-process event dispatcher (fire-and-forget fan-out).
//!
//! Handlers are registered per **event kind**. `dispatch()` starts one independent
//! worker per matching handler and returns immediately; it never waits for the
//! handlers and never reports their outcome back to the caller.
//!
//! ## Delivery Guarantees
//!
//! - **Best effort**: a handler that fails or panics is logged and forgotten
//! - **No ordering**: handlers of the same event run concurrently
//! - **No cancellation**: once started, a handler runs to completion
//!
//! ## Thread Safety
//!
//! The registry is guarded by a reader/writer lock. `register()` takes the write
//! lock; `dispatch()` snapshots the handler list under the read lock and releases
//! it before spawning, so slow handlers never block registration. A registration
//! racing with an in-flight dispatch may or may not be observed by it.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use tracing::{debug, error, warn};

use crate::Event;

/// Event handler function type.
///
/// Handlers receive a shared, type-erased event; use [`Event::downcast_ref`]
/// (on `dyn Event`) to get at the concrete payload.
pub type EventHandler = Arc<dyn Fn(Arc<dyn Event>) -> anyhow::Result<()> + Send + Sync>;

/// Registry of event handlers keyed by event kind.
///
/// Owned explicitly by the running service and shared by reference (usually
/// `Arc<EventDispatcher>`); there is no process-global registry.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl core::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = handlers
            .iter()
            .map(|(kind, list)| (kind.as_str(), list.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("handlers", &counts)
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `event_kind`.
    ///
    /// Multiple handlers per kind are kept in registration order; registering the
    /// same closure twice runs it twice.
    pub fn register<F>(&self, event_kind: impl Into<String>, handler: F)
    where
        F: Fn(Arc<dyn Event>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let event_kind = event_kind.into();
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let list = handlers.entry(event_kind.clone()).or_default();
        list.push(Arc::new(handler));
        debug!(event_kind = %event_kind, handlers = list.len(), "event handler registered");
    }

    /// Number of handlers currently registered for `event_kind`.
    pub fn handler_count(&self, event_kind: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_kind)
            .map_or(0, Vec::len)
    }

    /// Fan `event` out to every handler registered under `event_kind`.
    ///
    /// Returns the number of handlers started. Zero handlers is a silent no-op.
    pub fn dispatch(&self, event_kind: &str, event: Arc<dyn Event>) -> usize {
        let snapshot: Vec<EventHandler> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            match handlers.get(event_kind) {
                Some(list) => list.clone(),
                None => Vec::new(),
            }
        };

        if snapshot.is_empty() {
            debug!(event_kind, "event dispatched (no handlers registered)");
            return 0;
        }

        let mut started = 0;
        for (index, handler) in snapshot.into_iter().enumerate() {
            let event = Arc::clone(&event);
            let kind = event_kind.to_string();
            let spawned = thread::Builder::new()
                .name(format!("event-handler-{kind}-{index}"))
                .spawn(move || run_isolated(&kind, index, &handler, event));

            match spawned {
                Ok(_) => started += 1,
                Err(e) => {
                    error!(event_kind, handler = index, error = %e, "failed to spawn event handler")
                }
            }
        }

        debug!(event_kind, handlers = started, "event dispatched");
        started
    }
}

/// Run one handler, trapping both its error and any panic.
fn run_isolated(event_kind: &str, index: usize, handler: &EventHandler, event: Arc<dyn Event>) {
    match catch_unwind(AssertUnwindSafe(|| handler(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(event_kind, handler = index, error = %e, "event handler failed");
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(event_kind, handler = index, panic = %message, "event handler panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    use chrono::{DateTime, Utc};

    #[derive(Debug)]
    struct Ping {
        n: u32,
        at: DateTime<Utc>,
    }

    impl Event for Ping {
        fn event_kind(&self) -> &'static str {
            "x"
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn ping(n: u32) -> Arc<dyn Event> {
        Arc::new(Ping { n, at: Utc::now() })
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn dispatch_invokes_every_registered_handler_once() {
        let dispatcher = EventDispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel::<usize>();

        for id in 0..3 {
            let calls = calls.clone();
            let tx = tx.clone();
            dispatcher.register("x", move |_event| {
                calls.fetch_add(1, Ordering::SeqCst);
                tx.send(id).unwrap();
                Ok(())
            });
        }

        assert_eq!(dispatcher.dispatch("x", ping(1)), 3);

        let mut seen: Vec<usize> = (0..3).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2]);

        // No extra invocations trickle in afterwards.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn dispatch_without_handlers_is_a_noop() {
        let dispatcher = EventDispatcher::new();
        assert_eq!(dispatcher.dispatch("nobody.listens", ping(1)), 0);
        assert_eq!(dispatcher.handler_count("nobody.listens"), 0);
    }

    #[test]
    fn dispatch_only_reaches_handlers_of_the_same_kind() {
        let dispatcher = EventDispatcher::new();
        let (tx, rx) = mpsc::channel::<&'static str>();

        let tx_x = tx.clone();
        dispatcher.register("x", move |_| {
            tx_x.send("x").unwrap();
            Ok(())
        });
        dispatcher.register("y", move |_| {
            tx.send("y").unwrap();
            Ok(())
        });

        dispatcher.dispatch("x", ping(1));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "x");
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn dispatch_returns_before_handlers_finish() {
        let dispatcher = EventDispatcher::new();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let release_rx = std::sync::Mutex::new(release_rx);

        dispatcher.register("x", move |_| {
            release_rx.lock().unwrap().recv_timeout(WAIT)?;
            done_tx.send(()).unwrap();
            Ok(())
        });

        // The handler is still blocked when dispatch hands control back.
        assert_eq!(dispatcher.dispatch("x", ping(1)), 1);
        assert!(done_rx.try_recv().is_err());

        release_tx.send(()).unwrap();
        done_rx.recv_timeout(WAIT).unwrap();
    }

    #[test]
    fn failing_and_panicking_handlers_do_not_affect_others() {
        let dispatcher = EventDispatcher::new();
        let (tx, rx) = mpsc::channel::<u32>();

        dispatcher.register("x", |_| anyhow::bail!("boom"));
        dispatcher.register("x", |_| panic!("handler blew up"));
        dispatcher.register("x", move |event| {
            let ping = event.downcast_ref::<Ping>().expect("ping event");
            tx.send(ping.n).unwrap();
            Ok(())
        });

        assert_eq!(dispatcher.dispatch("x", ping(42)), 3);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 42);

        // The dispatcher stays usable after a handler panicked.
        assert_eq!(dispatcher.handler_count("x"), 3);
    }

    #[test]
    fn duplicate_registrations_are_kept() {
        let dispatcher = EventDispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel::<()>();

        let handler = {
            let calls = calls.clone();
            move |_: Arc<dyn Event>| {
                calls.fetch_add(1, Ordering::SeqCst);
                tx.send(()).unwrap();
                Ok(())
            }
        };
        dispatcher.register("x", handler.clone());
        dispatcher.register("x", handler);

        dispatcher.dispatch("x", ping(1));
        rx.recv_timeout(WAIT).unwrap();
        rx.recv_timeout(WAIT).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
