use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glossa_core::{Middleware, Reduce, Store};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, Default, PartialEq)]
struct Log {
    entries: Vec<String>,
}

#[derive(Debug)]
enum LogAction {
    Push(String),
    Clear,
}

impl Reduce<LogAction> for Log {
    fn reduce(&mut self, action: &LogAction) -> bool {
        match action {
            LogAction::Push(entry) => {
                self.entries.push(entry.clone());
                true
            }
            LogAction::Clear if self.entries.is_empty() => false,
            LogAction::Clear => {
                self.entries.clear();
                true
            }
        }
    }
}

/// Records every action it sees, then tags pushes with its name
struct Tag {
    name: &'static str,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Middleware<Log, LogAction> for Tag {
    fn handle(&self, _store: &Store<Log, LogAction>, action: LogAction) -> Option<LogAction> {
        self.seen.lock().push(self.name.to_string());
        match action {
            LogAction::Push(entry) => Some(LogAction::Push(format!("{entry}+{}", self.name))),
            other => Some(other),
        }
    }
}

#[test]
fn middleware_runs_in_registration_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let store = Store::builder(Log::default())
        .middleware(Tag {
            name: "a",
            seen: Arc::clone(&seen),
        })
        .middleware(Tag {
            name: "b",
            seen: Arc::clone(&seen),
        })
        .build();

    store.dispatch(LogAction::Push("x".into()));

    assert_eq!(*seen.lock(), vec!["a", "b"]);
    assert_eq!(store.snapshot().entries, vec!["x+a+b"]);
}

#[test]
fn unchanged_state_neither_notifies_nor_bumps_revision() {
    let store = Store::new(Log::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let _sub = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.dispatch(LogAction::Clear);
    assert_eq!(store.revision(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    store.dispatch(LogAction::Push("x".into()));
    store.dispatch(LogAction::Clear);
    assert_eq!(store.revision(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn dispatch_from_many_threads() {
    let store = Store::new(Log::default());
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let _sub = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    std::thread::scope(|scope| {
        for t in 0..4 {
            let store = store.clone();
            scope.spawn(move || {
                for i in 0..25 {
                    store.dispatch(LogAction::Push(format!("{t}-{i}")));
                }
            });
        }
    });

    assert_eq!(store.select(|log| log.entries.len()), 100);
    assert_eq!(store.revision(), 100);
    assert_eq!(notified.load(Ordering::SeqCst), 100);
}
