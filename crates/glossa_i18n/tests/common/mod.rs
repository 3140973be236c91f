#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glossa_i18n::{Dictionary, DictionaryFetcher, FetchError, FetchFuture, LanguageCode};
use parking_lot::Mutex;
use tokio::sync::oneshot;

pub fn dict(entries: &[(&str, &str)]) -> Dictionary {
    entries.iter().copied().collect()
}

/// In-memory catalogs; the dictionary is read when `fetch` is called
#[derive(Clone, Default)]
pub struct MapFetcher {
    catalogs: Arc<Mutex<HashMap<String, Dictionary>>>,
    calls: Arc<AtomicUsize>,
}

impl MapFetcher {
    /// `en: hello`, `it: ciao`
    pub fn en_it() -> Self {
        let fetcher = Self::default();
        fetcher.set("en", dict(&[("hello", "hello")]));
        fetcher.set("it", dict(&[("hello", "ciao")]));
        fetcher
    }

    pub fn set(&self, lang: &str, dictionary: Dictionary) {
        self.catalogs.lock().insert(lang.to_string(), dictionary);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DictionaryFetcher for MapFetcher {
    fn fetch(&self, lang: &LanguageCode) -> FetchFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.catalogs.lock().get(lang.as_str()).cloned();
        let lang = lang.clone();
        Box::pin(async move { snapshot.ok_or(FetchError::NotFound(lang)) })
    }
}

type Reply = oneshot::Sender<Result<Dictionary, FetchError>>;

/// Fetcher whose requests stay pending until the test resolves them
#[derive(Clone, Default)]
pub struct GatedFetcher {
    pending: Arc<Mutex<Vec<(LanguageCode, Option<Reply>)>>>,
}

impl GatedFetcher {
    pub fn requested(&self) -> Vec<String> {
        self.pending
            .lock()
            .iter()
            .map(|(lang, _)| lang.to_string())
            .collect()
    }

    /// Complete the `index`-th fetch (in call order)
    pub fn resolve(&self, index: usize, result: Result<Dictionary, FetchError>) {
        let reply = self.pending.lock()[index]
            .1
            .take()
            .expect("fetch already resolved");
        let _ = reply.send(result);
    }
}

impl DictionaryFetcher for GatedFetcher {
    fn fetch(&self, lang: &LanguageCode) -> FetchFuture {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().push((lang.clone(), Some(tx)));
        let lang = lang.clone();
        Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err(FetchError::other(format!("fetch for {lang} abandoned"))))
        })
    }
}

/// Yield to spawned tasks until `done` holds
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
