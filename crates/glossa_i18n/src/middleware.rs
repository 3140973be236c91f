//! Dictionary cache middleware
//!
//! Intercepts [`TranslationAction::SwitchLang`], decides between a cache hit,
//! a background refresh and a fetch, and turns the outcome into reducer
//! actions. Fetches run as tokio tasks; their resolutions are dispatched back
//! into the store and filtered by request token in the reducer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glossa_core::{Middleware, Reduce, Store};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fetch::DictionaryFetcher;
use crate::language::LanguageCode;
use crate::options::{ErrorCallback, TranslationsOptions};
use crate::state::{HasTranslations, RequestToken, TranslationAction, TranslationActionLike, TranslationState};

/// Store holding only translation state
pub type TranslationStore = Store<TranslationState, TranslationAction>;

struct PendingFetch {
    lang: LanguageCode,
    request: RequestToken,
    task: JoinHandle<()>,
}

/// What a switch request turns into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SwitchPlan {
    /// Cached and no refresh wanted
    Hit,
    /// Cached, show it and refetch in the background
    Refresh,
    /// Not cached (or caching disabled)
    Fetch,
}

/// Caches dictionaries per language and coordinates their fetches
pub struct TranslationsMiddleware {
    fetcher: Box<dyn DictionaryFetcher>,
    options: TranslationsOptions,
    next_request: AtomicU64,
    pending: Mutex<Vec<PendingFetch>>,
}

/// Create the middleware with default options
pub fn create_translations_middleware<F>(fetcher: F) -> Arc<TranslationsMiddleware>
where
    F: DictionaryFetcher,
{
    create_translations_middleware_with(fetcher, TranslationsOptions::default())
}

/// Create the middleware with explicit options
pub fn create_translations_middleware_with<F>(
    fetcher: F,
    options: TranslationsOptions,
) -> Arc<TranslationsMiddleware>
where
    F: DictionaryFetcher,
{
    Arc::new(TranslationsMiddleware::new(fetcher, options))
}

/// Build a translation-only store with the middleware installed
pub fn create_translation_store(middleware: Arc<TranslationsMiddleware>) -> TranslationStore {
    Store::builder(TranslationState::default())
        .middleware(middleware)
        .build()
}

impl TranslationsMiddleware {
    pub fn new<F: DictionaryFetcher>(fetcher: F, options: TranslationsOptions) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            options,
            next_request: AtomicU64::new(0),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &TranslationsOptions {
        &self.options
    }

    /// Number of spawned fetches that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.pending
            .lock()
            .iter()
            .filter(|fetch| !fetch.task.is_finished())
            .count()
    }

    /// Wait for every fetch spawned so far, including fetches spawned while
    /// waiting.
    pub async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.pending.lock());
            if batch.is_empty() {
                return;
            }
            for fetch in batch {
                if let Err(err) = fetch.task.await {
                    warn!(
                        lang = %fetch.lang,
                        request = fetch.request.to_raw(),
                        error = %err,
                        "translation fetch task did not complete"
                    );
                }
            }
        }
    }

    fn next_request(&self) -> RequestToken {
        RequestToken::from_raw(self.next_request.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn plan<S: HasTranslations>(&self, state: &S, lang: &LanguageCode) -> SwitchPlan {
        let config = &self.options.config;
        if !config.cache || !state.translations().is_cached(lang.as_str()) {
            SwitchPlan::Fetch
        } else if config.update_cache_on_switch {
            SwitchPlan::Refresh
        } else {
            SwitchPlan::Hit
        }
    }

    fn switch<S, A>(&self, store: &Store<S, A>, lang: LanguageCode)
    where
        S: HasTranslations + Reduce<A> + Send + Sync + 'static,
        A: TranslationActionLike,
    {
        if let Some(callback) = &self.options.switch_callback {
            callback(&lang);
        }

        let request = self.next_request();
        let plan = store.select(|state| self.plan(state, &lang));
        debug!(lang = %lang, request = request.to_raw(), ?plan, "switching language");

        if plan == SwitchPlan::Hit {
            store.dispatch(A::from(TranslationAction::Switched { lang, request }));
            return;
        }

        store.dispatch(A::from(TranslationAction::LoadStarted {
            lang: lang.clone(),
            request,
            refresh: plan == SwitchPlan::Refresh,
        }));
        self.spawn_fetch(store, lang, request);
    }

    fn spawn_fetch<S, A>(&self, store: &Store<S, A>, lang: LanguageCode, request: RequestToken)
    where
        S: HasTranslations + Reduce<A> + Send + Sync + 'static,
        A: TranslationActionLike,
    {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                let error = FetchError::NoRuntime(lang.clone());
                dispatch_failure(store, self.options.error_callback.as_ref(), lang, request, error);
                return;
            }
        };

        let fetch = self.fetcher.fetch(&lang);
        let store = store.clone();
        let cache = self.options.config.cache;
        let on_error = self.options.error_callback.clone();
        let task_lang = lang.clone();

        let task = runtime.spawn(async move {
            let lang = task_lang;
            // The fetch runs as its own task so a panicking fetcher surfaces
            // as a JoinError instead of taking this task down.
            let outcome = match tokio::spawn(fetch).await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Panicked(lang.clone())),
            };

            match outcome {
                Ok(dictionary) => {
                    debug!(lang = %lang, request = request.to_raw(), entries = dictionary.len(), "dictionary fetched");
                    store.dispatch(A::from(TranslationAction::LoadSucceeded {
                        lang,
                        request,
                        dictionary: Arc::new(dictionary),
                        cache,
                    }));
                }
                Err(error) => dispatch_failure(&store, on_error.as_ref(), lang, request, error),
            }
        });

        let mut pending = self.pending.lock();
        pending.retain(|fetch| !fetch.task.is_finished());
        pending.push(PendingFetch {
            lang,
            request,
            task,
        });
    }
}

/// Dispatch a fetch failure. The error callback only hears about failures
/// the reducer accepted, i.e. those of the active request.
fn dispatch_failure<S, A>(
    store: &Store<S, A>,
    on_error: Option<&ErrorCallback>,
    lang: LanguageCode,
    request: RequestToken,
    error: FetchError,
) where
    S: HasTranslations + Reduce<A> + Send + Sync + 'static,
    A: TranslationActionLike,
{
    let error = Arc::new(error);
    store.dispatch(A::from(TranslationAction::LoadFailed {
        lang: lang.clone(),
        request,
        error: Arc::clone(&error),
    }));

    let accepted = store.select(|state| {
        state
            .translations()
            .last_error()
            .is_some_and(|failure| failure.request == request)
    });
    if !accepted {
        debug!(lang = %lang, request = request.to_raw(), error = %error, "superseded fetch failed");
        return;
    }

    warn!(lang = %lang, error = %error, "dictionary fetch failed");
    if let Some(callback) = on_error {
        callback(&lang, error.as_ref());
    }
}

impl<S, A> Middleware<S, A> for TranslationsMiddleware
where
    S: HasTranslations + Reduce<A> + Send + Sync + 'static,
    A: TranslationActionLike,
{
    fn handle(&self, store: &Store<S, A>, action: A) -> Option<A> {
        let lang = match action.as_translation() {
            Some(TranslationAction::SwitchLang(lang)) => lang.clone(),
            _ => return Some(action),
        };
        self.switch(store, lang);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;

    fn en() -> Dictionary {
        [("hello", "hello")].into_iter().collect()
    }

    #[test]
    fn tokens_increase_per_switch() {
        let middleware = TranslationsMiddleware::new(
            |_lang: LanguageCode| async { Ok::<Dictionary, FetchError>(Dictionary::new()) },
            TranslationsOptions::default(),
        );
        let a = middleware.next_request();
        let b = middleware.next_request();
        assert!(a < b);
        assert!(RequestToken::NONE < a);
    }

    #[test]
    fn without_runtime_the_switch_fails_cleanly() {
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&errors);
        let middleware = create_translations_middleware_with(
            |_lang: LanguageCode| async { Ok::<Dictionary, FetchError>(en()) },
            TranslationsOptions::new().error_callback(move |_, err| {
                assert!(matches!(err, FetchError::NoRuntime(_)));
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let store = create_translation_store(middleware);

        store.dispatch(TranslationAction::switch_lang("en"));

        assert_eq!(errors.load(Ordering::SeqCst), 1);
        store.select(|state| {
            assert_eq!(state.loading_lang(), None);
            assert_eq!(state.current_lang(), None);
            assert!(state.last_error().is_some());
        });
    }

    #[tokio::test]
    async fn non_switch_actions_pass_through() {
        let middleware = create_translations_middleware(|_lang: LanguageCode| async {
            Ok::<Dictionary, FetchError>(en())
        });
        let store = create_translation_store(middleware.clone());

        store.dispatch(TranslationAction::LoadStarted {
            lang: "en".into(),
            request: RequestToken::from_raw(99),
            refresh: false,
        });

        assert_eq!(middleware.in_flight(), 0);
        assert_eq!(store.select(|s| s.loading_lang().cloned()), Some("en".into()));
    }
}
