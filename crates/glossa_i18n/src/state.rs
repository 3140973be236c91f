//! Translation state and its reducer
//!
//! Every switch request carries a [`RequestToken`]. The reducer remembers the
//! most recent one as `active_request`; only a resolution carrying that token
//! may change `current_lang` or clear `loading_lang`. Cache entries remember
//! the token that produced them so an older fetch never replaces a newer
//! dictionary.

use std::sync::Arc;

use glossa_core::Reduce;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::dictionary::Dictionary;
use crate::error::FetchError;
use crate::language::LanguageCode;
use crate::message::Message;

/// Monotonic id of a switch request. `RequestToken::NONE` precedes all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub const NONE: RequestToken = RequestToken(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

/// A cached dictionary and the request that produced it
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub dictionary: Arc<Dictionary>,
    pub request: RequestToken,
}

/// Dictionaries keyed by language. Never evicted within a session.
#[derive(Clone, Debug, Default)]
pub struct DictionaryCache {
    entries: FxHashMap<LanguageCode, CacheEntry>,
}

impl DictionaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, lang: &str) -> Option<&CacheEntry> {
        self.entries.get(lang)
    }

    pub fn dictionary(&self, lang: &str) -> Option<&Arc<Dictionary>> {
        self.entries.get(lang).map(|entry| &entry.dictionary)
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.entries.contains_key(lang)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageCode> {
        self.entries.keys()
    }

    /// Store a dictionary unless a newer request already wrote this language.
    ///
    /// Returns whether the entry was written.
    pub fn store(&mut self, lang: &LanguageCode, dictionary: Arc<Dictionary>, request: RequestToken) -> bool {
        if let Some(existing) = self.entries.get(lang.as_str()) {
            if existing.request > request {
                return false;
            }
        }
        self.entries
            .insert(lang.clone(), CacheEntry { dictionary, request });
        true
    }
}

/// The most recent fetch failure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationFailure {
    pub lang: LanguageCode,
    pub request: RequestToken,
    pub message: String,
}

/// Actions understood by the translation reducer.
///
/// `SwitchLang` is the inbound request; the middleware consumes it and emits
/// the others. Without the middleware installed, `SwitchLang` is a no-op.
#[derive(Debug)]
pub enum TranslationAction {
    /// Request a language switch
    SwitchLang(LanguageCode),
    /// Cache hit: show the cached dictionary now, no fetch
    Switched {
        lang: LanguageCode,
        request: RequestToken,
    },
    /// A fetch was started. With `refresh`, the cached dictionary is shown
    /// while it is revalidated.
    LoadStarted {
        lang: LanguageCode,
        request: RequestToken,
        refresh: bool,
    },
    LoadSucceeded {
        lang: LanguageCode,
        request: RequestToken,
        dictionary: Arc<Dictionary>,
        cache: bool,
    },
    LoadFailed {
        lang: LanguageCode,
        request: RequestToken,
        error: Arc<FetchError>,
    },
}

impl TranslationAction {
    pub fn switch_lang(lang: impl Into<LanguageCode>) -> Self {
        Self::SwitchLang(lang.into())
    }
}

/// Action types that can carry translation actions.
///
/// Hosts with their own action enum wrap [`TranslationAction`] in a variant
/// and implement this to route it.
pub trait TranslationActionLike: From<TranslationAction> + Send + 'static {
    fn as_translation(&self) -> Option<&TranslationAction>;
}

impl TranslationActionLike for TranslationAction {
    fn as_translation(&self) -> Option<&TranslationAction> {
        Some(self)
    }
}

/// State types that embed a [`TranslationState`]
pub trait HasTranslations {
    fn translations(&self) -> &TranslationState;
    fn translations_mut(&mut self) -> &mut TranslationState;
}

impl HasTranslations for TranslationState {
    fn translations(&self) -> &TranslationState {
        self
    }

    fn translations_mut(&mut self) -> &mut TranslationState {
        self
    }
}

/// Apply the translation part of a host action to a host state.
pub fn reduce_translations<S, A>(state: &mut S, action: &A) -> bool
where
    S: HasTranslations,
    A: TranslationActionLike,
{
    action
        .as_translation()
        .is_some_and(|action| state.translations_mut().apply(action))
}

/// Current/loading language, the dictionary cache, and the visible dictionary.
#[derive(Clone, Debug, Default)]
pub struct TranslationState {
    current_lang: Option<LanguageCode>,
    loading_lang: Option<LanguageCode>,
    dictionaries: DictionaryCache,
    dictionary: Arc<Dictionary>,
    active_request: RequestToken,
    last_error: Option<TranslationFailure>,
}

impl TranslationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_lang(&self) -> Option<&LanguageCode> {
        self.current_lang.as_ref()
    }

    pub fn loading_lang(&self) -> Option<&LanguageCode> {
        self.loading_lang.as_ref()
    }

    /// Dictionary for `current_lang`, empty before the first switch completes
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn dictionaries(&self) -> &DictionaryCache {
        &self.dictionaries
    }

    pub fn active_request(&self) -> RequestToken {
        self.active_request
    }

    pub fn last_error(&self) -> Option<&TranslationFailure> {
        self.last_error.as_ref()
    }

    pub fn is_cached(&self, lang: &str) -> bool {
        self.dictionaries.contains(lang)
    }

    pub fn is_loading(&self) -> bool {
        self.loading_lang.is_some()
    }

    /// Translate with the visible dictionary, falling back to the key id
    pub fn translate(&self, msg: impl Into<Message>) -> String {
        self.dictionary.translate(msg)
    }

    fn is_active(&self, request: RequestToken) -> bool {
        request == self.active_request
    }

    fn clear_loading_if(&mut self, lang: &LanguageCode) {
        if self.loading_lang.as_ref() == Some(lang) {
            self.loading_lang = None;
        }
    }

    /// Apply one action. Returns whether anything changed.
    pub fn apply(&mut self, action: &TranslationAction) -> bool {
        match action {
            TranslationAction::SwitchLang(_) => false,

            TranslationAction::Switched { lang, request } => {
                self.active_request = *request;
                self.loading_lang = None;
                self.dictionary = self
                    .dictionaries
                    .dictionary(lang.as_str())
                    .cloned()
                    .unwrap_or_default();
                self.current_lang = Some(lang.clone());
                self.last_error = None;
                true
            }

            TranslationAction::LoadStarted {
                lang,
                request,
                refresh,
            } => {
                self.active_request = *request;
                self.loading_lang = Some(lang.clone());
                if *refresh {
                    if let Some(cached) = self.dictionaries.dictionary(lang.as_str()) {
                        self.dictionary = Arc::clone(cached);
                        self.current_lang = Some(lang.clone());
                    }
                }
                true
            }

            TranslationAction::LoadSucceeded {
                lang,
                request,
                dictionary,
                cache,
            } => {
                let mut changed = false;

                if *cache && self.dictionaries.store(lang, Arc::clone(dictionary), *request) {
                    changed = true;
                    if self.current_lang.as_ref() == Some(lang) {
                        self.dictionary = Arc::clone(dictionary);
                    }
                }

                if self.is_active(*request) {
                    self.current_lang = Some(lang.clone());
                    self.dictionary = Arc::clone(dictionary);
                    self.clear_loading_if(lang);
                    self.last_error = None;
                    changed = true;
                } else {
                    debug!(
                        lang = %lang,
                        request = request.to_raw(),
                        active = self.active_request.to_raw(),
                        "discarding superseded dictionary resolution"
                    );
                }

                changed
            }

            TranslationAction::LoadFailed {
                lang,
                request,
                error,
            } => {
                if !self.is_active(*request) {
                    debug!(lang = %lang, "ignoring failure of superseded request");
                    return false;
                }
                self.clear_loading_if(lang);
                self.last_error = Some(TranslationFailure {
                    lang: lang.clone(),
                    request: *request,
                    message: error.to_string(),
                });
                true
            }
        }
    }
}

impl Reduce<TranslationAction> for TranslationState {
    fn reduce(&mut self, action: &TranslationAction) -> bool {
        self.apply(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dict(hello: &str) -> Arc<Dictionary> {
        Arc::new([("hello", hello)].into_iter().collect())
    }

    fn token(n: u64) -> RequestToken {
        RequestToken::from_raw(n)
    }

    fn loaded(lang: &str, n: u64, hello: &str, cache: bool) -> TranslationAction {
        TranslationAction::LoadSucceeded {
            lang: lang.into(),
            request: token(n),
            dictionary: dict(hello),
            cache,
        }
    }

    fn started(lang: &str, n: u64, refresh: bool) -> TranslationAction {
        TranslationAction::LoadStarted {
            lang: lang.into(),
            request: token(n),
            refresh,
        }
    }

    #[test]
    fn load_then_resolve() {
        let mut state = TranslationState::new();
        assert!(state.apply(&started("en", 1, false)));
        assert_eq!(state.loading_lang(), Some(&"en".into()));
        assert_eq!(state.current_lang(), None);

        assert!(state.apply(&loaded("en", 1, "hello", true)));
        assert_eq!(state.current_lang(), Some(&"en".into()));
        assert_eq!(state.loading_lang(), None);
        assert_eq!(state.translate("hello"), "hello");
        assert!(state.is_cached("en"));
    }

    #[test]
    fn superseded_resolution_only_writes_cache() {
        let mut state = TranslationState::new();
        state.apply(&started("it", 1, false));
        state.apply(&started("en", 2, false));

        state.apply(&loaded("it", 1, "ciao", true));
        assert_eq!(state.current_lang(), None);
        assert_eq!(state.loading_lang(), Some(&"en".into()));
        assert!(state.is_cached("it"));

        state.apply(&loaded("en", 2, "hello", true));
        assert_eq!(state.current_lang(), Some(&"en".into()));
        assert_eq!(state.loading_lang(), None);
    }

    #[test]
    fn older_write_never_replaces_newer_entry() {
        let mut cache = DictionaryCache::new();
        let en = LanguageCode::from("en");
        assert!(cache.store(&en, dict("new"), token(5)));
        assert!(!cache.store(&en, dict("old"), token(3)));
        assert_eq!(cache.dictionary("en").unwrap().get("hello"), Some("new"));
    }

    #[test]
    fn refresh_shows_stale_then_fresh() {
        let mut state = TranslationState::new();
        state.apply(&started("en", 1, false));
        state.apply(&loaded("en", 1, "hello", true));

        state.apply(&started("en", 2, true));
        assert_eq!(state.current_lang(), Some(&"en".into()));
        assert_eq!(state.loading_lang(), Some(&"en".into()));
        assert_eq!(state.translate("hello"), "hello");

        state.apply(&loaded("en", 2, "hi!", true));
        assert_eq!(state.translate("hello"), "hi!");
        assert_eq!(state.loading_lang(), None);
    }

    #[test]
    fn uncached_resolution_is_shown_but_not_stored() {
        let mut state = TranslationState::new();
        state.apply(&started("en", 1, false));
        state.apply(&loaded("en", 1, "hello", false));
        assert_eq!(state.translate("hello"), "hello");
        assert!(state.dictionaries().is_empty());
    }

    #[test]
    fn failure_clears_loading_and_keeps_current() {
        let mut state = TranslationState::new();
        state.apply(&started("en", 1, false));
        state.apply(&loaded("en", 1, "hello", true));
        state.apply(&started("xx", 2, false));

        assert!(state.apply(&TranslationAction::LoadFailed {
            lang: "xx".into(),
            request: token(2),
            error: Arc::new(FetchError::NotFound("xx".into())),
        }));
        assert_eq!(state.loading_lang(), None);
        assert_eq!(state.current_lang(), Some(&"en".into()));
        assert_eq!(state.translate("hello"), "hello");

        let failure = state.last_error().unwrap();
        assert_eq!(failure.lang, "xx");
        assert_eq!(failure.message, "no dictionary for language `xx`");
    }

    #[test]
    fn stale_failure_is_ignored() {
        let mut state = TranslationState::new();
        state.apply(&started("xx", 1, false));
        state.apply(&started("en", 2, false));

        assert!(!state.apply(&TranslationAction::LoadFailed {
            lang: "xx".into(),
            request: token(1),
            error: Arc::new(FetchError::other("boom")),
        }));
        assert_eq!(state.loading_lang(), Some(&"en".into()));
        assert!(state.last_error().is_none());
    }

    #[test]
    fn switch_lang_without_middleware_is_noop() {
        let mut state = TranslationState::new();
        assert!(!state.apply(&TranslationAction::switch_lang("en")));
    }
}
