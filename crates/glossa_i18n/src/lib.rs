//! Glossa translation layer
//!
//! Goals:
//! - Switch the active language at runtime without blocking the caller
//! - Fetch dictionaries asynchronously through a caller-supplied fetcher
//! - Cache dictionaries per language, optionally refreshing them in the
//!   background (stale-while-revalidate)
//! - Only the most recent switch request may change the visible language
//! - Hand `current_lang`, `loading_lang`, the dictionary and a `switch_lang`
//!   handle to presentation components through [`with_translations`]
//!
//! ```ignore
//! let middleware = create_translations_middleware(|lang: LanguageCode| async move {
//!     load_dictionary(&lang).await
//! });
//! let store = create_translation_store(middleware.clone());
//!
//! store.dispatch(TranslationAction::switch_lang("en"));
//! middleware.settle().await;
//! assert_eq!(store.select(|s| s.translate("hello")), "hello");
//! ```

mod dictionary;
mod error;
mod fetch;
mod language;
mod message;
mod middleware;
mod options;
mod state;
mod translated;

pub use dictionary::{CatalogFormat, Dictionary};
pub use error::{DictionaryParseError, FetchError};
pub use fetch::{CatalogDirFetcher, CatalogFile, DictionaryFetcher, FetchFuture};
pub use language::{locale_fallback_chain, normalize_locale, LanguageCode};
pub use message::{ArgValue, Message};
pub use middleware::{
    create_translation_store, create_translations_middleware,
    create_translations_middleware_with, TranslationStore, TranslationsMiddleware,
};
pub use options::{ErrorCallback, SwitchCallback, TranslationsConfig, TranslationsOptions};
pub use state::{
    reduce_translations, CacheEntry, DictionaryCache, HasTranslations, RequestToken,
    TranslationAction, TranslationActionLike, TranslationFailure, TranslationState,
};
pub use translated::{
    with_translations, Connected, Mounted, SwitchLang, Translated, TranslatedProps,
    TranslationView,
};

/// Convenience macro for building a translation key + args as a [`Message`].
///
/// Examples:
/// - `t!("app.title")`
/// - `t!("greeting", { name: user_name, count: 3 })`
#[macro_export]
macro_rules! t {
    ($id:literal) => {
        $crate::Message::new($id)
    };
    ($id:literal, { $($name:ident : $value:expr),* $(,)? }) => {{
        let mut m = $crate::Message::new($id);
        $(
            m = m.arg(stringify!($name), $value);
        )*
        m
    }};
}
