//! Replay a sequence of language switches against a catalog directory

use anyhow::Result;
use glossa_core::{component_fn, Component};
use glossa_i18n::{
    create_translation_store, create_translations_middleware_with, with_translations,
    CatalogDirFetcher, DictionaryFetcher, FetchFuture, LanguageCode, TranslatedProps,
    TranslationAction,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::GlossaConfig;

/// Directory fetcher that counts how often it is asked for a dictionary
struct CountingFetcher {
    inner: CatalogDirFetcher,
    fetches: Arc<AtomicUsize>,
}

impl DictionaryFetcher for CountingFetcher {
    fn fetch(&self, lang: &LanguageCode) -> FetchFuture {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(lang)
    }
}

#[derive(Debug, Clone)]
pub struct ReplayPlan {
    pub langs: Vec<LanguageCode>,
    /// Key whose translation is printed after every step
    pub key: String,
    /// Wait for each switch to resolve before issuing the next one
    pub wait_each: bool,
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Run the plan and return one line per observed view
pub async fn replay(config: &GlossaConfig, plan: &ReplayPlan) -> Result<Vec<String>> {
    if plan.langs.is_empty() {
        anyhow::bail!("nothing to replay: pass at least one language or set translations.default_lang");
    }

    let fetches = Arc::new(AtomicUsize::new(0));
    let middleware = create_translations_middleware_with(
        CountingFetcher {
            inner: config.fetcher(),
            fetches: Arc::clone(&fetches),
        },
        config.options(),
    );
    let store = create_translation_store(Arc::clone(&middleware));

    let counter = Arc::clone(&fetches);
    let status = with_translations(component_fn(move |p: &TranslatedProps<String>| {
        let mut line = format!(
            "current={} loading={} {}={} fetches={}",
            or_dash(p.current_lang_str()),
            or_dash(p.loading_lang_str()),
            p.props,
            p.t(p.props.clone()),
            counter.load(Ordering::SeqCst)
        );
        if let Some(failure) = &p.last_error {
            line.push_str(&format!(" error=\"{}\"", failure.message));
        }
        line
    }))
    .connect(&store);

    let mut lines = Vec::new();
    let mut record = |phase: &str, lang: &LanguageCode| {
        lines.push(format!("{phase:<7} {lang:<6} {}", status.render(&plan.key)));
    };

    for lang in &plan.langs {
        store.dispatch(TranslationAction::switch_lang(lang.clone()));
        record("switch", lang);
        if plan.wait_each {
            middleware.settle().await;
            record("settled", lang);
        }
    }

    if !plan.wait_each {
        middleware.settle().await;
        if let Some(last) = plan.langs.last() {
            record("settled", last);
        }
    }

    Ok(lines)
}
