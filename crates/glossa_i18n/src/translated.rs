//! Translated-component wrapper
//!
//! [`with_translations`] wraps a component whose props are
//! [`TranslatedProps<P>`] so that callers only supply `P`. The wrapper reads
//! the translation slice of the store, adds a [`SwitchLang`] handle, and
//! forwards `P` untouched.
//!
//! ```ignore
//! let greeting = with_translations(component_fn(|p: &TranslatedProps<Name>| {
//!     format!("{} {}", p.t("hello"), p.props.0)
//! }));
//!
//! let connected = greeting.connect(&store);
//! let html = connected.render(&Name("Ada".into()));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glossa_core::{Component, Reduce, Store, Subscription};
use parking_lot::Mutex;
use tracing::trace;

use crate::dictionary::Dictionary;
use crate::language::LanguageCode;
use crate::message::Message;
use crate::state::{HasTranslations, TranslationAction, TranslationActionLike, TranslationFailure, TranslationState};

/// The slice of translation state a component sees
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslationView {
    pub current_lang: Option<LanguageCode>,
    pub loading_lang: Option<LanguageCode>,
    pub dictionary: Arc<Dictionary>,
    pub last_error: Option<TranslationFailure>,
}

impl TranslationView {
    pub fn from_state(state: &TranslationState) -> Self {
        Self {
            current_lang: state.current_lang().cloned(),
            loading_lang: state.loading_lang().cloned(),
            dictionary: Arc::clone(state.dictionary()),
            last_error: state.last_error().cloned(),
        }
    }

    /// Cheap change check: dictionaries compare by pointer first
    fn same_as(&self, other: &TranslationView) -> bool {
        self.current_lang == other.current_lang
            && self.loading_lang == other.loading_lang
            && self.last_error == other.last_error
            && (Arc::ptr_eq(&self.dictionary, &other.dictionary) || self.dictionary == other.dictionary)
    }
}

/// Dispatches a language switch into the store it was created from
#[derive(Clone)]
pub struct SwitchLang {
    dispatch: Arc<dyn Fn(LanguageCode) + Send + Sync>,
}

impl SwitchLang {
    pub fn new<F>(dispatch: F) -> Self
    where
        F: Fn(LanguageCode) + Send + Sync + 'static,
    {
        Self {
            dispatch: Arc::new(dispatch),
        }
    }

    pub fn for_store<S, A>(store: &Store<S, A>) -> Self
    where
        S: Reduce<A> + Send + Sync + 'static,
        A: TranslationActionLike,
    {
        let store = store.clone();
        Self::new(move |lang| store.dispatch(A::from(TranslationAction::SwitchLang(lang))))
    }

    pub fn call(&self, lang: impl Into<LanguageCode>) {
        (self.dispatch)(lang.into());
    }
}

impl fmt::Debug for SwitchLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SwitchLang")
    }
}

/// Props handed to a wrapped component
#[derive(Clone, Debug)]
pub struct TranslatedProps<P> {
    pub current_lang: Option<LanguageCode>,
    pub loading_lang: Option<LanguageCode>,
    pub dictionary: Arc<Dictionary>,
    pub switch_lang: SwitchLang,
    /// Failure of the most recent switch, cleared by the next success
    pub last_error: Option<TranslationFailure>,
    /// Caller-supplied props, forwarded untouched
    pub props: P,
}

impl<P> TranslatedProps<P> {
    /// Translate with the current dictionary, falling back to the key id
    pub fn t(&self, msg: impl Into<Message>) -> String {
        self.dictionary.translate(msg)
    }

    pub fn current_lang_str(&self) -> &str {
        self.current_lang.as_ref().map_or("", LanguageCode::as_str)
    }

    pub fn loading_lang_str(&self) -> &str {
        self.loading_lang.as_ref().map_or("", LanguageCode::as_str)
    }
}

/// A component wrapped by [`with_translations`]
#[derive(Debug)]
pub struct Translated<C> {
    inner: C,
}

/// Wrap a component that takes [`TranslatedProps`]
pub fn with_translations<C>(component: C) -> Translated<C> {
    Translated { inner: component }
}

impl<C> Translated<C> {
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Bind to a store, producing a component whose props are the caller's
    pub fn connect<S, A>(self, store: &Store<S, A>) -> Connected<C, S, A>
    where
        S: HasTranslations + Reduce<A> + Send + Sync + 'static,
        A: TranslationActionLike,
    {
        Connected {
            inner: self.inner,
            switch_lang: SwitchLang::for_store(store),
            store: store.clone(),
        }
    }
}

/// A translated component bound to a store
pub struct Connected<C, S, A> {
    inner: C,
    store: Store<S, A>,
    switch_lang: SwitchLang,
}

impl<C, S, A> Connected<C, S, A>
where
    S: HasTranslations + Reduce<A> + Send + Sync + 'static,
    A: TranslationActionLike,
{
    /// Current translation view of the bound store
    pub fn view(&self) -> TranslationView {
        self.store
            .select(|state| TranslationView::from_state(state.translations()))
    }

    pub fn props_for<P>(&self, view: TranslationView, props: P) -> TranslatedProps<P> {
        TranslatedProps {
            current_lang: view.current_lang,
            loading_lang: view.loading_lang,
            dictionary: view.dictionary,
            switch_lang: self.switch_lang.clone(),
            last_error: view.last_error,
            props,
        }
    }

    pub fn switch_lang(&self) -> &SwitchLang {
        &self.switch_lang
    }

    /// Render now and again whenever the translation view changes.
    ///
    /// `sink` receives every rendered output. Rendering stops when the
    /// returned [`Mounted`] is dropped.
    pub fn mount<P, F>(self, props: P, sink: F) -> Mounted
    where
        C: Component<Props = TranslatedProps<P>> + Send + Sync + 'static,
        P: Clone + Send + Sync + 'static,
        F: FnMut(C::Output) + Send + 'static,
    {
        let renders = Arc::new(AtomicUsize::new(0));
        let initial = self.view();
        let store = self.store.clone();

        let mounted = Arc::new(MountedComponent {
            connected: self,
            props,
            gate: Mutex::new(RenderGate {
                last_view: initial.clone(),
                rendering: false,
                pending: false,
            }),
            sink: Mutex::new(sink),
            renders: Arc::clone(&renders),
        });
        mounted.render_view(initial);

        let listener = Arc::clone(&mounted);
        let subscription = store.subscribe(move |_| listener.on_change());

        Mounted {
            subscription,
            renders,
        }
    }
}

impl<C, S, A, P> Component for Connected<C, S, A>
where
    C: Component<Props = TranslatedProps<P>>,
    S: HasTranslations + Reduce<A> + Send + Sync + 'static,
    A: TranslationActionLike,
    P: Clone,
{
    type Props = P;
    type Output = C::Output;

    fn render(&self, props: &P) -> C::Output {
        let props = self.props_for(self.view(), props.clone());
        self.inner.render(&props)
    }
}

impl<C, S, A> fmt::Debug for Connected<C, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connected").finish_non_exhaustive()
    }
}

/// Who is rendering, and whether a change arrived meanwhile
struct RenderGate {
    last_view: TranslationView,
    rendering: bool,
    pending: bool,
}

struct MountedComponent<C, S, A, P, F> {
    connected: Connected<C, S, A>,
    props: P,
    gate: Mutex<RenderGate>,
    sink: Mutex<F>,
    renders: Arc<AtomicUsize>,
}

impl<C, S, A, P, F> MountedComponent<C, S, A, P, F>
where
    C: Component<Props = TranslatedProps<P>>,
    S: HasTranslations + Reduce<A> + Send + Sync + 'static,
    A: TranslationActionLike,
    P: Clone,
    F: FnMut(C::Output),
{
    /// One caller renders at a time. Changes seen while a render is running
    /// (re-entrant dispatch from the component, or another thread) are
    /// picked up by that caller before it stops, so the last output sunk is
    /// always rendered from the latest view.
    fn on_change(&self) {
        {
            let mut gate = self.gate.lock();
            if gate.rendering {
                gate.pending = true;
                return;
            }
            gate.rendering = true;
        }

        loop {
            let view = self.connected.view();
            let changed = {
                let mut gate = self.gate.lock();
                if gate.last_view.same_as(&view) {
                    false
                } else {
                    gate.last_view = view.clone();
                    true
                }
            };
            if changed {
                trace!(current = ?view.current_lang, loading = ?view.loading_lang, "re-rendering translated component");
                self.render_view(view);
            }

            let mut gate = self.gate.lock();
            if !gate.pending {
                gate.rendering = false;
                return;
            }
            gate.pending = false;
        }
    }

    fn render_view(&self, view: TranslationView) {
        let props = self.connected.props_for(view, self.props.clone());
        let output = self.connected.inner.render(&props);
        self.renders.fetch_add(1, Ordering::SeqCst);
        (self.sink.lock())(output);
    }
}

/// A mounted translated component; unsubscribes on drop
#[derive(Debug)]
pub struct Mounted {
    subscription: Subscription,
    renders: Arc<AtomicUsize>,
}

impl Mounted {
    /// How many times the component has rendered, including the first render
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Stop re-rendering
    pub fn unmount(self) {
        self.subscription.unsubscribe();
    }
}
